use crate::core::config::validate_template;
use crate::core::{Result, ZeroShotError, DEFAULT_HYPOTHESIS_TEMPLATE};

/// A candidate label paired with the premise and the hypothesis built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HypothesisPair {
    pub label: String,
    pub premise: String,
    pub hypothesis: String,
}

/// Turns candidate labels into NLI hypotheses, e.g. `"This example is {}."`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HypothesisBuilder {
    template: String,
}

impl Default for HypothesisBuilder {
    fn default() -> Self {
        Self {
            template: DEFAULT_HYPOTHESIS_TEMPLATE.to_string(),
        }
    }
}

impl HypothesisBuilder {
    /// `template` must contain exactly one `{}` placeholder.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        validate_template(&template)?;
        Ok(Self { template })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn build(&self, label: &str) -> Result<String> {
        if label.trim().is_empty() {
            return Err(ZeroShotError::invalid_label(
                None,
                "label is empty after trimming",
            ));
        }
        Ok(self.template.replacen("{}", label, 1))
    }

    /// One pair per label, in label order.
    pub fn build_pairs(&self, premise: &str, labels: &[String]) -> Result<Vec<HypothesisPair>> {
        labels
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let hypothesis = self.build(label).map_err(|e| match e {
                    ZeroShotError::InvalidLabel { reason, .. } => {
                        ZeroShotError::invalid_label(Some(index), reason)
                    }
                    other => other,
                })?;
                Ok(HypothesisPair {
                    label: label.clone(),
                    premise: premise.to_string(),
                    hypothesis,
                })
            })
            .collect()
    }
}
