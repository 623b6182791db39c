use super::error::{Result, ZeroShotError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hypothesis template used when none is configured.
pub const DEFAULT_HYPOTHESIS_TEMPLATE: &str = "This example is {}.";

/// How multi-label scores treat the neutral logit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiLabelScoring {
    /// Binary softmax between entailment and contradiction; neutral is ignored.
    #[default]
    EntailmentVsContradiction,
    /// Softmax over all three logits, keeping the entailment share.
    EntailmentVsAll,
}

/// Knobs for a zero-shot classification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub hypothesis_template: String,
    pub multi_label_scoring: MultiLabelScoring,
    /// Longest accepted encoded pair. `None` defers to the model's limit.
    pub max_sequence_length: Option<usize>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            hypothesis_template: DEFAULT_HYPOTHESIS_TEMPLATE.to_string(),
            multi_label_scoring: MultiLabelScoring::default(),
            max_sequence_length: None,
        }
    }
}

impl ClassificationConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ZeroShotError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_template(&self.hypothesis_template)?;
        if self.max_sequence_length == Some(0) {
            return Err(ZeroShotError::Configuration(
                "max_sequence_length must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Checks that `template` has exactly one `{}` placeholder.
pub(crate) fn validate_template(template: &str) -> Result<()> {
    let placeholders = template.matches("{}").count();
    if placeholders != 1 {
        return Err(ZeroShotError::Configuration(format!(
            "Hypothesis template must contain exactly one `{{}}` placeholder, found {placeholders} in {template:?}"
        )));
    }
    Ok(())
}
