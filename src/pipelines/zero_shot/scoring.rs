//! Logit triples to per-label scores.
//!
//! Single-label scores are a softmax of the entailment logits across all
//! candidate labels, so they sum to one. Multi-label scores are computed per
//! label and stand alone in `[0, 1]`.

use super::inference::LogitTriple;
use crate::core::{MultiLabelScoring, Result, ZeroShotError};
use serde::{Deserialize, Serialize};

/// Whether candidate labels are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMode {
    /// Exactly one label applies; scores sum to 1.
    #[default]
    SingleLabel,
    /// Each label applies independently.
    MultiLabel,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreAggregator {
    multi_label_scoring: MultiLabelScoring,
}

impl ScoreAggregator {
    pub fn new(multi_label_scoring: MultiLabelScoring) -> Self {
        Self {
            multi_label_scoring,
        }
    }

    /// One score per triple, positionally aligned with the input.
    pub fn aggregate(&self, triples: &[LogitTriple], mode: ClassificationMode) -> Result<Vec<f32>> {
        if triples.is_empty() {
            return Err(ZeroShotError::numeric(None, "no logits to aggregate"));
        }

        match mode {
            ClassificationMode::SingleLabel => {
                let entailment = triples
                    .iter()
                    .enumerate()
                    .map(|(i, t)| finite(t.entailment, i, "entailment"))
                    .collect::<Result<Vec<_>>>()?;
                let probs = stable_softmax(&entailment)
                    .map_err(|message| ZeroShotError::numeric(None, message))?;
                Ok(probs.into_iter().map(|p| p as f32).collect())
            }
            ClassificationMode::MultiLabel => triples
                .iter()
                .enumerate()
                .map(|(i, t)| self.independent_score(t, i))
                .collect(),
        }
    }

    fn independent_score(&self, triple: &LogitTriple, index: usize) -> Result<f32> {
        let entailment = finite(triple.entailment, index, "entailment")?;
        let contradiction = finite(triple.contradiction, index, "contradiction")?;

        let logits = match self.multi_label_scoring {
            MultiLabelScoring::EntailmentVsContradiction => vec![entailment, contradiction],
            MultiLabelScoring::EntailmentVsAll => {
                // -inf marks a head without a neutral class.
                if triple.neutral.is_nan() || triple.neutral == f32::INFINITY {
                    return Err(ZeroShotError::numeric(
                        Some(index),
                        format!("neutral logit is {}", triple.neutral),
                    ));
                }
                vec![entailment, contradiction, f64::from(triple.neutral)]
            }
        };

        let probs =
            stable_softmax(&logits).map_err(|message| ZeroShotError::numeric(Some(index), message))?;
        Ok(probs[0] as f32)
    }
}

fn finite(value: f32, index: usize, name: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(f64::from(value))
    } else {
        Err(ZeroShotError::numeric(
            Some(index),
            format!("{name} logit is {value}"),
        ))
    }
}

/// Softmax with the maximum subtracted first. Fails instead of returning a
/// non-finite distribution.
fn stable_softmax(logits: &[f64]) -> std::result::Result<Vec<f64>, String> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(format!("softmax over non-finite maximum {max}"));
    }

    let exps: Vec<f64> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        return Err(format!("softmax normalizer is {sum}"));
    }

    let probs: Vec<f64> = exps.into_iter().map(|e| e / sum).collect();
    if let Some(bad) = probs.iter().find(|p| !p.is_finite()) {
        return Err(format!("softmax produced {bad}"));
    }
    Ok(probs)
}
