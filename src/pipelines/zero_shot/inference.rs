use super::encoder::EncodedBatch;
use super::model::{LabelLayout, NliModel};
use crate::core::{Result, ZeroShotError};

/// NLI logits for one pair, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogitTriple {
    pub contradiction: f32,
    pub neutral: f32,
    pub entailment: f32,
}

impl LogitTriple {
    pub fn new(contradiction: f32, neutral: f32, entailment: f32) -> Self {
        Self {
            contradiction,
            neutral,
            entailment,
        }
    }

    /// Picks the three classes out of a native logit row. A missing neutral
    /// class becomes `-inf`, i.e. zero probability mass.
    pub fn from_row(row: &[f32], layout: &LabelLayout) -> Option<Self> {
        let neutral = match layout.neutral {
            Some(i) => *row.get(i)?,
            None => f32::NEG_INFINITY,
        };
        Some(Self {
            contradiction: *row.get(layout.contradiction)?,
            neutral,
            entailment: *row.get(layout.entailment)?,
        })
    }
}

/// Runs the model on a batch and normalizes its rows to [`LogitTriple`]s.
pub struct InferenceAdapter<'a, M: NliModel + ?Sized> {
    model: &'a M,
}

impl<'a, M: NliModel + ?Sized> InferenceAdapter<'a, M> {
    pub fn new(model: &'a M) -> Self {
        Self { model }
    }

    /// Any model failure, or output that does not line up with the batch,
    /// surfaces as [`ZeroShotError::Inference`].
    pub fn infer(&self, batch: &EncodedBatch) -> Result<Vec<LogitTriple>> {
        let rows = self.model.forward(batch).map_err(|e| match e {
            ZeroShotError::Inference(message) => ZeroShotError::Inference(message),
            other => ZeroShotError::Inference(other.to_string()),
        })?;

        if rows.len() != batch.len() {
            return Err(ZeroShotError::Inference(format!(
                "model returned {} rows for a batch of {}",
                rows.len(),
                batch.len()
            )));
        }

        let layout = self.model.label_layout();
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let shape_error = || {
                    ZeroShotError::Inference(format!(
                        "row {i} has {} logits, the label layout has {}",
                        row.len(),
                        layout.num_labels
                    ))
                };
                if row.len() != layout.num_labels {
                    return Err(shape_error());
                }
                LogitTriple::from_row(row, layout).ok_or_else(shape_error)
            })
            .collect()
    }
}
