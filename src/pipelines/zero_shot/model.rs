use super::encoder::EncodedBatch;
use crate::core::{Result, ZeroShotError};

/// Where each NLI class sits in a model's native logit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelLayout {
    pub entailment: usize,
    pub contradiction: usize,
    /// Two-way heads (`entailment` / `not_entailment`) have no neutral class.
    pub neutral: Option<usize>,
    pub num_labels: usize,
}

impl LabelLayout {
    /// `[contradiction, neutral, entailment]`.
    pub const CANONICAL: LabelLayout = LabelLayout {
        entailment: 2,
        contradiction: 0,
        neutral: Some(1),
        num_labels: 3,
    };

    /// Derives the layout from a model config's `id2label` entries.
    ///
    /// Label names are matched case-insensitively. For two-way heads the
    /// `not_entailment` class stands in for contradiction.
    pub fn from_id2label<I, S>(id2label: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, S)>,
        S: AsRef<str>,
    {
        let mut entailment = None;
        let mut contradiction = None;
        let mut not_entailment = None;
        let mut neutral = None;
        let mut num_labels = 0;

        for (id, name) in id2label {
            num_labels = num_labels.max(id + 1);
            let name = name.as_ref().trim().to_ascii_lowercase().replace([' ', '-'], "_");
            match name.as_str() {
                "entailment" => entailment = Some(id),
                "contradiction" => contradiction = Some(id),
                "neutral" => neutral = Some(id),
                "not_entailment" | "non_entailment" => not_entailment = Some(id),
                _ => {}
            }
        }

        let entailment = entailment.ok_or_else(|| {
            ZeroShotError::ModelFormat("id2label does not contain an 'entailment' label".into())
        })?;
        let contradiction = contradiction.or(not_entailment).ok_or_else(|| {
            ZeroShotError::ModelFormat(
                "id2label contains neither a 'contradiction' nor a 'not_entailment' label".into(),
            )
        })?;

        Ok(Self {
            entailment,
            contradiction,
            neutral,
            num_labels,
        })
    }
}

/// Model collaborator: scores a batch of encoded pairs.
///
/// Returns one logit row per pair, in batch order, laid out as described by
/// [`label_layout`](NliModel::label_layout). Calls must not mutate state that
/// a later call can observe.
pub trait NliModel {
    fn label_layout(&self) -> &LabelLayout;

    fn forward(&self, batch: &EncodedBatch) -> Result<Vec<Vec<f32>>>;

    /// Longest pair the model accepts, when it has a hard limit.
    fn max_sequence_length(&self) -> Option<usize> {
        None
    }
}
