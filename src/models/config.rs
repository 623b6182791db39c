use crate::core::{Result, ZeroShotError};
use crate::pipelines::zero_shot::LabelLayout;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

/// The parts of a Hugging Face `config.json` the NLI pipeline reads itself.
///
/// The full document is kept so architecture-specific configs can be parsed
/// from the same file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NliModelConfig {
    #[serde(default)]
    pub id2label: HashMap<String, String>,
    pub max_position_embeddings: Option<usize>,
    pub model_type: Option<String>,
    #[serde(default)]
    pub architectures: Vec<String>,
    #[serde(skip)]
    raw: serde_json::Value,
}

impl NliModelConfig {
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| ZeroShotError::ModelFormat(format!("Failed to parse model config: {e}")))?;
        let mut config: Self = serde_json::from_value(raw.clone())
            .map_err(|e| ZeroShotError::ModelFormat(format!("Failed to parse model config: {e}")))?;
        config.raw = raw;
        Ok(config)
    }

    /// Parses the same document as an architecture's own config type.
    pub fn parse_as<C: DeserializeOwned>(&self) -> Result<C> {
        C::deserialize(&self.raw).map_err(|e| {
            ZeroShotError::ModelFormat(format!(
                "config.json does not match the {} architecture: {e}",
                self.model_type.as_deref().unwrap_or("declared")
            ))
        })
    }

    /// `id2label` entries with numeric ids, sorted by id.
    pub fn labels(&self) -> Result<Vec<(usize, String)>> {
        let mut labels = self
            .id2label
            .iter()
            .map(|(id, label)| {
                id.parse::<usize>()
                    .map(|id| (id, label.clone()))
                    .map_err(|_| ZeroShotError::ModelFormat(format!("id2label key {id:?} is not a number")))
            })
            .collect::<Result<Vec<_>>>()?;
        labels.sort_by_key(|(id, _)| *id);
        Ok(labels)
    }

    pub fn num_labels(&self) -> Result<usize> {
        Ok(self.labels()?.last().map_or(0, |(id, _)| id + 1))
    }

    pub fn label_layout(&self) -> Result<LabelLayout> {
        LabelLayout::from_id2label(self.labels()?)
    }
}
