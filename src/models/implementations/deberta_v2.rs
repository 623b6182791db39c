//! DeBERTa-v2/v3 NLI classifier on top of `candle_transformers::models::debertav2`.

use super::batch_tensors;
use crate::core::{Result, ZeroShotError};
use crate::models::NliModelConfig;
use crate::pipelines::zero_shot::{EncodedBatch, LabelLayout, NliModel};
use candle_core::Device;
use candle_nn::VarBuilder;
use candle_transformers::models::debertav2::{
    Config, DebertaV2SeqClassificationModel, Id2Label,
};

pub struct DebertaV2NliModel {
    model: DebertaV2SeqClassificationModel,
    layout: LabelLayout,
    max_position_embeddings: Option<usize>,
    device: Device,
}

impl DebertaV2NliModel {
    /// Builds the classifier from a loaded config and weights.
    ///
    /// Checkpoints exported from `DebertaV2ForSequenceClassification` keep the
    /// backbone under `deberta.`; bare checkpoints are tried at the root.
    pub fn load(vb: VarBuilder, config: &NliModelConfig, device: Device) -> Result<Self> {
        let layout = config.label_layout()?;
        let deberta_config: Config = config.parse_as()?;
        let id2label: Id2Label = config
            .labels()?
            .into_iter()
            .map(|(id, label)| (id as u32, label))
            .collect();

        let mut errors = Vec::new();
        for prefix in ["deberta", ""] {
            let vb_prefix = if prefix.is_empty() {
                vb.clone()
            } else {
                vb.pp(prefix)
            };
            let name = if prefix.is_empty() { "<root>" } else { prefix };

            match DebertaV2SeqClassificationModel::load(vb_prefix, &deberta_config, Some(id2label.clone())) {
                Ok(model) => {
                    tracing::info!(prefix = name, labels = layout.num_labels, "loaded DeBERTa-v2 NLI model");
                    return Ok(Self {
                        model,
                        layout,
                        max_position_embeddings: config.max_position_embeddings,
                        device,
                    });
                }
                Err(e) => errors.push(format!("{name}: {e}")),
            }
        }

        Err(ZeroShotError::ModelFormat(format!(
            "Failed to load DeBERTa-v2 weights with tried prefixes [{}]",
            errors.join(" | ")
        )))
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl NliModel for DebertaV2NliModel {
    fn label_layout(&self) -> &LabelLayout {
        &self.layout
    }

    fn forward(&self, batch: &EncodedBatch) -> Result<Vec<Vec<f32>>> {
        let tensors = batch_tensors(batch, &self.device)?;
        let logits = self.model.forward(
            &tensors.input_ids,
            Some(tensors.type_ids),
            Some(tensors.attention_mask),
        )?;
        Ok(logits.to_vec2::<f32>()?)
    }

    fn max_sequence_length(&self) -> Option<usize> {
        self.max_position_embeddings
    }
}
