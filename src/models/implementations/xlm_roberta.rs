//! XLM-RoBERTa NLI classifier (bge-m3 zero-shot checkpoints) on top of
//! `candle_transformers::models::xlm_roberta`.

use super::batch_tensors;
use crate::core::{Result, ZeroShotError};
use crate::models::NliModelConfig;
use crate::pipelines::zero_shot::{EncodedBatch, LabelLayout, NliModel};
use candle_core::Device;
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config, XLMRobertaForSequenceClassification};

/// RoBERTa position ids start after the padding index.
const POSITION_OFFSET: usize = 2;

pub struct XlmRobertaNliModel {
    model: XLMRobertaForSequenceClassification,
    layout: LabelLayout,
    max_position_embeddings: Option<usize>,
    device: Device,
}

impl XlmRobertaNliModel {
    pub fn load(vb: VarBuilder, config: &NliModelConfig, device: Device) -> Result<Self> {
        let layout = config.label_layout()?;
        let xlm_config: Config = config.parse_as()?;

        let mut errors = Vec::new();
        for prefix in ["", "model"] {
            let vb_prefix = if prefix.is_empty() {
                vb.clone()
            } else {
                vb.pp(prefix)
            };
            let name = if prefix.is_empty() { "<root>" } else { prefix };

            match XLMRobertaForSequenceClassification::new(layout.num_labels, &xlm_config, vb_prefix) {
                Ok(model) => {
                    tracing::info!(prefix = name, labels = layout.num_labels, "loaded XLM-RoBERTa NLI model");
                    return Ok(Self {
                        model,
                        layout,
                        max_position_embeddings: config
                            .max_position_embeddings
                            .map(|n| n.saturating_sub(POSITION_OFFSET)),
                        device,
                    });
                }
                Err(e) => errors.push(format!("{name}: {e}")),
            }
        }

        Err(ZeroShotError::ModelFormat(format!(
            "Failed to load XLM-RoBERTa weights with tried prefixes [{}]",
            errors.join(" | ")
        )))
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl NliModel for XlmRobertaNliModel {
    fn label_layout(&self) -> &LabelLayout {
        &self.layout
    }

    fn forward(&self, batch: &EncodedBatch) -> Result<Vec<Vec<f32>>> {
        let tensors = batch_tensors(batch, &self.device)?;
        // Single segment embedding: token types are always zero.
        let token_type_ids = tensors.input_ids.zeros_like()?;
        let logits = self
            .model
            .forward(&tensors.input_ids, &tensors.attention_mask, &token_type_ids)?;
        Ok(logits.to_vec2::<f32>()?)
    }

    fn max_sequence_length(&self) -> Option<usize> {
        self.max_position_embeddings
    }
}
