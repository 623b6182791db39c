//! ModernBERT NLI classifier.
//!
//! The encoder alternates global attention with sliding-window attention
//! (every `global_attn_every_n_layers`-th layer is global), each with its own
//! rotary embedding. The classification head pools the last hidden state,
//! runs `dense -> GELU -> norm` and a linear classifier, and returns the
//! classifier output untouched: the aggregator needs raw logits.

use super::batch_tensors;
use crate::core::{Result, ZeroShotError};
use crate::models::NliModelConfig;
use crate::pipelines::zero_shot::{EncodedBatch, LabelLayout, NliModel};
use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::{
    embedding, layer_norm_no_bias, linear, linear_no_bias, ops::softmax, Embedding, LayerNorm,
    Linear, Module, VarBuilder,
};
use serde::Deserialize;
use std::sync::Arc;

const MASKED: f64 = f32::MIN as f64;

/// Encoder hyper-parameters read from `config.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModernBertConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    pub max_position_embeddings: usize,
    /// Older exports name it `layer_norm_eps`, newer ones `norm_eps`.
    layer_norm_eps: Option<f64>,
    norm_eps: Option<f64>,
    pub global_attn_every_n_layers: usize,
    pub global_rope_theta: f64,
    pub local_attention: usize,
    pub local_rope_theta: f64,
    #[serde(default)]
    pub classifier_pooling: ClassifierPooling,
}

impl ModernBertConfig {
    pub fn norm_eps(&self) -> f64 {
        self.norm_eps.or(self.layer_norm_eps).unwrap_or(1e-5)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierPooling {
    #[default]
    Cls,
    Mean,
}

#[derive(Debug, Clone)]
struct RotaryEmbedding {
    sin: Tensor,
    cos: Tensor,
}

impl RotaryEmbedding {
    fn new(config: &ModernBertConfig, theta: f64, dtype: DType, device: &Device) -> candle_core::Result<Self> {
        let head_dim = config.hidden_size / config.num_attention_heads;
        let inv_freq: Vec<f32> = (0..head_dim)
            .step_by(2)
            .map(|i| (1.0 / theta.powf(i as f64 / head_dim as f64)) as f32)
            .collect();
        let half = inv_freq.len();
        let inv_freq = Tensor::from_vec(inv_freq, (1, half), device)?.to_dtype(dtype)?;

        let max_len = config.max_position_embeddings;
        let positions = Tensor::arange(0u32, max_len as u32, device)?
            .to_dtype(dtype)?
            .reshape((max_len, 1))?;
        let angles = positions.matmul(&inv_freq)?;

        Ok(Self {
            sin: angles.sin()?,
            cos: angles.cos()?,
        })
    }

    fn apply(&self, q: &Tensor, k: &Tensor) -> candle_core::Result<(Tensor, Tensor)> {
        let q = candle_nn::rotary_emb::rope(&q.contiguous()?, &self.cos, &self.sin)?;
        let k = candle_nn::rotary_emb::rope(&k.contiguous()?, &self.cos, &self.sin)?;
        Ok((q, k))
    }
}

#[derive(Debug, Clone)]
struct SelfAttention {
    qkv: Linear,
    out: Linear,
    num_heads: usize,
    head_dim: usize,
    rotary: Arc<RotaryEmbedding>,
}

impl SelfAttention {
    fn load(vb: VarBuilder, config: &ModernBertConfig, rotary: Arc<RotaryEmbedding>) -> candle_core::Result<Self> {
        let hidden = config.hidden_size;
        Ok(Self {
            qkv: linear_no_bias(hidden, hidden * 3, vb.pp("Wqkv"))?,
            out: linear_no_bias(hidden, hidden, vb.pp("Wo"))?,
            num_heads: config.num_attention_heads,
            head_dim: hidden / config.num_attention_heads,
            rotary,
        })
    }

    fn forward(&self, xs: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
        let (batch, seq_len, hidden) = xs.dims3()?;
        let qkv = xs
            .apply(&self.qkv)?
            .reshape((batch, seq_len, 3, self.num_heads, self.head_dim))?
            .permute((2, 0, 3, 1, 4))?;

        let (q, k) = self.rotary.apply(&qkv.get(0)?, &qkv.get(1)?)?;
        let v = qkv.get(2)?;

        let q = (q * (self.head_dim as f64).powf(-0.5))?;
        let scores = q
            .matmul(&k.transpose(D::Minus2, D::Minus1)?)?
            .broadcast_add(mask)?;
        let probs = softmax(&scores, D::Minus1)?;

        probs
            .matmul(&v)?
            .transpose(1, 2)?
            .reshape((batch, seq_len, hidden))?
            .apply(&self.out)
    }
}

/// GeGLU feed-forward block.
#[derive(Debug, Clone)]
struct GatedMlp {
    wi: Linear,
    wo: Linear,
}

impl GatedMlp {
    fn load(vb: VarBuilder, config: &ModernBertConfig) -> candle_core::Result<Self> {
        Ok(Self {
            wi: linear_no_bias(config.hidden_size, config.intermediate_size * 2, vb.pp("Wi"))?,
            wo: linear_no_bias(config.intermediate_size, config.hidden_size, vb.pp("Wo"))?,
        })
    }
}

impl Module for GatedMlp {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let halves = xs.apply(&self.wi)?.chunk(2, D::Minus1)?;
        (halves[0].gelu_erf()? * &halves[1])?.apply(&self.wo)
    }
}

#[derive(Debug, Clone)]
struct EncoderLayer {
    attention: SelfAttention,
    mlp: GatedMlp,
    /// Absent on the first layer, whose input is already normalized.
    attention_norm: Option<LayerNorm>,
    mlp_norm: LayerNorm,
    sliding_window: bool,
}

impl EncoderLayer {
    fn load(
        vb: VarBuilder,
        config: &ModernBertConfig,
        rotary: Arc<RotaryEmbedding>,
        sliding_window: bool,
    ) -> candle_core::Result<Self> {
        let eps = config.norm_eps();
        Ok(Self {
            attention: SelfAttention::load(vb.pp("attn"), config, rotary)?,
            mlp: GatedMlp::load(vb.pp("mlp"), config)?,
            attention_norm: layer_norm_no_bias(config.hidden_size, eps, vb.pp("attn_norm")).ok(),
            mlp_norm: layer_norm_no_bias(config.hidden_size, eps, vb.pp("mlp_norm"))?,
            sliding_window,
        })
    }

    fn forward(&self, xs: &Tensor, global_mask: &Tensor, window_mask: &Tensor) -> candle_core::Result<Tensor> {
        let normed = match &self.attention_norm {
            Some(norm) => xs.apply(norm)?,
            None => xs.clone(),
        };
        let attended = if self.sliding_window {
            let mask = global_mask.broadcast_add(window_mask)?;
            self.attention.forward(&normed, &mask)?
        } else {
            self.attention.forward(&normed, global_mask)?
        };

        let xs = (xs + attended)?;
        let mlp_out = xs.apply(&self.mlp_norm)?.apply(&self.mlp)?;
        xs + mlp_out
    }
}

#[derive(Debug, Clone)]
struct ClassificationHead {
    dense: Linear,
    norm: LayerNorm,
    classifier: Linear,
    pooling: ClassifierPooling,
}

impl ClassificationHead {
    fn load(vb: VarBuilder, config: &ModernBertConfig, num_labels: usize) -> candle_core::Result<Self> {
        Ok(Self {
            dense: linear_no_bias(config.hidden_size, config.hidden_size, vb.pp("head.dense"))?,
            norm: layer_norm_no_bias(config.hidden_size, config.norm_eps(), vb.pp("head.norm"))?,
            classifier: linear(config.hidden_size, num_labels, vb.pp("classifier"))?,
            pooling: config.classifier_pooling,
        })
    }

    fn forward(&self, hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        let pooled = match self.pooling {
            ClassifierPooling::Cls => hidden.i((.., 0, ..))?.contiguous()?,
            ClassifierPooling::Mean => {
                let mask = attention_mask.unsqueeze(D::Minus1)?.to_dtype(hidden.dtype())?;
                let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
                let counts = attention_mask.sum_keepdim(1)?.to_dtype(hidden.dtype())?;
                summed.broadcast_div(&counts)?
            }
        };

        pooled
            .apply(&self.dense)?
            .gelu_erf()?
            .apply(&self.norm)?
            .apply(&self.classifier)
    }
}

/// `ModernBertForSequenceClassification` weights: `model.*`, `head.*`, `classifier`.
#[derive(Debug, Clone)]
struct ModernBertClassifier {
    embeddings: Embedding,
    embedding_norm: LayerNorm,
    layers: Vec<EncoderLayer>,
    final_norm: LayerNorm,
    head: ClassificationHead,
    window: usize,
    dtype: DType,
}

impl ModernBertClassifier {
    fn load(vb: VarBuilder, config: &ModernBertConfig, num_labels: usize) -> candle_core::Result<Self> {
        let eps = config.norm_eps();
        let dtype = vb.dtype();
        let model = vb.pp("model");

        let global_rotary = Arc::new(RotaryEmbedding::new(config, config.global_rope_theta, vb.dtype(), vb.device())?);
        let local_rotary = Arc::new(RotaryEmbedding::new(config, config.local_rope_theta, vb.dtype(), vb.device())?);

        let every = config.global_attn_every_n_layers.max(1);
        let layers = (0..config.num_hidden_layers)
            .map(|i| {
                let sliding_window = i % every != 0;
                let rotary = if sliding_window {
                    Arc::clone(&local_rotary)
                } else {
                    Arc::clone(&global_rotary)
                };
                EncoderLayer::load(model.pp(format!("layers.{i}")), config, rotary, sliding_window)
            })
            .collect::<candle_core::Result<Vec<_>>>()?;

        Ok(Self {
            embeddings: embedding(config.vocab_size, config.hidden_size, model.pp("embeddings.tok_embeddings"))?,
            embedding_norm: layer_norm_no_bias(config.hidden_size, eps, model.pp("embeddings.norm"))?,
            layers,
            final_norm: layer_norm_no_bias(config.hidden_size, eps, model.pp("final_norm"))?,
            head: ClassificationHead::load(vb, config, num_labels)?,
            window: config.local_attention,
            dtype,
        })
    }

    /// `(batch, 1, seq, seq)` additive mask hiding padded keys.
    fn padding_mask(&self, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        let (batch, seq_len) = attention_mask.dims2()?;
        let expanded = attention_mask
            .unsqueeze(1)?
            .unsqueeze(2)?
            .expand((batch, 1, seq_len, seq_len))?
            .to_dtype(self.dtype)?;
        ((1.0 - expanded)? * MASKED)?.to_dtype(self.dtype)
    }

    /// `(seq, seq)` additive mask hiding keys outside the local window.
    fn window_mask(&self, seq_len: usize, device: &Device) -> candle_core::Result<Tensor> {
        let reach = self.window / 2;
        let mask: Vec<f32> = (0..seq_len)
            .flat_map(|i| {
                (0..seq_len).map(move |j| if i.abs_diff(j) > reach { f32::NEG_INFINITY } else { 0.0 })
            })
            .collect();
        Tensor::from_slice(&mask, (seq_len, seq_len), device)?.to_dtype(self.dtype)
    }

    fn forward(&self, input_ids: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        let seq_len = input_ids.dim(1)?;
        let global_mask = self.padding_mask(attention_mask)?;
        let window_mask = self.window_mask(seq_len, input_ids.device())?;

        let mut hidden = input_ids.apply(&self.embeddings)?.apply(&self.embedding_norm)?;
        for layer in &self.layers {
            hidden = layer.forward(&hidden, &global_mask, &window_mask)?;
        }
        let hidden = hidden.apply(&self.final_norm)?;

        self.head.forward(&hidden, attention_mask)
    }
}

pub struct ModernBertNliModel {
    model: ModernBertClassifier,
    layout: LabelLayout,
    max_position_embeddings: usize,
    device: Device,
}

impl ModernBertNliModel {
    pub fn load(vb: VarBuilder, config: &NliModelConfig, device: Device) -> Result<Self> {
        let layout = config.label_layout()?;
        let modernbert_config: ModernBertConfig = config.parse_as()?;

        let model = ModernBertClassifier::load(vb, &modernbert_config, layout.num_labels).map_err(|e| {
            ZeroShotError::ModelFormat(format!("Failed to load ModernBERT weights: {e}"))
        })?;
        tracing::info!(
            layers = modernbert_config.num_hidden_layers,
            labels = layout.num_labels,
            pooling = ?modernbert_config.classifier_pooling,
            "loaded ModernBERT NLI model"
        );

        Ok(Self {
            model,
            layout,
            max_position_embeddings: modernbert_config.max_position_embeddings,
            device,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl NliModel for ModernBertNliModel {
    fn label_layout(&self) -> &LabelLayout {
        &self.layout
    }

    fn forward(&self, batch: &EncodedBatch) -> Result<Vec<Vec<f32>>> {
        let tensors = batch_tensors(batch, &self.device)?;
        let logits = self
            .model
            .forward(&tensors.input_ids, &tensors.attention_mask)?;
        Ok(logits.to_dtype(DType::F32)?.to_vec2::<f32>()?)
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(self.max_position_embeddings)
    }
}
