pub mod config;
pub mod implementations;

pub use config::NliModelConfig;
pub use implementations::{DebertaV2NliModel, ModernBertNliModel, XlmRobertaNliModel};

use crate::core::{ModelOptions, Result, ZeroShotError};
use crate::loaders::{ModelSource, NliConfigLoader, TokenizerLoader, WeightsLoader};
use crate::pipelines::zero_shot::{EncodedBatch, LabelLayout, NliModel};
use candle_core::Device;
use std::path::PathBuf;
use tokenizers::Tokenizer;

/// Encoder families with an NLI head that can be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NliArchitecture {
    DebertaV2,
    XlmRoberta,
    ModernBert,
}

impl NliArchitecture {
    /// Maps a `config.json` `model_type` to an architecture.
    pub fn from_model_type(model_type: &str) -> Option<Self> {
        match model_type {
            "deberta-v2" | "deberta_v2" => Some(NliArchitecture::DebertaV2),
            "xlm-roberta" | "xlm_roberta" => Some(NliArchitecture::XlmRoberta),
            "modernbert" => Some(NliArchitecture::ModernBert),
            _ => None,
        }
    }
}

impl std::fmt::Display for NliArchitecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NliArchitecture::DebertaV2 => "deberta-v2",
            NliArchitecture::XlmRoberta => "xlm-roberta",
            NliArchitecture::ModernBert => "modernbert",
        };
        write!(f, "{name}")
    }
}

/// Pretrained NLI checkpoints known to work for zero-shot classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ZeroShotModel {
    /// `MoritzLaurer/DeBERTa-v3-large-mnli-fever-anli-ling-wanli`
    DebertaV3LargeMnliFeverAnliLingWanli,
    /// `MoritzLaurer/deberta-v3-base-zeroshot-v2.0`, a two-way head.
    DebertaV3BaseZeroShot,
    /// `MoritzLaurer/bge-m3-zeroshot-v2.0`, multilingual.
    BgeM3ZeroShot,
    /// `tasksource/ModernBERT-base-nli`
    ModernBertBaseNli,
    /// A checkpoint directory containing `config.json`, `tokenizer.json` and weights.
    Local {
        dir: PathBuf,
        architecture: NliArchitecture,
    },
}

impl ZeroShotModel {
    pub fn source(&self) -> ModelSource {
        match self {
            ZeroShotModel::DebertaV3LargeMnliFeverAnliLingWanli => {
                ModelSource::hub("MoritzLaurer/DeBERTa-v3-large-mnli-fever-anli-ling-wanli")
            }
            ZeroShotModel::DebertaV3BaseZeroShot => {
                ModelSource::hub("MoritzLaurer/deberta-v3-base-zeroshot-v2.0")
            }
            ZeroShotModel::BgeM3ZeroShot => ModelSource::hub("MoritzLaurer/bge-m3-zeroshot-v2.0"),
            ZeroShotModel::ModernBertBaseNli => ModelSource::hub("tasksource/ModernBERT-base-nli"),
            ZeroShotModel::Local { dir, .. } => ModelSource::local(dir.clone()),
        }
    }

    pub fn architecture(&self) -> NliArchitecture {
        match self {
            ZeroShotModel::DebertaV3LargeMnliFeverAnliLingWanli
            | ZeroShotModel::DebertaV3BaseZeroShot => NliArchitecture::DebertaV2,
            ZeroShotModel::BgeM3ZeroShot => NliArchitecture::XlmRoberta,
            ZeroShotModel::ModernBertBaseNli => NliArchitecture::ModernBert,
            ZeroShotModel::Local { architecture, .. } => *architecture,
        }
    }

    pub async fn load_tokenizer(&self) -> Result<Tokenizer> {
        TokenizerLoader::new(self.source()).load().await
    }
}

impl std::fmt::Display for ZeroShotModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZeroShotModel::DebertaV3LargeMnliFeverAnliLingWanli => {
                write!(f, "deberta-v3-large-mnli-fever-anli-ling-wanli")
            }
            ZeroShotModel::DebertaV3BaseZeroShot => write!(f, "deberta-v3-base-zeroshot-v2.0"),
            ZeroShotModel::BgeM3ZeroShot => write!(f, "bge-m3-zeroshot-v2.0"),
            ZeroShotModel::ModernBertBaseNli => write!(f, "modernbert-base-nli"),
            ZeroShotModel::Local { dir, architecture } => {
                write!(f, "local-{architecture}-{}", dir.display())
            }
        }
    }
}

impl ModelOptions for ZeroShotModel {
    fn cache_key(&self) -> String {
        self.to_string()
    }
}

/// A loaded NLI model of any supported architecture.
pub enum NliBackend {
    DebertaV2(DebertaV2NliModel),
    XlmRoberta(XlmRobertaNliModel),
    ModernBert(ModernBertNliModel),
}

impl NliBackend {
    /// Downloads (or reads) config and weights for `model` and loads them on `device`.
    pub async fn load(model: &ZeroShotModel, device: Device) -> Result<Self> {
        let source = model.source();
        let architecture = model.architecture();
        tracing::info!(model = %model, %architecture, device = ?device.location(), "loading NLI model");

        let config = NliConfigLoader::new(source.clone()).load().await?;
        if let Some(declared) = config.model_type.as_deref() {
            match NliArchitecture::from_model_type(declared) {
                Some(found) if found != architecture => {
                    return Err(ZeroShotError::ModelFormat(format!(
                        "{model} declares model_type {declared:?}, expected {architecture}"
                    )));
                }
                None => tracing::warn!(model_type = declared, %architecture, "unrecognized model_type"),
                _ => {}
            }
        }

        let vb = WeightsLoader::new(source).load(&device).await?;
        match architecture {
            NliArchitecture::DebertaV2 => {
                DebertaV2NliModel::load(vb, &config, device).map(NliBackend::DebertaV2)
            }
            NliArchitecture::XlmRoberta => {
                XlmRobertaNliModel::load(vb, &config, device).map(NliBackend::XlmRoberta)
            }
            NliArchitecture::ModernBert => {
                ModernBertNliModel::load(vb, &config, device).map(NliBackend::ModernBert)
            }
        }
    }

    pub fn device(&self) -> &Device {
        match self {
            NliBackend::DebertaV2(m) => m.device(),
            NliBackend::XlmRoberta(m) => m.device(),
            NliBackend::ModernBert(m) => m.device(),
        }
    }
}

impl NliModel for NliBackend {
    fn label_layout(&self) -> &LabelLayout {
        match self {
            NliBackend::DebertaV2(m) => m.label_layout(),
            NliBackend::XlmRoberta(m) => m.label_layout(),
            NliBackend::ModernBert(m) => m.label_layout(),
        }
    }

    fn forward(&self, batch: &EncodedBatch) -> Result<Vec<Vec<f32>>> {
        match self {
            NliBackend::DebertaV2(m) => m.forward(batch),
            NliBackend::XlmRoberta(m) => m.forward(batch),
            NliBackend::ModernBert(m) => m.forward(batch),
        }
    }

    fn max_sequence_length(&self) -> Option<usize> {
        match self {
            NliBackend::DebertaV2(m) => m.max_sequence_length(),
            NliBackend::XlmRoberta(m) => m.max_sequence_length(),
            NliBackend::ModernBert(m) => m.max_sequence_length(),
        }
    }
}
