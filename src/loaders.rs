//! Loading NLI model files from the Hugging Face Hub or a local directory.
//!
//! ## Main Types
//!
//! - [`ModelSource`] - Where model files come from (Hub repo or local directory)
//! - [`HfLoader`] - Hub file loader with retry logic
//! - [`TokenizerLoader`] - Loads `tokenizer.json`
//! - [`NliConfigLoader`] - Loads `config.json` into an [`NliModelConfig`]
//! - [`WeightsLoader`] - Maps model weights into a [`VarBuilder`]
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use zero_shot_nli::loaders::{ModelSource, NliConfigLoader, TokenizerLoader};
//!
//! # async fn run() -> zero_shot_nli::core::Result<()> {
//! let source = ModelSource::hub("MoritzLaurer/deberta-v3-base-zeroshot-v2.0");
//! let tokenizer = TokenizerLoader::new(source.clone()).load().await?;
//! let config = NliConfigLoader::new(source).load().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Hub downloads retry Hugging Face Hub lock acquisition failures.

use crate::core::{Result, ZeroShotError};
use crate::models::NliModelConfig;
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub async fn load(&self) -> Result<PathBuf> {
        let hf_api = hf_hub::api::tokio::ApiBuilder::new()
            .with_chunk_size(None)
            .build()?;
        let hf_api = hf_api.model(self.repo.clone());

        let mut attempt = 0;
        loop {
            match hf_api.get(self.filename.as_str()).await {
                Ok(path) => return Ok(path),
                Err(e) => {
                    let retryable = e.to_string().contains("Lock acquisition failed");
                    if !retryable || attempt + 1 >= MAX_RETRIES {
                        return Err(ZeroShotError::Download(format!(
                            "{}/{}: {e}",
                            self.repo, self.filename
                        )));
                    }
                    let wait_time = std::time::Duration::from_millis(100 * (1 << attempt));
                    tracing::warn!(
                        repo = %self.repo,
                        file = %self.filename,
                        attempt = attempt + 1,
                        ?wait_time,
                        "hub lock busy, retrying download"
                    );
                    tokio::time::sleep(wait_time).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Where a model's files live.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelSource {
    Hub { repo: String },
    Local { dir: PathBuf },
}

impl ModelSource {
    pub fn hub(repo: impl Into<String>) -> Self {
        ModelSource::Hub { repo: repo.into() }
    }

    pub fn local(dir: impl Into<PathBuf>) -> Self {
        ModelSource::Local { dir: dir.into() }
    }

    /// Resolves `filename` to a path on disk, downloading it if needed.
    pub async fn fetch(&self, filename: &str) -> Result<PathBuf> {
        match self {
            ModelSource::Hub { repo } => HfLoader::new(repo, filename).load().await,
            ModelSource::Local { dir } => {
                let path = dir.join(filename);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(ZeroShotError::ModelNotFound(format!(
                        "{} does not exist",
                        path.display()
                    )))
                }
            }
        }
    }
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSource::Hub { repo } => write!(f, "{repo}"),
            ModelSource::Local { dir } => write!(f, "{}", dir.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenizerLoader {
    pub source: ModelSource,
    pub filename: String,
}

impl TokenizerLoader {
    pub fn new(source: ModelSource) -> Self {
        Self {
            source,
            filename: "tokenizer.json".into(),
        }
    }

    pub async fn load(&self) -> Result<Tokenizer> {
        let path = self.source.fetch(&self.filename).await?;
        Tokenizer::from_file(&path).map_err(|e| {
            ZeroShotError::Tokenizer(format!("Failed to load {}: {e}", path.display()))
        })
    }
}

#[derive(Debug, Clone)]
pub struct NliConfigLoader {
    pub source: ModelSource,
}

impl NliConfigLoader {
    pub fn new(source: ModelSource) -> Self {
        Self { source }
    }

    pub async fn load(&self) -> Result<NliModelConfig> {
        let path = self.source.fetch("config.json").await?;
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ZeroShotError::ModelFormat(format!("Failed to read config file {path:?}: {e}"))
        })?;
        NliModelConfig::from_json_str(&content)
    }
}

#[derive(Debug, Clone)]
pub struct WeightsLoader {
    pub source: ModelSource,
}

impl WeightsLoader {
    const CANDIDATES: [&'static str; 2] = ["model.safetensors", "pytorch_model.bin"];

    pub fn new(source: ModelSource) -> Self {
        Self { source }
    }

    /// Locates the weights file, preferring safetensors.
    pub async fn resolve(&self) -> Result<PathBuf> {
        let mut errors = Vec::new();
        for filename in Self::CANDIDATES {
            match self.source.fetch(filename).await {
                Ok(path) => return Ok(path),
                Err(e) => {
                    tracing::debug!(source = %self.source, filename, error = %e, "weights candidate unavailable");
                    errors.push(format!("{filename}: {e}"));
                }
            }
        }
        Err(ZeroShotError::ModelNotFound(format!(
            "No weights found for {}. Expected `model.safetensors` or `pytorch_model.bin` [{}]",
            self.source,
            errors.join(" | ")
        )))
    }

    pub async fn load(&self, device: &Device) -> Result<VarBuilder<'static>> {
        let path = self.resolve().await?;
        var_builder(&path, device)
    }
}

/// F32 [`VarBuilder`] over a safetensors or PyTorch weights file.
pub fn var_builder(path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let dtype = DType::F32;
    match path.extension().and_then(|ext| ext.to_str()) {
        // SAFETY: the mapped file is not modified while the model is alive.
        Some("safetensors") => Ok(unsafe {
            VarBuilder::from_mmaped_safetensors(&[path], dtype, device)?
        }),
        Some("bin") => Ok(VarBuilder::from_pth(path, dtype, device)?),
        _ => Err(ZeroShotError::ModelFormat(format!(
            "Unsupported weight file format: {path:?}"
        ))),
    }
}
