use super::encoder::HfPairTokenizer;
use super::model::NliModel;
use super::pipeline::ZeroShotClassificationPipeline;
use crate::core::{ClassificationConfig, ModelCache, MultiLabelScoring, Result};
use crate::models::{NliBackend, ZeroShotModel};
use crate::pipelines::utils::{build_cache_key, DeviceRequest, DeviceSelectable};
use std::path::Path;
use std::sync::Arc;

/// Pipeline over a candle NLI backend and a Hugging Face tokenizer.
pub type NliClassificationPipeline = ZeroShotClassificationPipeline<NliBackend, HfPairTokenizer>;

/// Longest pair accepted when neither the config nor the model states a limit.
const FALLBACK_MAX_SEQUENCE_LENGTH: usize = 512;

/// Builds an [`NliClassificationPipeline`] for one of the [`ZeroShotModel`] checkpoints.
///
/// ```rust,no_run
/// use zero_shot_nli::pipelines::zero_shot::*;
/// use zero_shot_nli::models::ZeroShotModel;
/// use zero_shot_nli::pipelines::utils::DeviceSelectable;
///
/// # async fn run() -> zero_shot_nli::core::Result<()> {
/// let pipeline = ZeroShotClassificationPipelineBuilder::new(ZeroShotModel::BgeM3ZeroShot)
///     .cpu()
///     .hypothesis_template("This text is about {}.")
///     .build()
///     .await?;
///
/// let result = pipeline.classify(
///     "Java is the best programming language",
///     &["Software Engineering", "Software Programming", "Politics"],
///     ClassificationMode::SingleLabel,
/// )?;
/// # Ok(())
/// # }
/// ```
pub struct ZeroShotClassificationPipelineBuilder {
    model: ZeroShotModel,
    device_request: DeviceRequest,
    config: ClassificationConfig,
    cache: Option<ModelCache>,
}

impl ZeroShotClassificationPipelineBuilder {
    pub fn new(model: ZeroShotModel) -> Self {
        Self {
            model,
            device_request: DeviceRequest::Default,
            config: ClassificationConfig::default(),
            cache: None,
        }
    }

    pub fn deberta_v3_large() -> Self {
        Self::new(ZeroShotModel::DebertaV3LargeMnliFeverAnliLingWanli)
    }

    pub fn bge_m3() -> Self {
        Self::new(ZeroShotModel::BgeM3ZeroShot)
    }

    pub fn modernbert_base() -> Self {
        Self::new(ZeroShotModel::ModernBertBaseNli)
    }

    pub fn config(mut self, config: ClassificationConfig) -> Self {
        self.config = config;
        self
    }

    /// Reads the classification config from a JSON file.
    pub fn config_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let config = ClassificationConfig::from_json_file(path)?;
        Ok(self.config(config))
    }

    pub fn hypothesis_template(mut self, template: impl Into<String>) -> Self {
        self.config.hypothesis_template = template.into();
        self
    }

    pub fn multi_label_scoring(mut self, scoring: MultiLabelScoring) -> Self {
        self.config.multi_label_scoring = scoring;
        self
    }

    pub fn max_sequence_length(mut self, max_length: usize) -> Self {
        self.config.max_sequence_length = Some(max_length);
        self
    }

    /// Share loaded weights with other pipelines built from the same cache.
    pub fn cache(mut self, cache: &ModelCache) -> Self {
        self.cache = Some(cache.clone());
        self
    }

    pub async fn build(self) -> Result<NliClassificationPipeline> {
        self.config.validate()?;
        let device = self.device_request.resolve()?;

        let model = match &self.cache {
            Some(cache) => {
                let key = build_cache_key(&self.model, &device);
                let (options, device) = (self.model.clone(), device.clone());
                cache
                    .get_or_create(&key, || async move { NliBackend::load(&options, device).await })
                    .await?
            }
            None => Arc::new(NliBackend::load(&self.model, device).await?),
        };

        let max_length = self
            .config
            .max_sequence_length
            .or_else(|| model.max_sequence_length())
            .unwrap_or(FALLBACK_MAX_SEQUENCE_LENGTH);
        let tokenizer = HfPairTokenizer::new(self.model.load_tokenizer().await?, max_length)?;

        tracing::info!(
            model = %self.model,
            max_length,
            template = %self.config.hypothesis_template,
            "zero-shot pipeline ready"
        );
        ZeroShotClassificationPipeline::from_parts(model, Arc::new(tokenizer), self.config)
    }
}

impl DeviceSelectable for ZeroShotClassificationPipelineBuilder {
    fn device_request_mut(&mut self) -> &mut DeviceRequest {
        &mut self.device_request
    }
}

impl NliClassificationPipeline {
    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }
}
