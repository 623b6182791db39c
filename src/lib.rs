pub mod core;
pub mod loaders;
pub mod models;
pub mod pipelines;

pub use crate::core::{ClassificationConfig, ModelCache, MultiLabelScoring, Result, Stage, ZeroShotError};

pub use models::{NliArchitecture, NliBackend, ZeroShotModel};

pub use pipelines::utils::{DeviceRequest, DeviceSelectable};
pub use pipelines::zero_shot::{
    CancelSignal, ClassificationMode, ClassificationRequest, ClassificationResult, LabelScore,
    NliClassificationPipeline, ZeroShotClassificationPipeline, ZeroShotClassificationPipelineBuilder,
};
