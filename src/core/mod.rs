pub mod cache;
pub mod config;
pub mod error;

pub use cache::{ModelCache, ModelOptions};
pub use config::{ClassificationConfig, MultiLabelScoring, DEFAULT_HYPOTHESIS_TEMPLATE};
pub use error::{Result, Stage, ZeroShotError};
