use std::fmt;
use thiserror::Error;

/// Pipeline stage a failure was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validation,
    Hypothesis,
    Encoding,
    Inference,
    Aggregation,
    Ranking,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validation => "validation",
            Stage::Hypothesis => "hypothesis",
            Stage::Encoding => "encoding",
            Stage::Inference => "inference",
            Stage::Aggregation => "aggregation",
            Stage::Ranking => "ranking",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ZeroShotError {
    // Request-scoped failures
    #[error("Invalid candidate label{}: {reason}", at_index(.index))]
    InvalidLabel {
        index: Option<usize>,
        reason: String,
    },

    #[error("Encoding failed for pair {index}: {message}")]
    Encoding { index: usize, message: String },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Numeric error{}: {message}", at_index(.index))]
    Numeric {
        index: Option<usize>,
        message: String,
    },

    #[error("Request cancelled before the {0} stage")]
    Cancelled(Stage),

    /// A request-scoped failure annotated with where it happened.
    #[error("{stage} stage failed{}: {source}", for_label(.label))]
    Stage {
        stage: Stage,
        label: Option<String>,
        #[source]
        source: Box<ZeroShotError>,
    },

    // Model loading
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid model format: {0}")]
    ModelFormat(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Pass-through from dependencies
    #[error(transparent)]
    Candle(#[from] candle_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ZeroShotError>;

fn at_index(index: &Option<usize>) -> String {
    index.map(|i| format!(" at position {i}")).unwrap_or_default()
}

fn for_label(label: &Option<String>) -> String {
    label
        .as_ref()
        .map(|l| format!(" for label '{l}'"))
        .unwrap_or_default()
}

impl ZeroShotError {
    /// The innermost error, with stage annotations peeled off.
    pub fn root(&self) -> &ZeroShotError {
        match self {
            ZeroShotError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stage the error was raised from, if it was raised while classifying.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ZeroShotError::Stage { stage, .. } => Some(*stage),
            ZeroShotError::Cancelled(stage) => Some(*stage),
            _ => None,
        }
    }

    /// Candidate label the failure is attributed to, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            ZeroShotError::Stage { label, .. } => label.as_deref(),
            _ => None,
        }
    }

    /// Position of the offending candidate label or encoded pair.
    pub(crate) fn index(&self) -> Option<usize> {
        match self {
            ZeroShotError::InvalidLabel { index, .. } => *index,
            ZeroShotError::Encoding { index, .. } => Some(*index),
            ZeroShotError::Numeric { index, .. } => *index,
            _ => None,
        }
    }

    pub(crate) fn invalid_label(index: Option<usize>, reason: impl Into<String>) -> Self {
        ZeroShotError::InvalidLabel {
            index,
            reason: reason.into(),
        }
    }

    pub(crate) fn numeric(index: Option<usize>, message: impl Into<String>) -> Self {
        ZeroShotError::Numeric {
            index,
            message: message.into(),
        }
    }

    /// Annotates the error with the stage it happened in, resolving the label
    /// from the error's position when possible.
    pub(crate) fn in_stage(self, stage: Stage, labels: &[String]) -> Self {
        if matches!(self, ZeroShotError::Stage { .. } | ZeroShotError::Cancelled(_)) {
            return self;
        }
        let label = self.index().and_then(|i| labels.get(i).cloned());
        ZeroShotError::Stage {
            stage,
            label,
            source: Box::new(self),
        }
    }
}

impl From<hf_hub::api::tokio::ApiError> for ZeroShotError {
    fn from(value: hf_hub::api::tokio::ApiError) -> Self {
        ZeroShotError::Download(value.to_string())
    }
}
