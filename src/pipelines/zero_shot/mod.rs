//! Zero-shot classification through natural language inference.
//!
//! Each candidate label becomes a hypothesis (`"This example is {label}."`)
//! that an NLI model scores against the input text. The entailment logits are
//! then turned into label scores:
//!
//! - [`ClassificationMode::SingleLabel`]: softmax over the entailment logits of
//!   all labels, so the scores sum to 1.
//! - [`ClassificationMode::MultiLabel`]: each label on its own, entailment
//!   against contradiction (see [`MultiLabelScoring`](crate::core::MultiLabelScoring)).
//!
//! The stages are exposed individually ([`HypothesisBuilder`], [`PairEncoder`],
//! [`InferenceAdapter`], [`ScoreAggregator`], [`ResultRanker`]) and chained by
//! [`ZeroShotClassificationPipeline`]. The model and tokenizer are the
//! [`NliModel`] and [`PairTokenizer`] traits, so any backend can be plugged in
//! with [`ZeroShotClassificationPipeline::from_parts`].

pub mod builder;
pub mod encoder;
pub mod hypothesis;
pub mod inference;
pub mod model;
pub mod pipeline;
pub mod ranking;
pub mod scoring;

pub use builder::{NliClassificationPipeline, ZeroShotClassificationPipelineBuilder};
pub use encoder::{EncodedBatch, EncodedPair, HfPairTokenizer, PaddedBatch, PairEncoder, PairTokenizer};
pub use hypothesis::{HypothesisBuilder, HypothesisPair};
pub use inference::{InferenceAdapter, LogitTriple};
pub use model::{LabelLayout, NliModel};
pub use pipeline::{CancelSignal, ClassificationRequest, ZeroShotClassificationPipeline};
pub use ranking::{ClassificationResult, LabelScore, ResultRanker};
pub use scoring::{ClassificationMode, ScoreAggregator};

pub use crate::models::ZeroShotModel;
