use super::encoder::{PairEncoder, PairTokenizer};
use super::hypothesis::HypothesisBuilder;
use super::inference::InferenceAdapter;
use super::model::NliModel;
use super::ranking::{ClassificationResult, ResultRanker};
use super::scoring::{ClassificationMode, ScoreAggregator};
use crate::core::{ClassificationConfig, Result, Stage, ZeroShotError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A text and the labels to score it against.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRequest {
    pub premise: String,
    /// Order is the tie-break order of the result.
    pub candidate_labels: Vec<String>,
    pub mode: ClassificationMode,
}

impl ClassificationRequest {
    pub fn new<I, S>(premise: impl Into<String>, candidate_labels: I, mode: ClassificationMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            premise: premise.into(),
            candidate_labels: candidate_labels.into_iter().map(Into::into).collect(),
            mode,
        }
    }
}

/// Cooperative cancellation flag shared between a caller and running requests.
///
/// Checked between stages; a stage that already started runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    cancelled: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn check(&self, stage: Stage) -> Result<()> {
        if self.is_cancelled() {
            tracing::debug!(%stage, "classification cancelled");
            return Err(ZeroShotError::Cancelled(stage));
        }
        Ok(())
    }
}

/// Zero-shot classifier over an NLI model.
///
/// Cheap to clone: the model and tokenizer are shared handles. The pipeline
/// keeps no per-request state, so one instance can serve several threads.
pub struct ZeroShotClassificationPipeline<M: NliModel, T: PairTokenizer> {
    pub(crate) model: Arc<M>,
    pub(crate) tokenizer: Arc<T>,
    hypotheses: HypothesisBuilder,
    aggregator: ScoreAggregator,
    config: ClassificationConfig,
}

impl<M: NliModel, T: PairTokenizer> Clone for ZeroShotClassificationPipeline<M, T> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            tokenizer: Arc::clone(&self.tokenizer),
            hypotheses: self.hypotheses.clone(),
            aggregator: self.aggregator,
            config: self.config.clone(),
        }
    }
}

impl<M: NliModel, T: PairTokenizer> ZeroShotClassificationPipeline<M, T> {
    /// Assembles a pipeline from already loaded collaborators.
    ///
    /// `config.max_sequence_length` is not applied here; the tokenizer is
    /// expected to enforce its own limit.
    pub fn from_parts(model: Arc<M>, tokenizer: Arc<T>, config: ClassificationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model,
            tokenizer,
            hypotheses: HypothesisBuilder::new(config.hypothesis_template.clone())?,
            aggregator: ScoreAggregator::new(config.multi_label_scoring),
            config,
        })
    }

    pub fn config(&self) -> &ClassificationConfig {
        &self.config
    }

    pub fn model(&self) -> &Arc<M> {
        &self.model
    }

    pub fn tokenizer(&self) -> &Arc<T> {
        &self.tokenizer
    }

    /// Scores `premise` against every candidate label.
    pub fn classify<S: AsRef<str>>(
        &self,
        premise: &str,
        candidate_labels: &[S],
        mode: ClassificationMode,
    ) -> Result<ClassificationResult> {
        let request = ClassificationRequest::new(
            premise,
            candidate_labels.iter().map(|l| AsRef::<str>::as_ref(l)),
            mode,
        );
        self.run(&request)
    }

    /// Shortcut for [`ClassificationMode::MultiLabel`].
    pub fn classify_multi_label<S: AsRef<str>>(
        &self,
        premise: &str,
        candidate_labels: &[S],
    ) -> Result<ClassificationResult> {
        self.classify(premise, candidate_labels, ClassificationMode::MultiLabel)
    }

    pub fn run(&self, request: &ClassificationRequest) -> Result<ClassificationResult> {
        self.run_cancellable(request, &CancelSignal::default())
    }

    /// Like [`run`](Self::run), giving up at the next stage boundary once
    /// `signal` is cancelled.
    pub fn run_cancellable(
        &self,
        request: &ClassificationRequest,
        signal: &CancelSignal,
    ) -> Result<ClassificationResult> {
        let labels = &request.candidate_labels;
        let span = tracing::debug_span!(
            "zero_shot_classify",
            labels = labels.len(),
            mode = ?request.mode
        );
        let _enter = span.enter();

        validate_labels(labels).map_err(|e| e.in_stage(Stage::Validation, labels))?;

        let pairs = self
            .hypotheses
            .build_pairs(&request.premise, labels)
            .map_err(|e| e.in_stage(Stage::Hypothesis, labels))?;

        signal.check(Stage::Encoding)?;
        let batch = PairEncoder::new(self.tokenizer.as_ref())
            .encode(&pairs)
            .map_err(|e| e.in_stage(Stage::Encoding, labels))?;
        tracing::debug!(pairs = batch.len(), max_len = batch.max_len(), "encoded hypothesis pairs");

        signal.check(Stage::Inference)?;
        let triples = InferenceAdapter::new(self.model.as_ref())
            .infer(&batch)
            .map_err(|e| e.in_stage(Stage::Inference, labels))?;
        tracing::debug!(rows = triples.len(), "inference complete");

        signal.check(Stage::Aggregation)?;
        let scores = self
            .aggregator
            .aggregate(&triples, request.mode)
            .map_err(|e| e.in_stage(Stage::Aggregation, labels))?;

        let result = ResultRanker
            .rank(labels, &scores)
            .map_err(|e| e.in_stage(Stage::Ranking, labels))?;
        if let Some(top) = result.top() {
            tracing::debug!(label = %top.label, score = top.score, "classification complete");
        }
        Ok(result)
    }

    /// Runs each request independently; one failure does not affect the others.
    pub fn run_batch(&self, requests: &[ClassificationRequest]) -> Vec<Result<ClassificationResult>> {
        requests.iter().map(|request| self.run(request)).collect()
    }
}

fn validate_labels(labels: &[String]) -> Result<()> {
    if labels.is_empty() {
        return Err(ZeroShotError::invalid_label(None, "no candidate labels given"));
    }

    let mut seen = HashSet::with_capacity(labels.len());
    for (index, label) in labels.iter().enumerate() {
        if label.trim().is_empty() {
            return Err(ZeroShotError::invalid_label(
                Some(index),
                "label is empty after trimming",
            ));
        }
        if !seen.insert(label.as_str()) {
            return Err(ZeroShotError::invalid_label(
                Some(index),
                format!("duplicate label '{label}'"),
            ));
        }
    }
    Ok(())
}
