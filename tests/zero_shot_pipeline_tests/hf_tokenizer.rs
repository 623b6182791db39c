use crate::common::ConstantModel;
use std::str::FromStr;
use std::sync::Arc;
use tokenizers::Tokenizer;
use zero_shot_nli::pipelines::zero_shot::*;
use zero_shot_nli::{ClassificationConfig, Stage, ZeroShotError};

const VOCAB: &str = r#"{"[UNK]": 0, "[PAD]": 1, "java": 2, "is": 3, "great": 4, "example": 5, "code": 6, ".": 7}"#;

fn word_level(truncation: &str, padding: &str) -> Tokenizer {
    let json = format!(
        r#"{{
            "version": "1.0",
            "truncation": {truncation},
            "padding": {padding},
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": {{"type": "Whitespace"}},
            "post_processor": null,
            "decoder": null,
            "model": {{"type": "WordLevel", "vocab": {VOCAB}, "unk_token": "[UNK]"}}
        }}"#
    );
    Tokenizer::from_str(&json).unwrap()
}

#[test]
fn encodes_premise_with_hypothesis() {
    let tokenizer = HfPairTokenizer::new(word_level("null", "null"), 16).unwrap();
    let pair = tokenizer
        .encode_pair("java is great", "This example is code.")
        .unwrap();

    assert_eq!(pair.input_ids, vec![2, 3, 4, 0, 5, 3, 6, 7]);
    assert_eq!(pair.attention_mask, vec![1; 8]);
    assert_eq!(tokenizer.pad_id(), 1);
}

#[test]
fn pad_id_comes_from_padding_config() {
    let padding = r#"{"strategy": "BatchLongest", "direction": "Right", "pad_to_multiple_of": null,
        "pad_id": 7, "pad_type_id": 0, "pad_token": "."}"#;
    let tokenizer = HfPairTokenizer::new(word_level("null", padding), 16).unwrap();
    assert_eq!(tokenizer.pad_id(), 7);
    assert!(tokenizer.tokenizer().get_padding().is_none());
}

#[test]
fn configured_truncation_is_disabled() {
    let truncation =
        r#"{"direction": "Right", "max_length": 4, "strategy": "LongestFirst", "stride": 0}"#;
    let tokenizer = HfPairTokenizer::new(word_level(truncation, "null"), 16).unwrap();
    let pair = tokenizer
        .encode_pair("java is great", "This example is code.")
        .unwrap();
    assert_eq!(pair.len(), 8);
}

#[test]
fn over_length_pairs_are_rejected() {
    let tokenizer = HfPairTokenizer::new(word_level("null", "null"), 7).unwrap();
    let err = tokenizer
        .encode_pair("java is great", "This example is code.")
        .unwrap_err();
    assert!(matches!(err, ZeroShotError::Tokenizer(_)));
}

#[test]
fn pipeline_runs_on_a_hugging_face_tokenizer() {
    let tokenizer = HfPairTokenizer::new(word_level("null", "null"), 8).unwrap();
    let pipeline = ZeroShotClassificationPipeline::from_parts(
        Arc::new(ConstantModel {
            row: vec![-1.0, 0.0, 1.0],
            layout: LabelLayout::CANONICAL,
        }),
        Arc::new(tokenizer),
        ClassificationConfig::default(),
    )
    .unwrap();

    let result = pipeline
        .classify("java is great", &["code", "java"], ClassificationMode::MultiLabel)
        .unwrap();
    assert_eq!(result.len(), 2);

    // With "This example is software engineering." the pair is 9 tokens, one over the limit.
    let err = pipeline
        .classify(
            "java is great",
            &["code", "software engineering"],
            ClassificationMode::MultiLabel,
        )
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Encoding));
    assert_eq!(err.label(), Some("software engineering"));
}
