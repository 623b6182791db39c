use crate::common::*;
use proptest::prelude::*;
use std::sync::Arc;
use zero_shot_nli::pipelines::zero_shot::*;
use zero_shot_nli::{ClassificationConfig, MultiLabelScoring};

const PREMISE: &str = "Java is the best programming language";

fn label_sets() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z]{1,8}( [a-z]{1,8})?", 1..8)
        .prop_map(|labels| labels.into_iter().collect())
}

fn mode() -> impl Strategy<Value = ClassificationMode> {
    prop_oneof![
        Just(ClassificationMode::SingleLabel),
        Just(ClassificationMode::MultiLabel)
    ]
}

proptest! {
    #[test]
    fn single_label_scores_sum_to_one(labels in label_sets()) {
        let result = hash_pipeline()
            .classify(PREMISE, &labels, ClassificationMode::SingleLabel)
            .unwrap();
        let sum: f64 = result.iter().map(|s| f64::from(s.score)).sum();
        prop_assert!((sum - 1.0).abs() < 1e-6, "sum was {}", sum);
    }

    #[test]
    fn multi_label_scores_are_probabilities(labels in label_sets()) {
        let result = hash_pipeline()
            .classify(PREMISE, &labels, ClassificationMode::MultiLabel)
            .unwrap();
        prop_assert_eq!(result.len(), labels.len());
        prop_assert!(result.iter().all(|s| (0.0..=1.0).contains(&s.score)));
    }

    #[test]
    fn every_label_appears_once_in_descending_order(labels in label_sets(), mode in mode()) {
        let result = hash_pipeline().classify(PREMISE, &labels, mode).unwrap();

        let mut ranked: Vec<String> = result.labels().into_iter().map(String::from).collect();
        let mut expected = labels.clone();
        ranked.sort();
        expected.sort();
        prop_assert_eq!(ranked, expected);

        let scores: Vec<f32> = result.iter().map(|s| s.score).collect();
        prop_assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn permuting_labels_keeps_per_label_scores(
        labels in label_sets(),
        mode in mode(),
        seed in any::<u64>(),
    ) {
        let pipeline = hash_pipeline();
        let mut shuffled = labels.clone();
        // Deterministic Fisher-Yates driven by the seed.
        let mut state = seed;
        for i in (1..shuffled.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = (state >> 33) as usize % (i + 1);
            shuffled.swap(i, j);
        }

        let original = pipeline.classify(PREMISE, &labels, mode).unwrap();
        let permuted = pipeline.classify(PREMISE, &shuffled, mode).unwrap();

        for label in &labels {
            let a = original.score_of(label).unwrap();
            let b = permuted.score_of(label).unwrap();
            prop_assert!((a - b).abs() < 1e-6, "{}: {} vs {}", label, a, b);
        }
    }

    #[test]
    fn repeated_runs_are_identical(labels in label_sets(), mode in mode()) {
        let pipeline = hash_pipeline();
        let first = pipeline.classify(PREMISE, &labels, mode).unwrap();
        let second = pipeline.classify(PREMISE, &labels, mode).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn single_candidate_is_certain() {
    let result = hash_pipeline()
        .classify(PREMISE, &["anything"], ClassificationMode::SingleLabel)
        .unwrap();
    assert_eq!(result.top().unwrap().score, 1.0);
}

#[test]
fn all_zero_logits() {
    let pipeline = constant_pipeline(vec![0.0, 0.0, 0.0]);
    let labels = ["a", "b", "c", "d"];

    let single = pipeline
        .classify(PREMISE, &labels, ClassificationMode::SingleLabel)
        .unwrap();
    assert!(single.iter().all(|s| (s.score - 0.25).abs() < 1e-6));
    // Equal scores keep candidate order.
    assert_eq!(single.labels(), labels);

    let multi = pipeline
        .classify_multi_label(PREMISE, &labels)
        .unwrap();
    assert!(multi.iter().all(|s| s.score == 0.5));
}

#[test]
fn multi_label_scoring_is_configurable() {
    // [contradiction, neutral, entailment]
    let row = vec![0.0, 2.0, 0.0];
    let labels = ["x"];

    let default = constant_pipeline(row.clone())
        .classify_multi_label(PREMISE, &labels)
        .unwrap();
    assert_eq!(default.score_of("x"), Some(0.5));

    let config = ClassificationConfig {
        multi_label_scoring: MultiLabelScoring::EntailmentVsAll,
        ..Default::default()
    };
    let with_neutral = ZeroShotClassificationPipeline::from_parts(
        Arc::new(ConstantModel {
            row,
            layout: LabelLayout::CANONICAL,
        }),
        Arc::new(HashTokenizer { max_length: 64 }),
        config,
    )
    .unwrap()
    .classify_multi_label(PREMISE, &labels)
    .unwrap();

    let expected = 1.0 / (2.0 + 2f64.exp());
    assert!((f64::from(with_neutral.score_of("x").unwrap()) - expected).abs() < 1e-6);
}

#[test]
fn custom_template_changes_hypotheses() {
    let default = hash_pipeline()
        .classify(PREMISE, &["sports", "politics"], ClassificationMode::MultiLabel)
        .unwrap();
    let config = ClassificationConfig {
        hypothesis_template: "The topic of this text is {}".into(),
        ..Default::default()
    };
    let custom = hash_pipeline_with(config, 64)
        .classify(PREMISE, &["sports", "politics"], ClassificationMode::MultiLabel)
        .unwrap();
    assert_ne!(default.score_of("sports"), custom.score_of("sports"));
}

#[test]
fn one_forward_call_per_request() {
    let pipeline = hash_pipeline();
    pipeline
        .classify(PREMISE, &["a", "b", "c"], ClassificationMode::SingleLabel)
        .unwrap();
    assert_eq!(pipeline.model().calls(), 1);
}

#[test]
fn shared_pipeline_serves_concurrent_requests() {
    let pipeline = Arc::new(hash_pipeline());
    let labels = ["technology", "business", "politics", "sports"];
    let expected = pipeline
        .classify(PREMISE, &labels, ClassificationMode::SingleLabel)
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = Arc::clone(&pipeline);
            std::thread::spawn(move || {
                pipeline
                    .classify(PREMISE, &labels, ClassificationMode::SingleLabel)
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn batch_matches_individual_runs() {
    let pipeline = hash_pipeline();
    let requests = vec![
        ClassificationRequest::new(PREMISE, ["a", "b"], ClassificationMode::SingleLabel),
        ClassificationRequest::new("Another text", ["c", "d", "e"], ClassificationMode::MultiLabel),
    ];

    let batch = pipeline.run_batch(&requests);
    for (request, result) in requests.iter().zip(batch) {
        assert_eq!(result.unwrap(), pipeline.run(request).unwrap());
    }
}
