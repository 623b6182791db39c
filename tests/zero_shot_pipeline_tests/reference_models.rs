// Regression checks against pinned Hub checkpoints. They download several
// hundred megabytes, so they only run with `--ignored`.

use zero_shot_nli::pipelines::zero_shot::*;
use zero_shot_nli::{DeviceSelectable, ModelCache};

const PREMISE: &str = "Java is the best programming language";
const LABELS: [&str; 3] = ["Software Engineering", "Software Programming", "Politics"];
const TOLERANCE: f32 = 1e-2;

fn assert_scores(result: &ClassificationResult, expected: &[(&str, f32)]) {
    assert_eq!(result.top().unwrap().label, "Software Programming");
    assert_eq!(result.labels().last(), Some(&"Politics"));
    for (label, score) in expected {
        let actual = result.score_of(label).unwrap();
        assert!(
            (actual - score).abs() < TOLERANCE,
            "{label}: expected {score}, got {actual}"
        );
    }
}

#[tokio::test]
#[ignore = "downloads model weights"]
async fn deberta_v3_large_reference_scores() -> anyhow::Result<()> {
    let pipeline = ZeroShotClassificationPipelineBuilder::deberta_v3_large()
        .cpu()
        .build()
        .await?;

    let multi = pipeline.classify_multi_label(PREMISE, &LABELS)?;
    assert_scores(
        &multi,
        &[
            ("Software Programming", 0.99829),
            ("Software Engineering", 0.75103),
            ("Politics", 0.000205),
        ],
    );

    let single = pipeline.classify(PREMISE, &LABELS, ClassificationMode::SingleLabel)?;
    assert_scores(
        &single,
        &[
            ("Software Programming", 0.97661),
            ("Software Engineering", 0.02182),
            ("Politics", 0.00157),
        ],
    );
    Ok(())
}

#[tokio::test]
#[ignore = "downloads model weights"]
async fn bge_m3_reference_scores() -> anyhow::Result<()> {
    let pipeline = ZeroShotClassificationPipelineBuilder::bge_m3()
        .cpu()
        .build()
        .await?;

    let multi = pipeline.classify_multi_label(PREMISE, &LABELS)?;
    assert_scores(
        &multi,
        &[
            ("Software Programming", 0.98326),
            ("Software Engineering", 0.06830),
            ("Politics", 0.000334),
        ],
    );

    let single = pipeline.classify(PREMISE, &LABELS, ClassificationMode::SingleLabel)?;
    assert_scores(
        &single,
        &[
            ("Software Programming", 0.95370),
            ("Software Engineering", 0.04270),
            ("Politics", 0.00360),
        ],
    );
    Ok(())
}

#[tokio::test]
#[ignore = "downloads model weights"]
async fn modernbert_base_reference_scores() -> anyhow::Result<()> {
    let pipeline = ZeroShotClassificationPipelineBuilder::modernbert_base()
        .cpu()
        .build()
        .await?;

    let multi = pipeline.classify_multi_label(PREMISE, &LABELS)?;
    assert_scores(
        &multi,
        &[
            ("Software Programming", 0.98587),
            ("Software Engineering", 0.60504),
            ("Politics", 0.00098),
        ],
    );

    let single = pipeline.classify(PREMISE, &LABELS, ClassificationMode::SingleLabel)?;
    assert_scores(
        &single,
        &[
            ("Software Programming", 0.92195),
            ("Software Engineering", 0.07192),
            ("Politics", 0.00613),
        ],
    );
    Ok(())
}

#[tokio::test]
#[ignore = "downloads model weights"]
async fn pipelines_share_cached_weights() -> anyhow::Result<()> {
    let cache = ModelCache::new();
    let first = ZeroShotClassificationPipelineBuilder::bge_m3()
        .cpu()
        .cache(&cache)
        .build()
        .await?;
    let second = ZeroShotClassificationPipelineBuilder::bge_m3()
        .cpu()
        .hypothesis_template("This text is about {}.")
        .cache(&cache)
        .build()
        .await?;

    assert!(std::sync::Arc::ptr_eq(first.model(), second.model()));
    assert_eq!(cache.len().await, 1);
    Ok(())
}
