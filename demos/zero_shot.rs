use anyhow::Result;
use tracing_subscriber::EnvFilter;
use zero_shot_nli::pipelines::zero_shot::*;
use zero_shot_nli::DeviceSelectable;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("Building zero-shot classification pipeline...");

    // Use ZeroShotModel::BgeM3ZeroShot for multilingual text.
    let pipeline = ZeroShotClassificationPipelineBuilder::deberta_v3_large()
        .cpu()
        .build()
        .await?;

    println!("Pipeline built on {:?}.", pipeline.device());

    let premise = "Java is the best programming language";
    let candidate_labels = ["Software Engineering", "Software Programming", "Politics"];

    println!("\nClassifying premise: '{premise}'");
    println!("With labels: {candidate_labels:?}");

    let single = pipeline.classify(premise, &candidate_labels, ClassificationMode::SingleLabel)?;
    println!("\n--- Single label (scores sum to 1) ---");
    for LabelScore { label, score } in &single {
        println!("  - {label}: {score:.4}");
    }

    let multi = pipeline.classify_multi_label(premise, &candidate_labels)?;
    println!("\n--- Multi label (independent scores) ---");
    for LabelScore { label, score } in &multi {
        println!("  - {label}: {score:.4}");
    }

    let requests = [
        ClassificationRequest::new(
            "The local team won the championship game last night!",
            ["technology", "business", "politics", "sports"],
            ClassificationMode::SingleLabel,
        ),
        ClassificationRequest::new(
            "Apple just announced the new iPhone with USB-C.",
            ["technology", "business", "politics", "sports"],
            ClassificationMode::MultiLabel,
        ),
    ];
    println!("\n--- Batch ---");
    for (request, result) in requests.iter().zip(pipeline.run_batch(&requests)) {
        let result = result?;
        if let Some(top) = result.top() {
            println!("  '{}' -> {} ({:.4})", request.premise, top.label, top.score);
        }
    }

    Ok(())
}
