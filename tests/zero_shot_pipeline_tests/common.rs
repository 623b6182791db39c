use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use zero_shot_nli::pipelines::zero_shot::*;
use zero_shot_nli::{ClassificationConfig, Result, ZeroShotError};

/// Whitespace tokenizer: `[CLS] premise [SEP] hypothesis [SEP]`, each word
/// hashed to an id.
pub struct HashTokenizer {
    pub max_length: usize,
}

pub const CLS: u32 = 1;
pub const SEP: u32 = 2;
pub const PAD: u32 = 0;

fn word_id(word: &str) -> u32 {
    word.bytes()
        .fold(17u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)))
        % 10_000
        + 10
}

impl PairTokenizer for HashTokenizer {
    fn encode_pair(&self, premise: &str, hypothesis: &str) -> Result<EncodedPair> {
        let mut input_ids = vec![CLS];
        input_ids.extend(premise.split_whitespace().map(word_id));
        input_ids.push(SEP);
        let premise_len = input_ids.len();
        input_ids.extend(hypothesis.split_whitespace().map(word_id));
        input_ids.push(SEP);

        if input_ids.len() > self.max_length {
            return Err(ZeroShotError::Tokenizer(format!(
                "pair is {} tokens long, the maximum is {}",
                input_ids.len(),
                self.max_length
            )));
        }

        let mut type_ids = vec![0; premise_len];
        type_ids.resize(input_ids.len(), 1);
        Ok(EncodedPair {
            attention_mask: vec![1; input_ids.len()],
            input_ids,
            type_ids,
        })
    }

    fn pad_id(&self) -> u32 {
        PAD
    }
}

/// Deterministic NLI stand-in: logits depend only on the hypothesis tokens of
/// each row, laid out `[entailment, neutral, contradiction]`.
#[derive(Default)]
pub struct HashNliModel {
    pub calls: AtomicUsize,
}

impl HashNliModel {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub static ENTAILMENT_FIRST: LabelLayout = LabelLayout {
    entailment: 0,
    neutral: Some(1),
    contradiction: 2,
    num_labels: 3,
};

impl NliModel for HashNliModel {
    fn label_layout(&self) -> &LabelLayout {
        &ENTAILMENT_FIRST
    }

    fn forward(&self, batch: &EncodedBatch) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(batch
            .pairs()
            .iter()
            .map(|pair| {
                let hypothesis: u32 = pair
                    .input_ids
                    .iter()
                    .zip(&pair.type_ids)
                    .filter(|(_, &t)| t == 1)
                    .map(|(&id, _)| id)
                    .sum();
                let entailment = (hypothesis % 97) as f32 / 10.0 - 4.0;
                let contradiction = (hypothesis % 13) as f32 / 4.0 - 1.5;
                vec![entailment, 0.25, contradiction]
            })
            .collect())
    }
}

/// Returns the same logits for every row.
pub struct ConstantModel {
    pub row: Vec<f32>,
    pub layout: LabelLayout,
}

impl NliModel for ConstantModel {
    fn label_layout(&self) -> &LabelLayout {
        &self.layout
    }

    fn forward(&self, batch: &EncodedBatch) -> Result<Vec<Vec<f32>>> {
        Ok(vec![self.row.clone(); batch.len()])
    }
}

pub fn hash_pipeline() -> ZeroShotClassificationPipeline<HashNliModel, HashTokenizer> {
    hash_pipeline_with(ClassificationConfig::default(), 64)
}

pub fn hash_pipeline_with(
    config: ClassificationConfig,
    max_length: usize,
) -> ZeroShotClassificationPipeline<HashNliModel, HashTokenizer> {
    ZeroShotClassificationPipeline::from_parts(
        Arc::new(HashNliModel::default()),
        Arc::new(HashTokenizer { max_length }),
        config,
    )
    .unwrap()
}

pub fn constant_pipeline(row: Vec<f32>) -> ZeroShotClassificationPipeline<ConstantModel, HashTokenizer> {
    ZeroShotClassificationPipeline::from_parts(
        Arc::new(ConstantModel {
            row,
            layout: LabelLayout::CANONICAL,
        }),
        Arc::new(HashTokenizer { max_length: 64 }),
        ClassificationConfig::default(),
    )
    .unwrap()
}
