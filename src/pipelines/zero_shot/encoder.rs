use super::hypothesis::HypothesisPair;
use crate::core::{Result, ZeroShotError};
use tokenizers::Tokenizer;

/// Token ids for one (premise, hypothesis) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPair {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub type_ids: Vec<u32>,
}

impl EncodedPair {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// Tokenizer collaborator: encodes a premise together with a hypothesis.
pub trait PairTokenizer {
    fn encode_pair(&self, premise: &str, hypothesis: &str) -> Result<EncodedPair>;

    /// Token id used to right-pad shorter pairs in a batch.
    fn pad_id(&self) -> u32;
}

/// Encoded pairs in candidate-label order. Row `i` belongs to label `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBatch {
    pairs: Vec<EncodedPair>,
    pad_id: u32,
}

/// Row-major `rows x cols` matrices, right-padded to the longest pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedBatch {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub type_ids: Vec<u32>,
    pub rows: usize,
    pub cols: usize,
}

impl EncodedBatch {
    pub fn new(pairs: Vec<EncodedPair>, pad_id: u32) -> Self {
        Self { pairs, pad_id }
    }

    pub fn pairs(&self) -> &[EncodedPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.pairs.iter().map(EncodedPair::len).max().unwrap_or(0)
    }

    pub fn padded(&self) -> PaddedBatch {
        let rows = self.pairs.len();
        let cols = self.max_len();
        let mut input_ids = Vec::with_capacity(rows * cols);
        let mut attention_mask = Vec::with_capacity(rows * cols);
        let mut type_ids = Vec::with_capacity(rows * cols);

        for pair in &self.pairs {
            let pad = cols - pair.len();
            input_ids.extend_from_slice(&pair.input_ids);
            input_ids.extend(std::iter::repeat(self.pad_id).take(pad));
            attention_mask.extend_from_slice(&pair.attention_mask);
            attention_mask.extend(std::iter::repeat(0).take(pad));
            type_ids.extend_from_slice(&pair.type_ids);
            type_ids.extend(std::iter::repeat(0).take(pad));
        }

        PaddedBatch {
            input_ids,
            attention_mask,
            type_ids,
            rows,
            cols,
        }
    }
}

/// Tokenizes every hypothesis pair of a request into one batch.
pub struct PairEncoder<'a, T: PairTokenizer + ?Sized> {
    tokenizer: &'a T,
}

impl<'a, T: PairTokenizer + ?Sized> PairEncoder<'a, T> {
    pub fn new(tokenizer: &'a T) -> Self {
        Self { tokenizer }
    }

    /// Fails on the first pair the tokenizer rejects, reporting its position.
    pub fn encode(&self, pairs: &[HypothesisPair]) -> Result<EncodedBatch> {
        let encoded = pairs
            .iter()
            .enumerate()
            .map(|(index, pair)| {
                let encoded = self
                    .tokenizer
                    .encode_pair(&pair.premise, &pair.hypothesis)
                    .map_err(|e| ZeroShotError::Encoding {
                        index,
                        message: e.to_string(),
                    })?;
                let len = encoded.input_ids.len();
                if encoded.attention_mask.len() != len || encoded.type_ids.len() != len {
                    return Err(ZeroShotError::Encoding {
                        index,
                        message: format!(
                            "ragged encoding: {len} ids, {} mask entries, {} type ids",
                            encoded.attention_mask.len(),
                            encoded.type_ids.len()
                        ),
                    });
                }
                Ok(encoded)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(EncodedBatch::new(encoded, self.tokenizer.pad_id()))
    }
}

/// [`PairTokenizer`] over a Hugging Face tokenizer.
///
/// Truncation and padding configured in `tokenizer.json` are switched off:
/// an over-long pair is an error, and padding happens per batch.
#[derive(Clone)]
pub struct HfPairTokenizer {
    tokenizer: Tokenizer,
    max_length: usize,
    pad_id: u32,
}

impl HfPairTokenizer {
    pub fn new(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        let pad_id = tokenizer
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| tokenizer.token_to_id("<pad>"))
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .unwrap_or(0);

        tokenizer
            .with_truncation(None)
            .map_err(|e| ZeroShotError::Tokenizer(format!("Failed to disable truncation: {e}")))?;
        tokenizer.with_padding(None);

        Ok(Self {
            tokenizer,
            max_length,
            pad_id,
        })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }
}

impl PairTokenizer for HfPairTokenizer {
    fn encode_pair(&self, premise: &str, hypothesis: &str) -> Result<EncodedPair> {
        let encoding = self
            .tokenizer
            .encode((premise, hypothesis), true)
            .map_err(|e| ZeroShotError::Tokenizer(format!("Tokenization error: {e}")))?;

        if encoding.len() > self.max_length {
            return Err(ZeroShotError::Tokenizer(format!(
                "pair is {} tokens long, the maximum is {}",
                encoding.len(),
                self.max_length
            )));
        }

        Ok(EncodedPair {
            input_ids: encoding.get_ids().to_vec(),
            attention_mask: encoding.get_attention_mask().to_vec(),
            type_ids: encoding.get_type_ids().to_vec(),
        })
    }

    fn pad_id(&self) -> u32 {
        self.pad_id
    }
}
