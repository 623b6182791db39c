pub mod deberta_v2;
pub mod modernbert;
pub mod xlm_roberta;

pub use deberta_v2::DebertaV2NliModel;
pub use modernbert::ModernBertNliModel;
pub use xlm_roberta::XlmRobertaNliModel;

use crate::core::Result;
use crate::pipelines::zero_shot::EncodedBatch;
use candle_core::{Device, Tensor};

/// `(batch, seq_len)` u32 tensors for one padded batch.
pub(crate) struct BatchTensors {
    pub input_ids: Tensor,
    pub attention_mask: Tensor,
    pub type_ids: Tensor,
}

pub(crate) fn batch_tensors(batch: &EncodedBatch, device: &Device) -> Result<BatchTensors> {
    let padded = batch.padded();
    let shape = (padded.rows, padded.cols);
    Ok(BatchTensors {
        input_ids: Tensor::from_vec(padded.input_ids, shape, device)?,
        attention_mask: Tensor::from_vec(padded.attention_mask, shape, device)?,
        type_ids: Tensor::from_vec(padded.type_ids, shape, device)?,
    })
}
