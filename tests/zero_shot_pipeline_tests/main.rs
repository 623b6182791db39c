// Integration tests for the zero-shot classification pipeline.
// This is a separate crate that tests the public API.

mod common;

mod hf_tokenizer;
mod pipeline_properties;
mod reference_models;
