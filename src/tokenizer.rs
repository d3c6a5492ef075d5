//! Adapter around a pretrained HF tokenizer for SMILES batches.
//!
//! Mirrors how the training side consumes data: a batch of SMILES strings
//! plus their labels goes in, fixed-length token ids and attention masks plus
//! the labels come out. Padding and truncation are pinned to `max_length` so
//! every encoded sequence has exactly that length.

use std::path::Path;

use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::error::{PipelineError, Result};
use crate::labeler::{LABEL_COLUMN, SMILES_COLUMN};

/// Fixed sequence length used by the classifier.
pub const MAX_LENGTH: usize = 512;

/// A column-oriented batch as read from the labeled dataset. Either column
/// may be absent; the adapter reports absences by name.
#[derive(Debug, Default)]
pub struct LabeledBatch {
    pub smiles: Option<Vec<String>>,
    pub labels: Option<Vec<u8>>,
}

/// Model-ready encoded batch.
#[derive(Debug)]
pub struct EncodedBatch {
    pub input_ids: Vec<Vec<u32>>,
    pub attention_mask: Vec<Vec<u32>>,
    pub labels: Vec<u8>,
}

pub struct TokenizerAdapter {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl TokenizerAdapter {
    /// Loads a `tokenizer.json` and pins padding and truncation to
    /// `max_length`.
    pub fn from_file(path: &Path, max_length: usize) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }
        let mut tokenizer = Tokenizer::from_file(path).map_err(|e| {
            PipelineError::Tokenizer(format!("failed to load {}: {e}", path.display()))
        })?;

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_length),
            ..PaddingParams::default()
        }));
        tokenizer.with_truncation(Some(TruncationParams {
            max_length,
            ..TruncationParams::default()
        }))?;

        Ok(Self { tokenizer, max_length })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Encodes a labeled batch. Fails, naming the missing column(s), if the
    /// SMILES or label column is absent.
    pub fn tokenize_batch(&self, entries: &LabeledBatch) -> Result<EncodedBatch> {
        let mut missing = Vec::new();
        if entries.smiles.is_none() {
            missing.push(SMILES_COLUMN);
        }
        if entries.labels.is_none() {
            missing.push(LABEL_COLUMN);
        }
        if !missing.is_empty() {
            return Err(PipelineError::MissingKeys(missing));
        }

        let smiles = entries.smiles.as_ref().unwrap();
        let labels = entries.labels.as_ref().unwrap();

        let encodings = self.tokenizer.encode_batch(smiles.clone(), true)?;

        let mut input_ids = Vec::with_capacity(encodings.len());
        let mut attention_mask = Vec::with_capacity(encodings.len());
        for encoding in &encodings {
            input_ids.push(encoding.get_ids().to_vec());
            attention_mask.push(encoding.get_attention_mask().to_vec());
        }

        Ok(EncodedBatch {
            input_ids,
            attention_mask,
            labels: labels.clone(),
        })
    }

    /// Encodes one SMILES string for the inference path.
    pub fn encode_one(&self, text: &str) -> Result<(Vec<u32>, Vec<u32>)> {
        let encoding = self.tokenizer.encode(text, true)?;
        Ok((
            encoding.get_ids().to_vec(),
            encoding.get_attention_mask().to_vec(),
        ))
    }
}
