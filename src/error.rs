use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the data-preparation pipeline and the inference demo.
///
/// Loading and labeling failures are coarse-grained on purpose: the CLI
/// aborts the whole run on any of these. Row-level problems (missing SMILES
/// or identifier) are not errors at all; those rows are dropped and counted.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("missing required key(s) in batch: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),

    #[error("requested {requested} negative samples but only {available} are available")]
    NotEnoughNegatives { requested: usize, available: usize },

    #[error("test_size must be in (0, 1), got {0}")]
    InvalidTestSize(f64),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<tokenizers::Error> for PipelineError {
    fn from(err: tokenizers::Error) -> Self {
        PipelineError::Tokenizer(err.to_string())
    }
}

impl From<safetensors::SafeTensorError> for PipelineError {
    fn from(err: safetensors::SafeTensorError) -> Self {
        PipelineError::Model(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
