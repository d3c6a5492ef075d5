use std::path::Path;

use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::tokenizer::MAX_LENGTH;

/// Configuration for the inference demo, read from the `config.json` that
/// sits next to the model artifact.
#[derive(Deserialize, Debug, Clone)]
pub struct ClassifierConfig {
    /// Class names indexed by label id. Index 1 is the positive
    /// (natural-product) class.
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
    /// Sequence length the tokenizer pads and truncates to.
    #[serde(default = "default_max_length", alias = "max_position_embeddings")]
    pub max_length: usize,
}

fn default_labels() -> Vec<String> {
    vec!["Unnatural".to_string(), "Natural".to_string()]
}

fn default_max_length() -> usize {
    MAX_LENGTH
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            labels: default_labels(),
            max_length: default_max_length(),
        }
    }
}

impl ClassifierConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: ClassifierConfig = serde_json::from_str(&contents).map_err(|e| {
            PipelineError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        if config.labels.len() != 2 {
            return Err(PipelineError::Config(format!(
                "expected 2 class labels, got {}",
                config.labels.len()
            )));
        }
        Ok(config)
    }
}
