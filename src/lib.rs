//! Data preparation and inference demo for a natural-product SMILES
//! classifier.
//!
//! The pipeline labels a large candidate table (ChEMBL export) against a
//! reference set of natural-product identifiers (NPAtlas export), builds a
//! class-balanced train/test split, and adapts the labeled data for a
//! pretrained HF tokenizer. The demo loads a pretrained classifier artifact
//! and serves single-molecule predictions over HTTP.

pub mod cli;
pub mod config;
pub mod depict;
pub mod error;
pub mod identifiers;
pub mod labeler;
pub mod model;
pub mod split;
pub mod tokenizer;
pub mod ui;

/// Shared fixtures for unit and integration tests.
#[cfg(test)]
pub mod test_support {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use ndarray::array;
    use safetensors::tensor::TensorView;
    use safetensors::{serialize, Dtype};

    use crate::model::SequenceClassifier;

    /// Writes a minimal whitespace WordLevel tokenizer and returns its path.
    /// Vocabulary: `[PAD]`=0, `[UNK]`=1, `C`=2, `O`=3, `N`=4.
    pub fn write_test_tokenizer(dir: &Path) -> PathBuf {
        let path = dir.join("tokenizer.json");
        let contents = r#"{
  "version": "1.0",
  "truncation": null,
  "padding": null,
  "added_tokens": [],
  "normalizer": null,
  "pre_tokenizer": { "type": "Whitespace" },
  "post_processor": null,
  "decoder": null,
  "model": {
    "type": "WordLevel",
    "vocab": { "[PAD]": 0, "[UNK]": 1, "C": 2, "O": 3, "N": 4 },
    "unk_token": "[UNK]"
  }
}"#;
        std::fs::write(&path, contents).expect("write test tokenizer");
        path
    }

    /// A tiny classifier over the test tokenizer's vocabulary.
    pub fn test_classifier() -> SequenceClassifier {
        let embeddings = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [1.0, 0.0],
            [0.0, 1.0],
            [0.5, 0.5],
        ];
        let head_weight = array![[1.0, -1.0], [-1.0, 1.0]];
        let head_bias = array![0.0, 0.0];
        SequenceClassifier::from_parts(embeddings, head_weight, head_bias)
    }

    /// Serializes the test classifier to `model.safetensors` in `dir`.
    pub fn write_test_model(dir: &Path) -> PathBuf {
        let path = dir.join("model.safetensors");

        let embeddings: Vec<f32> =
            vec![0.0, 0.0, 0.1, 0.1, 1.0, 0.0, 0.0, 1.0, 0.5, 0.5];
        let head_weight: Vec<f32> = vec![1.0, -1.0, -1.0, 1.0];
        let head_bias: Vec<f32> = vec![0.0, 0.0];

        let mut tensors = HashMap::new();
        tensors.insert(
            "embeddings.weight".to_string(),
            TensorView::new(Dtype::F32, vec![5, 2], bytemuck::cast_slice(&embeddings))
                .expect("embeddings view"),
        );
        tensors.insert(
            "classifier.weight".to_string(),
            TensorView::new(Dtype::F32, vec![2, 2], bytemuck::cast_slice(&head_weight))
                .expect("weight view"),
        );
        tensors.insert(
            "classifier.bias".to_string(),
            TensorView::new(Dtype::F32, vec![2], bytemuck::cast_slice(&head_bias))
                .expect("bias view"),
        );

        let bytes = serialize(&tensors, &None).expect("serialize test model");
        std::fs::write(&path, bytes).expect("write test model");
        path
    }
}
