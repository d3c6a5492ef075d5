//! Pretrained sequence classifier consumed by the inference demo.
//!
//! The artifact is a safetensors file holding a token embedding table and a
//! linear classification head. Inference is a masked mean-pool over the
//! embeddings of the non-padding tokens followed by the head. Training the
//! artifact is out of scope; this module only loads and runs it.

use std::path::Path;

use ndarray::{Array1, Array2};
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};

use crate::error::{PipelineError, Result};

const EMBEDDINGS_TENSOR: &str = "embeddings.weight";
const HEAD_WEIGHT_TENSOR: &str = "classifier.weight";
const HEAD_BIAS_TENSOR: &str = "classifier.bias";

pub struct SequenceClassifier {
    /// [vocab, hidden]
    embeddings: Array2<f32>,
    /// [num_labels, hidden]
    head_weight: Array2<f32>,
    /// [num_labels]
    head_bias: Array1<f32>,
}

impl SequenceClassifier {
    /// Loads the classifier artifact from a safetensors file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        let tensors = SafeTensors::deserialize(&bytes)?;

        let embeddings = load_matrix(&tensors, EMBEDDINGS_TENSOR)?;
        let head_weight = load_matrix(&tensors, HEAD_WEIGHT_TENSOR)?;
        let head_bias = load_vector(&tensors, HEAD_BIAS_TENSOR)?;

        if head_weight.ncols() != embeddings.ncols() {
            return Err(PipelineError::Model(format!(
                "hidden-size mismatch: embeddings are {} wide, classifier head expects {}",
                embeddings.ncols(),
                head_weight.ncols()
            )));
        }
        if head_bias.len() != head_weight.nrows() {
            return Err(PipelineError::Model(format!(
                "classifier bias has {} entries for {} output labels",
                head_bias.len(),
                head_weight.nrows()
            )));
        }

        Ok(Self { embeddings, head_weight, head_bias })
    }

    /// Builds a classifier from in-memory weights. Used by tests and tools
    /// that generate artifacts.
    pub fn from_parts(
        embeddings: Array2<f32>,
        head_weight: Array2<f32>,
        head_bias: Array1<f32>,
    ) -> Self {
        Self { embeddings, head_weight, head_bias }
    }

    pub fn num_labels(&self) -> usize {
        self.head_weight.nrows()
    }

    /// Raw logits for one encoded sequence. Padding positions (mask 0) do
    /// not contribute to the pooled representation.
    pub fn logits(&self, ids: &[u32], mask: &[u32]) -> Result<Array1<f32>> {
        let mut pooled = Array1::<f32>::zeros(self.embeddings.ncols());
        let mut count = 0usize;
        for (&id, &m) in ids.iter().zip(mask) {
            if m == 0 {
                continue;
            }
            let row = id as usize;
            if row >= self.embeddings.nrows() {
                return Err(PipelineError::Model(format!(
                    "token id {id} out of range for vocabulary of {}",
                    self.embeddings.nrows()
                )));
            }
            pooled += &self.embeddings.row(row);
            count += 1;
        }
        if count > 0 {
            pooled /= count as f32;
        }
        Ok(self.head_weight.dot(&pooled) + &self.head_bias)
    }

    /// Predicted label index and the full probability distribution.
    pub fn predict(&self, ids: &[u32], mask: &[u32]) -> Result<(usize, Vec<f32>)> {
        let probs = softmax(&self.logits(ids, mask)?);
        let label = probs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .ok_or_else(|| PipelineError::Model("empty logits".to_string()))?;
        Ok((label, probs.to_vec()))
    }
}

/// Numerically-stable softmax: subtract the max logit before exponentiating,
/// then normalize by the sum.
pub fn softmax(logits: &Array1<f32>) -> Array1<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp = logits.mapv(|x| (x - max).exp());
    let sum = exp.sum();
    exp / sum
}

fn load_matrix(tensors: &SafeTensors, name: &str) -> Result<Array2<f32>> {
    let view = tensor(tensors, name)?;
    let shape = view.shape();
    if shape.len() != 2 {
        return Err(PipelineError::Model(format!(
            "tensor '{name}' has shape {shape:?}, expected a matrix"
        )));
    }
    let data = tensor_f32(&view, name)?;
    Array2::from_shape_vec((shape[0], shape[1]), data)
        .map_err(|e| PipelineError::Model(format!("tensor '{name}': {e}")))
}

fn load_vector(tensors: &SafeTensors, name: &str) -> Result<Array1<f32>> {
    let view = tensor(tensors, name)?;
    let shape = view.shape();
    if shape.len() != 1 {
        return Err(PipelineError::Model(format!(
            "tensor '{name}' has shape {shape:?}, expected a vector"
        )));
    }
    Ok(Array1::from_vec(tensor_f32(&view, name)?))
}

fn tensor<'a>(tensors: &'a SafeTensors, name: &str) -> Result<TensorView<'a>> {
    tensors
        .tensor(name)
        .map_err(|e| PipelineError::Model(format!("tensor '{name}' not found: {e}")))
}

fn tensor_f32(view: &TensorView<'_>, name: &str) -> Result<Vec<f32>> {
    if view.dtype() != Dtype::F32 {
        return Err(PipelineError::Model(format!(
            "tensor '{name}' has dtype {:?}, expected F32",
            view.dtype()
        )));
    }
    // pod_collect_to_vec copies, which sidesteps alignment of the raw byte
    // buffer inside the safetensors file.
    Ok(bytemuck::pod_collect_to_vec(view.data()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn toy_classifier() -> SequenceClassifier {
        // vocab 4, hidden 2, labels 2. Token 1 pulls toward label 1,
        // token 2 toward label 0.
        let embeddings = array![
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [0.5, 0.5],
        ];
        let head_weight = array![[0.0, 2.0], [2.0, 0.0]];
        let head_bias = array![0.0, 0.0];
        SequenceClassifier::from_parts(embeddings, head_weight, head_bias)
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let probs = softmax(&array![1000.0, 999.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert_abs_diff_eq!(probs.sum(), 1.0, epsilon = 1e-6);
        assert!(probs[0] > probs[1]);
    }

    #[test]
    fn masked_positions_are_ignored() {
        let model = toy_classifier();
        // Second position is padding; only token 1 counts.
        let with_pad = model.logits(&[1, 2], &[1, 0]).unwrap();
        let without = model.logits(&[1], &[1]).unwrap();
        assert_abs_diff_eq!(with_pad[0], without[0], epsilon = 1e-6);
        assert_abs_diff_eq!(with_pad[1], without[1], epsilon = 1e-6);
    }

    #[test]
    fn predicts_the_dominant_class() {
        let model = toy_classifier();
        let (label, probs) = model.predict(&[1, 1, 2], &[1, 1, 1]).unwrap();
        assert_eq!(label, 1);
        assert_eq!(probs.len(), 2);
        assert_abs_diff_eq!(probs.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn out_of_vocabulary_id_is_an_error() {
        let model = toy_classifier();
        let err = model.logits(&[99], &[1]).unwrap_err();
        assert!(matches!(err, PipelineError::Model(_)));
    }

    #[test]
    fn load_roundtrip_through_safetensors() {
        use crate::test_support::write_test_model;

        let dir = tempfile::tempdir().unwrap();
        let path = write_test_model(dir.path());
        let model = SequenceClassifier::load(&path).unwrap();
        assert_eq!(model.num_labels(), 2);

        let (label, probs) = model.predict(&[1], &[1]).unwrap();
        assert_eq!(probs.len(), 2);
        assert!(label < 2);
    }
}
