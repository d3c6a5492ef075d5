//! Class-balanced train/test splitting of the labeled dataset.
//!
//! The labeled file is small enough to load fully. Positives are all kept,
//! negatives are downsampled to floor(1.5 x positives) without replacement,
//! and the balanced pool is shuffled and partitioned by the test fraction.
//! Everything is driven by a single seeded RNG, so a given (input, seed)
//! pair always produces the same two files.

use std::path::Path;

use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{PipelineError, Result};
use crate::labeler::{LABEL_COLUMN, SMILES_COLUMN};

/// Ratio of sampled negatives to positives in the balanced pool.
const NEGATIVE_RATIO: f64 = 1.5;

/// Sizes reported after a split run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitStats {
    pub positives: usize,
    pub sampled_negatives: usize,
    pub train: usize,
    pub test: usize,
}

/// One row of the labeled dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledRow {
    pub smiles: String,
    pub label: u8,
}

/// Reads a labeled TSV produced by the labeler into memory.
pub fn load_labeled(path: &Path) -> Result<Vec<LabeledRow>> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new().delimiter(b'\t').from_path(path)?;
    let headers = reader.headers()?;
    let smiles_idx = headers
        .iter()
        .position(|h| h == SMILES_COLUMN)
        .ok_or_else(|| PipelineError::MissingColumn {
            column: SMILES_COLUMN.to_string(),
            path: path.to_path_buf(),
        })?;
    let label_idx = headers
        .iter()
        .position(|h| h == LABEL_COLUMN)
        .ok_or_else(|| PipelineError::MissingColumn {
            column: LABEL_COLUMN.to_string(),
            path: path.to_path_buf(),
        })?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let smiles = record.get(smiles_idx).unwrap_or("").to_string();
        let label = match record.get(label_idx).unwrap_or("").trim() {
            "1" => 1,
            _ => 0,
        };
        rows.push(LabeledRow { smiles, label });
    }
    Ok(rows)
}

/// Builds the balanced pool and the seeded train/test partition in memory.
///
/// Returned vectors are disjoint and together contain exactly the balanced
/// pool. Test length is floor(test_size x pool).
pub fn balanced_split(
    rows: &[LabeledRow],
    test_size: f64,
    seed: u64,
) -> Result<(Vec<LabeledRow>, Vec<LabeledRow>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidTestSize(test_size));
    }

    let positives: Vec<LabeledRow> =
        rows.iter().filter(|r| r.label == 1).cloned().collect();
    let negatives: Vec<LabeledRow> =
        rows.iter().filter(|r| r.label == 0).cloned().collect();

    let wanted = (NEGATIVE_RATIO * positives.len() as f64).floor() as usize;
    if wanted > negatives.len() {
        return Err(PipelineError::NotEnoughNegatives {
            requested: wanted,
            available: negatives.len(),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);

    let sampled: Vec<LabeledRow> = {
        let mut indices: Vec<usize> = (0..negatives.len()).collect();
        indices.shuffle(&mut rng);
        indices.truncate(wanted);
        indices.into_iter().map(|i| negatives[i].clone()).collect()
    };

    let mut pool: Vec<LabeledRow> = positives;
    pool.extend(sampled);
    pool.shuffle(&mut rng);

    let test_len = (test_size * pool.len() as f64).floor() as usize;
    let train = pool.split_off(test_len);
    let test = pool;
    Ok((train, test))
}

/// Loads `input`, performs the balanced seeded split, and writes the train
/// and test TSVs with the labeled schema.
pub fn prepare_train_test(
    input: &Path,
    train_output: &Path,
    test_output: &Path,
    test_size: f64,
    seed: u64,
) -> Result<SplitStats> {
    let rows = load_labeled(input)?;
    let positives = rows.iter().filter(|r| r.label == 1).count();

    let (train, test) = balanced_split(&rows, test_size, seed)?;
    write_labeled(train_output, &train)?;
    write_labeled(test_output, &test)?;

    let stats = SplitStats {
        positives,
        sampled_negatives: train.len() + test.len() - positives,
        train: train.len(),
        test: test.len(),
    };
    info!(
        "split {}: {} positives, {} sampled negatives, {} train, {} test",
        input.display(),
        stats.positives,
        stats.sampled_negatives,
        stats.train,
        stats.test
    );
    Ok(stats)
}

fn write_labeled(path: &Path, rows: &[LabeledRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    writer.write_record([SMILES_COLUMN, LABEL_COLUMN])?;
    for row in rows {
        writer.write_record([row.smiles.as_str(), if row.label == 1 { "1" } else { "0" }])?;
    }
    writer.flush()?;
    Ok(())
}
