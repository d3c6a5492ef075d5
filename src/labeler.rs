//! Marks candidate molecules as natural or synthetic.
//!
//! The candidate table is a ChEMBL small-molecule TSV export, typically far
//! too large to hold in memory. Rows are streamed in fixed-size batches and
//! joined against the natural-product identifier set by exact (uppercased)
//! InChIKey match. The output keeps only the SMILES string and the binary
//! label, in input order, with the header written exactly once.

use std::collections::HashSet;
use std::path::Path;

use log::info;

use crate::error::{PipelineError, Result};

/// Header of the SMILES column in the candidate table.
pub const SMILES_COLUMN: &str = "Smiles";
/// Header of the identifier column in the candidate table.
pub const CANDIDATE_KEY_COLUMN: &str = "Inchi Key";
/// Header of the label column in the output table.
pub const LABEL_COLUMN: &str = "Is_Nature_Product";

/// Default number of rows processed per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Progress is logged every this many processed input rows.
const PROGRESS_INTERVAL: usize = 50_000;

/// Counters reported after a labeling run.
///
/// `natural` and `non_natural` accumulate per-batch counts. The original
/// reporting added the running total instead of the batch count for the
/// non-natural tally, which double-counted across batches; the per-batch
/// accumulation here is the corrected semantics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LabelStats {
    /// Input rows read, including dropped ones.
    pub processed: usize,
    /// Rows written to the output.
    pub written: usize,
    /// Rows labeled 1.
    pub natural: usize,
    /// Rows labeled 0.
    pub non_natural: usize,
    /// Rows dropped for a missing SMILES or identifier.
    pub dropped: usize,
}

/// Streams the candidate table at `candidates`, labels each row against
/// `natural_keys`, and writes `(Smiles, Is_Nature_Product)` rows to `output`.
///
/// Rows missing the SMILES string or the identifier are dropped. Batches are
/// processed strictly in input order; re-running on the same inputs produces
/// byte-identical output.
pub fn mark_candidates(
    candidates: &Path,
    natural_keys: &HashSet<String>,
    output: &Path,
    batch_size: usize,
) -> Result<LabelStats> {
    if !candidates.exists() {
        return Err(PipelineError::FileNotFound(candidates.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(candidates)?;

    let headers = reader.headers()?;
    let smiles_idx = column_index(headers, SMILES_COLUMN, candidates)?;
    let key_idx = column_index(headers, CANDIDATE_KEY_COLUMN, candidates)?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(output)?;
    writer.write_record([SMILES_COLUMN, LABEL_COLUMN])?;

    let mut stats = LabelStats::default();
    let mut batch: Vec<(String, String)> = Vec::with_capacity(batch_size);
    let mut next_progress = PROGRESS_INTERVAL;

    for record in reader.records() {
        let record = record?;
        stats.processed += 1;

        let smiles = record.get(smiles_idx).unwrap_or("").trim();
        let key = record.get(key_idx).unwrap_or("").trim();
        if smiles.is_empty() || key.is_empty() {
            stats.dropped += 1;
        } else {
            batch.push((smiles.to_string(), key.to_string()));
        }

        if batch.len() >= batch_size {
            flush_batch(&mut writer, &mut batch, natural_keys, &mut stats)?;
        }

        if stats.processed >= next_progress {
            info!(
                "processed {} molecules, found {} natural molecules so far",
                stats.processed, stats.natural
            );
            next_progress += PROGRESS_INTERVAL;
        }
    }
    flush_batch(&mut writer, &mut batch, natural_keys, &mut stats)?;
    writer.flush()?;

    info!(
        "labeling finished: {} processed, {} written, {} natural, {} non-natural, {} dropped",
        stats.processed, stats.written, stats.natural, stats.non_natural, stats.dropped
    );
    Ok(stats)
}

fn column_index(headers: &csv::StringRecord, column: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| PipelineError::MissingColumn {
            column: column.to_string(),
            path: path.to_path_buf(),
        })
}

fn flush_batch(
    writer: &mut csv::Writer<std::fs::File>,
    batch: &mut Vec<(String, String)>,
    natural_keys: &HashSet<String>,
    stats: &mut LabelStats,
) -> Result<()> {
    for (smiles, key) in batch.drain(..) {
        let label = if natural_keys.contains(&key.to_ascii_uppercase()) {
            stats.natural += 1;
            "1"
        } else {
            stats.non_natural += 1;
            "0"
        };
        writer.write_record([smiles.as_str(), label])?;
        stats.written += 1;
    }
    Ok(())
}
