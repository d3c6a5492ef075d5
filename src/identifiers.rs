//! Loads the reference set of known natural-product identifiers.
//!
//! The reference table is an NPAtlas TSV export. Only the
//! `compound_inchikey` column is consumed; every other column is ignored.

use std::collections::HashSet;
use std::path::Path;

use log::info;

use crate::error::{PipelineError, Result};

/// Header of the identifier column in the reference table.
pub const INCHIKEY_COLUMN: &str = "compound_inchikey";

/// Reads the reference table at `path` and returns the set of normalized
/// (trimmed, uppercased, non-empty) InChIKeys it contains.
///
/// Fails if the file cannot be opened or parsed, or if the
/// `compound_inchikey` column is absent.
pub fn load_natural_identifiers(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)?;

    let key_idx = reader
        .headers()?
        .iter()
        .position(|h| h == INCHIKEY_COLUMN)
        .ok_or_else(|| PipelineError::MissingColumn {
            column: INCHIKEY_COLUMN.to_string(),
            path: path.to_path_buf(),
        })?;

    let mut keys = HashSet::new();
    for record in reader.records() {
        let record = record?;
        let raw = record.get(key_idx).unwrap_or("").trim();
        if raw.is_empty() {
            continue;
        }
        keys.insert(raw.to_ascii_uppercase());
    }

    info!(
        "loaded {} unique natural-product identifiers from {}",
        keys.len(),
        path.display()
    );
    Ok(keys)
}
