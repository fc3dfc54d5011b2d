//! JSON export: a pretty-printed array of records.

use super::{ensure_parent, ExportOutcome, Exporter};
use crate::error::{Result, ScrapeError};
use crate::model::SalesRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn export(&self, records: &[SalesRecord], path: &Path) -> Result<ExportOutcome> {
        if records.is_empty() {
            info!("no records to save, skipping {}", path.display());
            return Ok(ExportOutcome::Skipped);
        }
        ensure_parent(path)?;

        let export_err = |reason: String| ScrapeError::Export {
            path: path.to_path_buf(),
            reason,
        };
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, records).map_err(|e| export_err(e.to_string()))?;
        out.flush()?;

        info!("saved {} records to {}", records.len(), path.display());
        Ok(ExportOutcome::Written { rows: records.len() })
    }
}
