//! Writing aggregated records to disk.
//!
//! Exporters never create a file for an empty record list; they log and
//! report [`ExportOutcome::Skipped`] instead.

pub mod json;
pub mod xlsx;

use crate::error::{Result, ScrapeError};
use crate::model::{RankingKind, SalesRecord};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { rows: usize },
    Skipped,
}

pub trait Exporter {
    fn export(&self, records: &[SalesRecord], path: &Path) -> Result<ExportOutcome>;
}

pub fn exporter_for(format: ExportFormat, kind: RankingKind) -> Box<dyn Exporter> {
    match format {
        ExportFormat::Xlsx => Box::new(xlsx::XlsxExporter::new(kind)),
        ExportFormat::Json => Box::new(json::JsonExporter),
    }
}

/// Create the parent directory of `path` if needed.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ScrapeError::Export {
            path: path.to_path_buf(),
            reason: format!("creating {}: {e}", parent.display()),
        })?;
    }
    Ok(())
}
