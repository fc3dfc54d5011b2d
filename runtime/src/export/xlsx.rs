//! Spreadsheet export: one named sheet, a header row, one row per record.

use super::{ensure_parent, ExportOutcome, Exporter};
use crate::error::{Result, ScrapeError};
use crate::model::{RankingKind, SalesRecord};
use rust_xlsxwriter::{Workbook, XlsxError};
use std::path::Path;
use tracing::info;

pub struct XlsxExporter {
    kind: RankingKind,
}

impl XlsxExporter {
    pub fn new(kind: RankingKind) -> Self {
        Self { kind }
    }

    /// `[date, rank, label, value]`, in the board's language.
    pub fn headers(&self) -> [&'static str; 4] {
        ["日期", "排名", self.kind.label_header(), "销量"]
    }

    fn write(&self, records: &[SalesRecord], path: &Path) -> Result<(), XlsxError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(self.kind.sheet_name())?;

        for (col, header) in self.headers().iter().enumerate() {
            sheet.write_string(0, col as u16, *header)?;
        }
        for (i, record) in records.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, record.period.as_str())?;
            sheet.write_number(row, 1, f64::from(record.rank))?;
            sheet.write_string(row, 2, &record.label)?;
            sheet.write_number(row, 3, record.value as f64)?;
        }

        workbook.save(path)
    }
}

impl Exporter for XlsxExporter {
    fn export(&self, records: &[SalesRecord], path: &Path) -> Result<ExportOutcome> {
        if records.is_empty() {
            info!("no records to save, skipping {}", path.display());
            return Ok(ExportOutcome::Skipped);
        }
        ensure_parent(path)?;
        self.write(records, path).map_err(|e| ScrapeError::Export {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!("saved {} rows to {}", records.len(), path.display());
        Ok(ExportOutcome::Written { rows: records.len() })
    }
}
