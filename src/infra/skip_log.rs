// ============================================================
// Layer 6: Skip Log
// ============================================================
// Records every example a run could not use, as CSV:
//
//   uid,reason,detail
//   q12,alias-exhausted,no alias of 'Napoleon' other than its own surface text
//   q40,schema-span-mismatch,"record 'q40': span (3, 9) reads 'ris is', expected 'Paris'"
//
// `reason` is the stable key from ExampleSkip::reason(), so the
// file can be grouped or filtered without parsing messages.
// Quoting of free-text details is left to the csv crate.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::domain::errors::ExampleSkip;

pub struct SkipLog {
    path: PathBuf,
    out:  csv::Writer<File>,
    rows: usize,
}

impl SkipLog {
    /// Create the CSV (truncating any earlier one) and write its header
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut out = csv::Writer::from_path(&path)
            .with_context(|| format!("Cannot create skip log '{}'", path.display()))?;
        out.write_record(["uid", "reason", "detail"])?;
        Ok(Self { path, out, rows: 0 })
    }

    pub fn record(&mut self, uid: &str, skip: &ExampleSkip) -> Result<()> {
        let detail = skip.to_string();
        self.out
            .write_record([uid, skip.reason(), detail.as_str()])
            .with_context(|| format!("Cannot append to skip log '{}'", self.path.display()))?;
        self.rows += 1;
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        tracing::debug!("Logged {} skipped examples to '{}'", self.rows, self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
