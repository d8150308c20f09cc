// ============================================================
// Layer 6: Run Summary
// ============================================================
// Counters for one generation run, printed at the end:
//
//   Examples read:           1000
//   Filtered by category:     212
//   Substituted:              701  (1402 records written)
//   Skipped:                   87
//     alias-exhausted          80
//     schema-span-mismatch      7
//
// Filtered examples are NOT failures: the policy was simply
// not asked to handle their answer type.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub examples_read:      usize,
    pub filtered:           usize,
    /// Originals that produced at least one substitute
    pub substituted:        usize,
    pub records_written:    usize,
    pub skipped_by_reason:  BTreeMap<String, usize>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&mut self, reason: &str) {
        *self.skipped_by_reason.entry(reason.to_string()).or_default() += 1;
    }

    pub fn skipped(&self) -> usize {
        self.skipped_by_reason.values().sum()
    }

    pub fn report(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "Examples read:        {:>8}", self.examples_read);
        let _ = writeln!(s, "Filtered by category: {:>8}", self.filtered);
        let _ = writeln!(
            s,
            "Substituted:          {:>8}  ({} records written)",
            self.substituted, self.records_written
        );
        let _ = writeln!(s, "Skipped:              {:>8}", self.skipped());
        for (reason, n) in &self.skipped_by_reason {
            let _ = writeln!(s, "  {:<26}{:>6}", reason, n);
        }
        s
    }
}
