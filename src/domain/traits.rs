// ============================================================
// Layer 3: Core Traits
// ============================================================
// The application layer reads examples from a source and
// writes substituted examples to a sink. It never knows the
// file format behind either side.
//
// Implementations:
//   - JsonlExampleLoader  → ExampleSource over a .jsonl file
//   - JsonlExampleWriter  → ExampleSink to a .jsonl file
//   - Vec<QaExample>      → both, for tests
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::errors::SchemaError;
use crate::domain::qa_example::QaExample;

/// Outcome of reading one record: a usable example, or the
/// schema problem that makes it unusable.
pub type LoadedRecord = std::result::Result<QaExample, SchemaError>;

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Anything that can produce the examples of one dataset.
///
/// Fatal problems (missing file, unreadable bytes) are the outer
/// error. Per-record problems are returned inline so the caller
/// can count and skip them.
pub trait ExampleSource {
    fn load_all(&self) -> Result<Vec<LoadedRecord>>;
}

impl ExampleSource for Vec<QaExample> {
    fn load_all(&self) -> Result<Vec<LoadedRecord>> {
        Ok(self.iter().cloned().map(Ok).collect())
    }
}

// ─── ExampleSink ──────────────────────────────────────────────────────────────
/// Anything that can receive finished examples, one at a time.
///
/// Each write is a complete record, so output written before
/// an interruption stays valid.
pub trait ExampleSink {
    fn write(&mut self, example: &QaExample) -> Result<()>;

    /// Flush buffered records. Default: nothing to flush.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl ExampleSink for Vec<QaExample> {
    fn write(&mut self, example: &QaExample) -> Result<()> {
        self.push(example.clone());
        Ok(())
    }
}
