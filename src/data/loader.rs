// ============================================================
// Layer 4: Example Loader
// ============================================================
// Reads a QA dataset stored as JSON Lines, one example per
// line:
//
//   {"dataset": "NaturalQuestions"}                 ← optional header
//   {"uid": "q1", "query": "...", "context": "...",
//    "gold_answers": [{"text": "Paris", "spans": [[0,5]], ...}]}
//   ...
//
// Two kinds of bad input, handled differently:
//   - The file is missing, or a line is not JSON at all:
//     the dataset is corrupt, loading fails as a whole
//     (DataLoadError).
//   - A line is JSON but not a usable example (no context,
//     a span that does not read its answer): that one record
//     becomes a SchemaError and the caller skips it.
//
// Field names from common QA dumps are accepted as aliases
// ("qid", "question", "answers").
//
// Reference: Rust Book §9 (Error Handling)
//            JSON Lines format (jsonlines.org)

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::domain::errors::{DataLoadError, SchemaError};
use crate::domain::qa_example::{Answer, QaExample, SubstitutionInfo};
use crate::domain::traits::{ExampleSource, LoadedRecord};

/// Loose view of one input line, before required fields are checked
#[derive(Debug, Deserialize)]
struct RawExample {
    #[serde(alias = "qid", alias = "id")]
    uid:          Option<String>,
    #[serde(alias = "question")]
    query:        Option<String>,
    context:      Option<String>,
    #[serde(alias = "answers")]
    gold_answers: Option<Vec<Answer>>,
    #[serde(default)]
    metadata:     BTreeMap<String, Value>,

    // Present when the file is itself generated output
    #[serde(default)]
    is_substitute:    bool,
    #[serde(default)]
    original_uid:     Option<String>,
    #[serde(default)]
    original_example: Option<Box<QaExample>>,
    #[serde(default)]
    substitution:     Option<SubstitutionInfo>,
}

/// Loads every example of one .jsonl file.
/// Implements the ExampleSource trait from Layer 3.
pub struct JsonlExampleLoader {
    path: PathBuf,
}

impl JsonlExampleLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read and parse every line. Fatal problems only.
    pub fn read(&self) -> Result<Vec<LoadedRecord>, DataLoadError> {
        if !self.path.exists() {
            return Err(DataLoadError::Missing { path: self.path.clone() });
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|source| DataLoadError::Io { path: self.path.clone(), source })?;

        let mut records = Vec::new();
        for (i, line) in raw.lines().enumerate() {
            let line_no = i + 1;
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|e| DataLoadError::Parse {
                path:    self.path.clone(),
                line:    line_no,
                message: e.to_string(),
            })?;

            if is_header(&value) {
                tracing::debug!("Skipping header line in '{}': {}", self.path.display(), line);
                continue;
            }
            records.push(parse_record(value, line_no));
        }

        if records.is_empty() {
            return Err(DataLoadError::Empty { path: self.path.clone() });
        }

        let bad = records.iter().filter(|r| r.is_err()).count();
        tracing::info!(
            "Loaded {} records from '{}' ({} unusable)",
            records.len(),
            self.path.display(),
            bad
        );
        Ok(records)
    }
}

impl ExampleSource for JsonlExampleLoader {
    fn load_all(&self) -> Result<Vec<LoadedRecord>> {
        Ok(self.read()?)
    }
}

/// A header line describes the dataset, not an example
fn is_header(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) => {
            let has_uid = ["uid", "qid", "id"].iter().any(|k| obj.contains_key(*k));
            obj.contains_key("header") || (obj.contains_key("dataset") && !has_uid)
        }
        None => false,
    }
}

/// Turn one JSON value into an example, or the reason it is unusable
fn parse_record(value: Value, line: usize) -> LoadedRecord {
    let raw: RawExample = serde_json::from_value(value)
        .map_err(|e| SchemaError::InvalidRecord { line, message: e.to_string() })?;

    let uid = raw
        .uid
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| SchemaError::MissingField { uid: format!("line {line}"), field: "uid" })?;
    let query = raw
        .query
        .ok_or_else(|| SchemaError::MissingField { uid: uid.clone(), field: "query" })?;
    let context = raw
        .context
        .ok_or_else(|| SchemaError::MissingField { uid: uid.clone(), field: "context" })?;
    let gold_answers = raw
        .gold_answers
        .filter(|a| !a.is_empty())
        .ok_or_else(|| SchemaError::MissingField { uid: uid.clone(), field: "gold_answers" })?;

    let mut example = QaExample::new(uid, query, context, gold_answers);
    example.metadata         = raw.metadata;
    example.is_substitute    = raw.is_substitute;
    example.original_uid     = raw.original_uid;
    example.original_example = raw.original_example;
    example.substitution     = raw.substitution;
    example.validate()?;
    Ok(example)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::span::Span;
    use std::io::Write;

    fn write_lines(lines: &[&str]) -> (tempfile::TempDir, PathBuf) {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.jsonl");
        let mut f = fs::File::create(&path).unwrap();
        for l in lines {
            writeln!(f, "{l}").unwrap();
        }
        (dir, path)
    }

    const GOOD: &str = r#"{"uid":"q1","query":"Capital of France?","context":"Paris is the capital.","gold_answers":[{"text":"Paris","spans":[[0,5]]}]}"#;

    #[test]
    fn test_loads_valid_record() {
        let (_dir, path) = write_lines(&[GOOD]);
        let records = JsonlExampleLoader::new(&path).read().unwrap();
        assert_eq!(records.len(), 1);
        let ex = records[0].as_ref().unwrap();
        assert_eq!(ex.uid, "q1");
        assert_eq!(ex.gold_answers[0].spans, vec![Span::new(0, 5)]);
    }

    #[test]
    fn test_header_line_is_skipped() {
        let (_dir, path) = write_lines(&[r#"{"dataset":"SQuAD"}"#, GOOD]);
        let records = JsonlExampleLoader::new(&path).read().unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_aliased_field_names() {
        let line = r#"{"qid":"x9","question":"Who?","context":"Ada wrote it.","answers":[{"text":"Ada","spans":[[0,3]]}]}"#;
        let (_dir, path) = write_lines(&[line]);
        let records = JsonlExampleLoader::new(&path).read().unwrap();
        assert_eq!(records[0].as_ref().map(|e| e.uid.as_str()).unwrap(), "x9");
    }

    #[test]
    fn test_schema_errors_are_per_record() {
        let no_context = r#"{"uid":"q2","query":"?","gold_answers":[{"text":"A"}]}"#;
        let bad_span   = r#"{"uid":"q3","query":"?","context":"Lyon","gold_answers":[{"text":"Paris","spans":[[0,4]]}]}"#;
        let wrong_type = r#"{"uid":"q4","query":"?","context":"x","gold_answers":"Paris"}"#;
        let (_dir, path) = write_lines(&[GOOD, no_context, bad_span, wrong_type]);

        let records = JsonlExampleLoader::new(&path).read().unwrap();
        assert_eq!(records.len(), 4);
        assert!(records[0].is_ok());
        assert!(matches!(records[1], Err(SchemaError::MissingField { field: "context", .. })));
        assert!(matches!(records[2], Err(SchemaError::SpanTextMismatch { .. })));
        assert!(matches!(records[3], Err(SchemaError::InvalidRecord { line: 4, .. })));
    }

    #[test]
    fn test_malformed_json_is_fatal() {
        let (_dir, path) = write_lines(&[GOOD, "{\"uid\": \"q2\", "]);
        match JsonlExampleLoader::new(&path).read() {
            Err(DataLoadError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = JsonlExampleLoader::new(dir.path().join("none.jsonl")).read();
        assert!(matches!(missing, Err(DataLoadError::Missing { .. })));

        let (_d, path) = write_lines(&[r#"{"dataset":"empty"}"#]);
        assert!(matches!(JsonlExampleLoader::new(&path).read(), Err(DataLoadError::Empty { .. })));
    }
}
