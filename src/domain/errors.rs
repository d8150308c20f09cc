// ============================================================
// Layer 3: Error Taxonomy
// ============================================================
// Three kinds of failure, with very different blast radius:
//
//   DataLoadError       fatal: the input or KB file is missing
//                       or corrupt, the run aborts before any
//                       example is processed
//   SchemaError         per example: a record lacks a field or
//                       its spans disagree with its text
//   SubstitutionFailure per example: no qualifying candidate,
//                       or the answer cannot be found to rewrite
//
// Per-example errors carry a stable reason() key so the run
// can count skips by kind.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::answer_type::AnswerType;
use crate::domain::span::Span;

#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("file not found: '{}'", path.display())]
    Missing { path: PathBuf },

    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt data in '{}' at line {line}: {message}", path.display())]
    Parse {
        path:    PathBuf,
        line:    usize,
        message: String,
    },

    #[error("'{}' contains no records", path.display())]
    Empty { path: PathBuf },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("line {line}: record does not fit the example schema: {message}")]
    InvalidRecord { line: usize, message: String },

    #[error("record '{uid}': missing required field '{field}'")]
    MissingField { uid: String, field: &'static str },

    #[error("record '{uid}': span {span:?} exceeds context of {len} chars")]
    SpanOutOfBounds { uid: String, span: Span, len: usize },

    #[error("record '{uid}': span {span:?} reads '{found}', expected '{expected}'")]
    SpanTextMismatch {
        uid:      String,
        span:     Span,
        found:    String,
        expected: String,
    },
}

impl SchemaError {
    /// Stable key for per-reason skip counts
    pub fn reason(&self) -> &'static str {
        match self {
            SchemaError::InvalidRecord { .. }    => "schema-invalid-record",
            SchemaError::MissingField { .. }     => "schema-missing-field",
            SchemaError::SpanOutOfBounds { .. }  => "schema-span-out-of-bounds",
            SchemaError::SpanTextMismatch { .. } => "schema-span-mismatch",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubstitutionFailure {
    #[error("no alias of '{answer}' other than its own surface text")]
    AliasExhausted { answer: String },

    #[error("no {answer_type} entity in popularity bracket {bracket}")]
    BracketEmpty { answer_type: AnswerType, bracket: String },

    #[error("no other {answer_type} answer in the corpus")]
    CorpusExhausted { answer_type: AnswerType },

    #[error("corpus has no answer type other than {answer_type}")]
    NoOtherType { answer_type: AnswerType },

    #[error("no gold answer is annotated in the context")]
    NoAnswerInContext,

    #[error("'{answer}' does not occur verbatim in the context")]
    AnswerNotInContext { answer: String },

    #[error("annotated span {span:?} does not hold '{answer}'")]
    SpanMismatch { answer: String, span: Span },
}

impl SubstitutionFailure {
    /// Stable key for per-reason skip counts
    pub fn reason(&self) -> &'static str {
        match self {
            SubstitutionFailure::AliasExhausted { .. }     => "alias-exhausted",
            SubstitutionFailure::BracketEmpty { .. }       => "popularity-bracket-empty",
            SubstitutionFailure::CorpusExhausted { .. }    => "corpus-exhausted",
            SubstitutionFailure::NoOtherType { .. }        => "no-other-type",
            SubstitutionFailure::NoAnswerInContext         => "no-answer-in-context",
            SubstitutionFailure::AnswerNotInContext { .. } => "rewrite-not-found",
            SubstitutionFailure::SpanMismatch { .. }       => "rewrite-span-mismatch",
        }
    }
}

/// Anything that makes one example unusable without stopping the run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExampleSkip {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Substitution(#[from] SubstitutionFailure),
}

impl ExampleSkip {
    pub fn reason(&self) -> &'static str {
        match self {
            ExampleSkip::Schema(e)       => e.reason(),
            ExampleSkip::Substitution(e) => e.reason(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_keys_are_stable() {
        let f = SubstitutionFailure::AliasExhausted { answer: "Napoleon".into() };
        assert_eq!(f.reason(), "alias-exhausted");
        let skip: ExampleSkip = f.into();
        assert_eq!(skip.reason(), "alias-exhausted");

        let s = SchemaError::MissingField { uid: "x".into(), field: "context" };
        assert_eq!(ExampleSkip::from(s).reason(), "schema-missing-field");
    }

    #[test]
    fn test_schema_reasons_are_distinct() {
        let errors = [
            SchemaError::InvalidRecord { line: 3, message: "expected a map".into() },
            SchemaError::MissingField { uid: "q1".into(), field: "query" },
            SchemaError::SpanOutOfBounds { uid: "q2".into(), span: Span::new(0, 9), len: 5 },
            SchemaError::SpanTextMismatch {
                uid:      "q3".into(),
                span:     Span::new(1, 6),
                found:    "aris ".into(),
                expected: "Paris".into(),
            },
        ];
        let mut keys: Vec<&str> = errors.iter().map(|e| e.reason()).collect();
        assert_eq!(keys[3], "schema-span-mismatch");
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_messages_name_the_culprit() {
        let f = SubstitutionFailure::AnswerNotInContext { answer: "Paris".into() };
        assert!(f.to_string().contains("Paris"));
    }
}
