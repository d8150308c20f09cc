// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define what the
// system talks about: entities, QA examples, answers, spans,
// answer types and the ways an example can fail.
//
// Rules for this layer:
//   - NO file I/O
//   - NO randomness
//   - Only data, pure functions and traits
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

/// Closed answer-type taxonomy and the pure classifier
pub mod answer_type;

/// Knowledge-base entity records
pub mod entity;

/// DataLoadError, SchemaError, SubstitutionFailure
pub mod errors;

/// QaExample, Answer and substitution provenance
pub mod qa_example;

/// Character spans and byte/char conversion
pub mod span;

/// ExampleSource / ExampleSink abstractions
pub mod traits;
