// ============================================================
// Layer 4: Data Pipeline
// ============================================================
// Everything between the dataset file on disk and the
// examples the substitution layer works on, and back:
//
//   dev.jsonl
//       │
//       ▼
//   JsonlExampleLoader   → parses lines, separates schema errors
//       │
//       ▼
//   Annotator            → links answers to the KB, assigns types
//       │
//       ▼
//   (substitution, Layer 5)
//       │
//       ▼
//   JsonlExampleWriter   → streams substituted examples out
//
// Normalizer and the seeded sampler are shared helpers used
// by the substitution policies.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Reads .jsonl datasets into QaExample records
pub mod loader;

/// Fills KB metadata and answer types into gold answers
pub mod annotator;

/// Writes QaExample records as .jsonl
pub mod writer;

/// Answer-text normalisation for equality checks
pub mod normalizer;

/// Per-example seeded RNGs and sampling without replacement
pub mod sampler;
