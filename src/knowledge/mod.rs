// ============================================================
// Layer 5: Knowledge Layer
// ============================================================
// Everything substitution policies may draw replacements from:
//
//   base.rs        the Entity Knowledge Base, loaded once from
//                  the Wikidata extract and then read-only
//   popularity.rs  percentile brackets over popularity ranks
//   corpus.rs      the answers of the dataset being processed,
//                  grouped by type
//
// The knowledge base is an explicit value passed by reference,
// never a global. Tests build small fixture bases in memory.

pub mod base;
pub mod corpus;
pub mod popularity;
