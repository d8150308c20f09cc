// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// This layer strings the other layers together into the two
// things a user can ask for: a substitution run, or a look at
// what a dataset contains.
//
// Rules for this layer:
//   - No substitution logic here (that's Layer 5)
//   - No printing here (that's Layer 1)
//   - File formats are Layer 4 and Layer 6 business
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Load, annotate, substitute, write
pub mod generate_use_case;

// Dataset statistics
pub mod stats_use_case;
