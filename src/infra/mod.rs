// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Files a generation run leaves next to its output, and the
// counters it reports:
//
//   run_manifest.rs  the GenerateConfig of the run, as JSON,
//                    so `replay` can reproduce it exactly
//
//   skip_log.rs      one CSV row per example that could not
//                    be used, with a stable reason key
//
//   summary.rs       per-run counters and the end-of-run report
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Run config persistence for replay
pub mod run_manifest;

/// CSV log of skipped examples
pub mod skip_log;

/// End-of-run counters
pub mod summary;
