// ============================================================
// Layer 6: Run Manifest
// ============================================================
// Saves the exact configuration of a generation run next to
// its output, so the run can be reproduced later:
//
//   out/alias.jsonl               ← substituted examples
//   out/alias.jsonl.config.json   ← GenerateConfig (this file)
//   out/alias.jsonl.skipped.csv   ← skip log
//
//   $ qa-entity-swap replay --config out/alias.jsonl.config.json
//
// The seed is part of the config, so a replay produces the
// same output byte for byte.
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::application::generate_use_case::GenerateConfig;

/// Path of the manifest that belongs to `output`
pub fn manifest_path(output: &Path) -> PathBuf {
    sibling(output, "config.json")
}

/// `<output>.<suffix>`, e.g. "out.jsonl" → "out.jsonl.skipped.csv"
pub fn sibling(output: &Path, suffix: &str) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Write `cfg` as pretty JSON next to its output file
pub fn save(cfg: &GenerateConfig) -> Result<PathBuf> {
    let path = manifest_path(&cfg.output);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(&path, json)
        .with_context(|| format!("Cannot write run config to '{}'", path.display()))?;

    tracing::debug!("Saved run config to '{}'", path.display());
    Ok(path)
}

/// Read a config saved by an earlier run
pub fn load(path: &Path) -> Result<GenerateConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read run config '{}'", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("'{}' is not a valid run config", path.display()))
}
