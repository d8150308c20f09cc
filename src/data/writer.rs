// ============================================================
// Layer 4: Example Writer
// ============================================================
// Streams finished examples to a .jsonl file, one complete
// JSON object per line, in the order they are written.
//
// Implements the ExampleSink trait from Layer 3.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::qa_example::QaExample;
use crate::domain::traits::ExampleSink;

pub struct JsonlExampleWriter {
    path:    PathBuf,
    out:     BufWriter<File>,
    written: usize,
}

impl JsonlExampleWriter {
    /// Create (or truncate) the output file, making parent directories
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory '{}'", parent.display()))?;
        }
        let file = File::create(&path)
            .with_context(|| format!("Cannot create output file '{}'", path.display()))?;
        Ok(Self { path, out: BufWriter::new(file), written: 0 })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl ExampleSink for JsonlExampleWriter {
    fn write(&mut self, example: &QaExample) -> Result<()> {
        serde_json::to_writer(&mut self.out, example)
            .with_context(|| format!("Cannot serialise example '{}'", example.uid))?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out
            .flush()
            .with_context(|| format!("Cannot flush '{}'", self.path.display()))?;
        tracing::debug!("Wrote {} examples to '{}'", self.written, self.path.display());
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::JsonlExampleLoader;
    use crate::domain::qa_example::Answer;
    use crate::domain::span::Span;

    #[test]
    fn test_written_file_loads_back() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.jsonl");

        let mut ex = QaExample::new("q1", "Who?", "Ada wrote it.", vec![
            Answer::new("Ada", vec![Span::new(0, 3)]),
        ]);
        ex.is_substitute = true;
        ex.original_uid  = Some("q0".into());

        let mut writer = JsonlExampleWriter::create(&path).unwrap();
        writer.write(&ex).unwrap();
        writer.finish().unwrap();
        assert_eq!(writer.written(), 1);

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().count(), 1);
        assert!(raw.contains(r#""spans":[[0,3]]"#));

        let back = JsonlExampleLoader::new(&path).read().unwrap();
        assert_eq!(back[0].as_ref().unwrap().original_uid.as_deref(), Some("q0"));
    }
}
