//! Artifact output
//!
//! File artifacts are written to a temporary file next to their destination
//! and then renamed over it, so a failed write never leaves a truncated file.

use pxdgen_core::{Artifact, Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Writes artifacts to files or a shared stream
pub struct OutputSink<W: Write> {
    stream: W,
}

impl<W: Write> OutputSink<W> {
    /// Sink whose stream artifacts go to `stream`
    pub fn new(stream: W) -> Self {
        Self { stream }
    }

    /// Emit all artifacts in order, returning the files written
    pub fn emit(&mut self, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for artifact in artifacts {
            match &artifact.path {
                Some(path) => {
                    write_file(path, &artifact.content)?;
                    info!("Wrote {}", path.display());
                    written.push(path.clone());
                }
                None => self
                    .stream
                    .write_all(artifact.content.as_bytes())
                    .map_err(|source| Error::Output {
                        target: "<stream>".into(),
                        source,
                    })?,
            }
        }

        self.stream.flush().map_err(|source| Error::Output {
            target: "<stream>".into(),
            source,
        })?;
        Ok(written)
    }

    /// Recover the underlying stream
    pub fn into_inner(self) -> W {
        self.stream
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    let output_error = |source| Error::Output {
        target: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(output_error)?;

    let mut file = NamedTempFile::new_in(&dir).map_err(output_error)?;
    file.write_all(content.as_bytes()).map_err(output_error)?;
    file.persist(path).map_err(|e| output_error(e.error))?;
    Ok(())
}
