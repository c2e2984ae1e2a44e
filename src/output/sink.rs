//! Export sinks.
//!
//! A sink receives a finished artifact and makes it available to the end
//! user. What "available" means is up to the sink.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// A named export payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub payload: Vec<u8>,
}

impl ExportArtifact {
    /// A JSON artifact.
    pub fn json(filename: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "application/json",
            payload,
        }
    }

    /// A CSV artifact.
    pub fn csv(filename: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "text/csv",
            payload,
        }
    }
}

/// Destination for export artifacts.
#[async_trait]
pub trait ExportSink: Send + Sync {
    /// Deliver an artifact.
    async fn deliver(&self, artifact: &ExportArtifact) -> io::Result<()>;
}

/// Writes artifacts as files into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Create a sink writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where an artifact with the given file name lands.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ExportSink for DirectorySink {
    async fn deliver(&self, artifact: &ExportArtifact) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path_for(&artifact.filename), &artifact.payload).await
    }
}

/// Writes artifact payloads to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

#[async_trait]
impl ExportSink for StdoutSink {
    async fn deliver(&self, artifact: &ExportArtifact) -> io::Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&artifact.payload).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await
    }
}

/// Collects artifacts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<ExportArtifact>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every artifact delivered so far, in delivery order.
    pub async fn artifacts(&self) -> Vec<ExportArtifact> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl ExportSink for MemorySink {
    async fn deliver(&self, artifact: &ExportArtifact) -> io::Result<()> {
        self.delivered.lock().await.push(artifact.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("exports"));

        sink.deliver(&ExportArtifact::csv("out.csv", b"\"ID\"\n".to_vec()))
            .await
            .unwrap();

        let written = std::fs::read(sink.path_for("out.csv")).unwrap();
        assert_eq!(written, b"\"ID\"\n");
    }

    #[tokio::test]
    async fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        sink.deliver(&ExportArtifact::json("a.json", b"{}".to_vec()))
            .await
            .unwrap();

        let artifacts = sink.artifacts().await;
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].content_type, "application/json");
    }
}
