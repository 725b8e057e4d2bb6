//! FileSink - appends timestamped errors to a flat text file

use contracts::{ContractError, ErrorSink, ErrorValue};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use crate::normalize::{render, timestamp};

/// First line written to every new log file
pub const START_MARKER: &str = "Error log started.";

/// Sink that appends every error to a file
pub struct FileSink {
    name: String,
    path: PathBuf,
    file: Option<File>,
}

impl FileSink {
    /// Create (or truncate) `path` and write the start marker.
    ///
    /// Blocks on the initial write so the file exists before the first
    /// error can arrive.
    #[instrument(name = "file_sink_create", skip(path), fields(path = %path.as_ref().display()))]
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ContractError> {
        let path = path.as_ref().to_path_buf();
        std::fs::write(&path, format!("{}\n", timestamp(START_MARKER)))?;
        debug!(path = %path.display(), "Error log initialized");

        Ok(Self {
            name: format!("file:{}", path.display()),
            path,
            file: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render one log line: `[<ts>] <rendered error>\n`
    pub fn format_entry(error: &ErrorValue) -> String {
        format!("{}\n", timestamp(&render(error)))
    }

    async fn append_target(&mut self) -> std::io::Result<&mut File> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            self.file = Some(file);
        }
        self.file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("append target not open"))
    }

    async fn append(&mut self, entry: &str) -> std::io::Result<()> {
        let file = self.append_target().await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await
    }
}

impl ErrorSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "file_sink_write", skip(self, error), fields(sink = %self.name))]
    async fn write(&mut self, error: &ErrorValue) -> Result<(), ContractError> {
        let entry = Self::format_entry(error);
        self.append(&entry).await.map_err(|e| {
            // Reopen on the next write
            self.file = None;
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(file) = self.file.as_mut() {
            file.flush().await?;
        }
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_writes_start_marker() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("errors.log");

        let sink = FileSink::create(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        assert_eq!(content.lines().count(), 1);
        assert!(content.ends_with("] Error log started.\n"));
        assert_eq!(sink.path(), path.as_path());
    }

    #[test]
    fn test_create_truncates_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("errors.log");
        std::fs::write(&path, "stale\nstale\n").unwrap();

        FileSink::create(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("stale"));
    }

    #[test]
    fn test_create_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("errors.log");
        assert!(matches!(
            FileSink::create(&path),
            Err(ContractError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_file_sink_appends_after_marker() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("errors.log");

        let mut sink = FileSink::create(&path).unwrap();
        sink.write(&ErrorValue::from("first")).await.unwrap();
        sink.write(&ErrorValue::from("second")).await.unwrap();
        sink.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let marker = content.find(START_MARKER).unwrap();
        let first = content.find("\"first\"").unwrap();
        let second = content.find("\"second\"").unwrap();
        assert!(marker < first && first < second);
        assert!(content.ends_with("}\n"));
    }

    #[test]
    fn test_format_entry_contains_rendering() {
        let value = ErrorValue::from("boom");
        let entry = FileSink::format_entry(&value);
        assert!(entry.starts_with('['));
        assert!(entry.contains(&render(&value)));
        assert!(entry.ends_with('\n'));
    }
}
