use std::path::{Path, PathBuf};

use crate::error::{LedgerError, Result};

/// The raw content of an order log at one point in time
///
/// Lines appended to the file after a snapshot was taken are simply absent
/// from it; each snapshot is a closed batch.
#[derive(Debug, Clone)]
pub struct LogSnapshot {
    lines: Vec<String>,
}

impl LogSnapshot {
    /// Builds a snapshot from text already in memory.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Read-only handle on the order writer's append-only log file
///
/// The writer process owns the file; this side never mutates it. Every call
/// to [`OrderLog::snapshot`] performs one full independent read, so
/// concurrent queries each work from their own consistent batch of lines.
pub struct OrderLog {
    path: PathBuf,
}

impl OrderLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the entire log.
    ///
    /// # Returns
    /// `Ok(None)` when the file does not exist yet (a deployment that has
    /// not traded); an error only when the file exists but cannot be read.
    pub async fn snapshot(&self) -> Result<Option<LogSnapshot>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => {
                let snapshot = LogSnapshot::from_text(&text);
                tracing::debug!(
                    "Read {} log lines from {}",
                    snapshot.len(),
                    self.path.display()
                );
                Ok(Some(snapshot))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Order log {} not found", self.path.display());
                Ok(None)
            }
            Err(source) => Err(LedgerError::Source {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }
}
