use std::path::{Path, PathBuf};

use crate::audit::record::AuditRecord;

/// Errors that can occur while persisting audit records.
#[derive(Debug, thiserror::Error)]
pub enum AuditWriteError {
    #[error("failed to create audit directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write audit record {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writes each record as its own file under one directory.
#[derive(Debug, Clone)]
pub struct AuditWriter {
    dir: PathBuf,
}

impl AuditWriter {
    /// Creates the directory (and parents) if it does not exist yet.
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self, AuditWriteError> {
        let dir = dir.as_ref().to_path_buf();

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| AuditWriteError::CreateDir {
                path: dir.clone(),
                source,
            })?;

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the raw request body to `dir/<record file name>`, replacing any
    /// file of the same name. Returns the path written.
    pub async fn persist(&self, record: &AuditRecord) -> Result<PathBuf, AuditWriteError> {
        let path = self.dir.join(record.file_name());

        tokio::fs::write(&path, record.body())
            .await
            .map_err(|source| AuditWriteError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }
}
