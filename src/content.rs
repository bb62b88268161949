//! Hot-reloadable payload shared between the reload ticker and every session.
//!
//! A reload reads the whole file into a staging buffer first and only then
//! publishes it with a single atomic pointer swap. Readers get a
//! reference-counted [`Bytes`] handle, so a snapshot they already hold stays
//! valid after the next swap and no reader ever sees a partially read file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use bytes::{Bytes, BytesMut};
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

use crate::http::mime::mime_type;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to open content file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read content file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub struct ContentCache {
    path: PathBuf,
    content_type: &'static str,
    current: ArcSwap<Bytes>,
    /// Also serializes writers: only one reload stages at a time.
    staging: Mutex<BytesMut>,
}

impl ContentCache {
    /// Loads `path` once. Fails if the file cannot be read, since there is
    /// no last known good content to fall back on yet.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref().to_path_buf();
        let content_type = mime_type(&path.to_string_lossy());

        let cache = Self {
            path,
            content_type,
            current: ArcSwap::from_pointee(Bytes::new()),
            staging: Mutex::new(BytesMut::new()),
        };
        cache.reload().await?;

        Ok(cache)
    }

    /// Re-reads the file and publishes it.
    ///
    /// Returns the size of the new snapshot. On error the current snapshot
    /// is left exactly as it was.
    pub async fn reload(&self) -> Result<usize, ContentError> {
        let mut staging = self.staging.lock().await;
        staging.clear();

        let mut file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|source| ContentError::Open {
                path: self.path.clone(),
                source,
            })?;

        if let Ok(meta) = file.metadata().await {
            staging.reserve(meta.len() as usize);
        }

        loop {
            match file.read_buf(&mut *staging).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(source) => {
                    staging.clear();
                    return Err(ContentError::Read {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
        }

        let next = staging.split().freeze();
        let len = next.len();
        self.current.store(Arc::new(next));

        Ok(len)
    }

    /// The snapshot published by the last successful reload.
    ///
    /// Never blocks on a reload in progress.
    pub fn current(&self) -> Bytes {
        Bytes::clone(&self.current.load())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// MIME type derived from the content file's extension.
    pub fn content_type(&self) -> &'static str {
        self.content_type
    }
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache")
            .field("path", &self.path)
            .field("len", &self.current.load().len())
            .finish()
    }
}
