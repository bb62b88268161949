//! Server side: listener, per-connection sessions and request dispatch.
//!
//! # Session State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received          (peer EOF → Closing,
//!               ▼                             I/O error → Closed)
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Validate, read snapshot / file, queue audit record
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               ├─ Keep-Alive → Reading (same connection)
//!               └─ Close → Closing → Closed
//! ```

pub mod handler;
pub mod listener;
pub mod session;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use crate::audit::{AuditQueue, AuditWriter};
use crate::config::{ServeMode, ServerConfig};
use crate::content::ContentCache;
use crate::lifecycle::Shutdown;
use crate::scheduler;

pub use listener::Listener;

/// State shared by every session of one server.
#[derive(Debug)]
pub struct ServerContext {
    pub cache: Arc<ContentCache>,
    pub audit: Arc<AuditQueue>,
    pub mode: ServeMode,
    pub doc_root: Option<PathBuf>,
    pub read_timeout: Duration,
}

/// Loads the content file, starts the reload ticker (and the audit drain in
/// capture mode), then accepts connections until shutdown.
pub async fn run(cfg: &ServerConfig, shutdown: &Shutdown) -> anyhow::Result<()> {
    let cache = Arc::new(ContentCache::load(&cfg.response_path).await?);
    let audit = Arc::new(AuditQueue::new());

    let mut background = vec![scheduler::spawn_reload(
        cache.clone(),
        cfg.reload_interval(),
        shutdown.subscribe(),
    )];

    if cfg.mode == ServeMode::Capture {
        let writer = AuditWriter::new(&cfg.audit_dir).await?;
        info!(dir = %writer.dir().display(), "capturing request bodies");
        background.push(scheduler::spawn_audit_drain(
            audit.clone(),
            writer,
            shutdown.subscribe(),
        ));
    }

    let ctx = Arc::new(ServerContext {
        cache,
        audit,
        mode: cfg.mode,
        doc_root: cfg.doc_root.clone(),
        read_timeout: cfg.read_timeout(),
    });

    let listener = Listener::bind(cfg.socket_addr()?, ctx)
        .await
        .context("failed to start listener")?;
    listener.run(shutdown.subscribe()).await;

    for task in background {
        task.await.context("background task panicked")?;
    }

    Ok(())
}
