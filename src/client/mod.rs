//! Client side: one outbound connection that either fetches once or keeps
//! pushing the content file.
//!
//! ```text
//!   Resolving → Connecting ─┬─ once ──────────────→ Sending(GET) → Receiving → Closing
//!                           └─ recurring → Waiting ⇄ Sending(HEAD|POST) → Receiving
//!                                             │
//!                                   shutdown / failure → Closing → Closed
//! ```

pub mod session;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::ClientConfig;
use crate::content::ContentCache;
use crate::lifecycle::Shutdown;
use crate::scheduler;

pub use session::{ClientOptions, ClientSession, Exchange, SessionReport};

/// Runs one client session to completion.
///
/// In recurring mode the request file is reloaded on its own interval for
/// as long as the session lives. When the session ends, for whatever
/// reason, shutdown is triggered so the reload ticker stops too.
pub async fn run(cfg: &ClientConfig, shutdown: &Shutdown) -> anyhow::Result<SessionReport> {
    let opts = ClientOptions::from_config(cfg)?;

    if opts.once {
        return ClientSession::new(opts, None, shutdown.subscribe()).run().await;
    }

    let cache = Arc::new(ContentCache::load(&cfg.request_path).await?);
    let reload = scheduler::spawn_reload(
        cache.clone(),
        cfg.reload_interval(),
        shutdown.subscribe(),
    );

    let result = ClientSession::new(opts, Some(cache), shutdown.subscribe())
        .run()
        .await;

    shutdown.trigger();
    reload.await.context("background task panicked")?;

    if let Ok(report) = &result {
        info!(
            probes = report.probes,
            pushes = report.pushes,
            "client session finished"
        );
    }
    result
}
