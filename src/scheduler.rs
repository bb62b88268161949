//! Background activities that run beside the connection sessions.
//!
//! Each one loops until its [`ShutdownSignal`] fires and never depends on
//! another one finishing.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::audit::{AuditQueue, AuditRecord, AuditWriter};
use crate::content::ContentCache;
use crate::lifecycle::ShutdownSignal;

/// Stand-in for "never" when an interval does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + after`, saturating at a far-future instant instead of panicking.
pub fn deadline_after(after: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(after).unwrap_or_else(|| now + FAR_FUTURE)
}

pub fn spawn_reload(
    cache: Arc<ContentCache>,
    every: Duration,
    shutdown: ShutdownSignal,
) -> JoinHandle<()> {
    tokio::spawn(run_reload(cache, every, shutdown))
}

pub fn spawn_audit_drain(
    queue: Arc<AuditQueue>,
    writer: AuditWriter,
    shutdown: ShutdownSignal,
) -> JoinHandle<()> {
    tokio::spawn(run_audit_drain(queue, writer, shutdown))
}

/// Reloads `cache` every `every`. The first tick is one interval after
/// start, since the cache was loaded when it was built.
///
/// A failed reload keeps serving the last good snapshot.
pub async fn run_reload(cache: Arc<ContentCache>, every: Duration, mut shutdown: ShutdownSignal) {
    let mut ticker = time::interval_at(deadline_after(every), every.min(FAR_FUTURE));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        path = %cache.path().display(),
        interval_ms = every.as_millis() as u64,
        "content reload ticker starting"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => match cache.reload().await {
                Ok(bytes) => debug!(bytes, "content reloaded"),
                Err(e) => warn!(error = %e, "content reload failed, keeping last good content"),
            },
            _ = shutdown.recv() => {
                debug!("reload ticker received shutdown signal");
                break;
            }
        }
    }
}

/// Persists queued records one at a time, oldest first.
///
/// On shutdown whatever is already queued is still written before the
/// loop exits.
pub async fn run_audit_drain(
    queue: Arc<AuditQueue>,
    writer: AuditWriter,
    mut shutdown: ShutdownSignal,
) {
    loop {
        tokio::select! {
            biased;
            record = queue.next() => persist(&writer, record).await,
            _ = shutdown.recv() => break,
        }
    }

    let mut flushed = 0usize;
    while let Some(record) = queue.pop_oldest() {
        persist(&writer, record).await;
        flushed += 1;
    }
    debug!(flushed, "audit drain shutting down");
}

async fn persist(writer: &AuditWriter, record: AuditRecord) {
    match writer.persist(&record).await {
        Ok(path) => debug!(
            path = %path.display(),
            remote = %record.remote(),
            bytes = record.body().len(),
            "audit record written"
        ),
        Err(e) => error!(error = %e, "audit record dropped"),
    }
}
