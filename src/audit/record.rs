use std::net::SocketAddr;

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// ISO-8601 basic format, UTC, microsecond resolution.
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6f";

/// One captured request body and the connection it arrived on.
///
/// Immutable once built; consumed exactly once by the drain worker.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    timestamp: DateTime<Utc>,
    local: SocketAddr,
    remote: SocketAddr,
    body: Bytes,
}

impl AuditRecord {
    /// Stamps the record with the current UTC time.
    pub fn new(local: SocketAddr, remote: SocketAddr, body: impl Into<Bytes>) -> Self {
        Self::at(Utc::now(), local, remote, body)
    }

    pub fn at(
        timestamp: DateTime<Utc>,
        local: SocketAddr,
        remote: SocketAddr,
        body: impl Into<Bytes>,
    ) -> Self {
        Self {
            timestamp,
            local,
            remote,
            body: body.into(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn local(&self) -> SocketAddr {
        self.local
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// `{local_port}_{remote_port}_{timestamp}.txt`
    ///
    /// Two records from the same remote port within one microsecond share a
    /// name; the later one overwrites the earlier.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.txt",
            self.local.port(),
            self.remote.port(),
            self.timestamp.format(TIMESTAMP_FORMAT)
        )
    }
}
