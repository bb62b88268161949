use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket};
use tracing::{debug, info, warn};

use crate::lifecycle::ShutdownSignal;
use crate::server::ServerContext;
use crate::server::session::Session;

const BACKLOG: u32 = 1024;

/// Pause after a failed accept so a persistent error (e.g. out of file
/// descriptors) does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Accepts connections and hands each one to its own [`Session`] task.
pub struct Listener {
    inner: TcpListener,
    ctx: Arc<ServerContext>,
}

impl Listener {
    /// Open, bind and listen. Any failure here is fatal for the server.
    pub async fn bind(addr: SocketAddr, ctx: Arc<ServerContext>) -> anyhow::Result<Self> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .context("open")?;

        socket.set_reuseaddr(true).context("set_option")?;
        socket.bind(addr).with_context(|| format!("bind {}", addr))?;
        let inner = socket.listen(BACKLOG).context("listen")?;

        info!("Listening on {}", inner.local_addr()?);

        Ok(Self { inner, ctx })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accept loop. Returns only once shutdown is signalled.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        loop {
            let accepted = tokio::select! {
                res = self.inner.accept() => res,
                _ = shutdown.recv() => {
                    info!("listener shutting down");
                    return;
                }
            };

            let (socket, peer) = match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    continue;
                }
            };

            let local = match socket.local_addr() {
                Ok(local) => local,
                Err(e) => {
                    warn!(peer = %peer, error = %e, "dropping connection without local address");
                    continue;
                }
            };

            debug!("Accepted connection from {}", peer);

            let ctx = self.ctx.clone();
            tokio::spawn(Session::new(socket, ctx, local, peer).run());
        }
    }
}
