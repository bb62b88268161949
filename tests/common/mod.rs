//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use hotswap::audit::AuditQueue;
use hotswap::config::ServeMode;
use hotswap::content::ContentCache;
use hotswap::http::parser::{ParseError, parse_http_response};
use hotswap::http::response::Response;
use hotswap::lifecycle::Shutdown;
use hotswap::server::{Listener, ServerContext};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub struct TestServer {
    pub addr: SocketAddr,
    pub ctx: Arc<ServerContext>,
    pub shutdown: Shutdown,
}

/// Starts a listener on an ephemeral port serving `content_file`.
pub async fn start_server(
    content_file: &Path,
    mode: ServeMode,
    doc_root: Option<PathBuf>,
) -> TestServer {
    let cache = Arc::new(ContentCache::load(content_file).await.unwrap());
    let ctx = Arc::new(ServerContext {
        cache,
        audit: Arc::new(AuditQueue::new()),
        mode,
        doc_root,
        read_timeout: Duration::from_secs(5),
    });

    let listener = Listener::bind("127.0.0.1:0".parse().unwrap(), ctx.clone())
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    tokio::spawn(listener.run(shutdown.subscribe()));

    TestServer {
        addr,
        ctx,
        shutdown,
    }
}

/// Writes `content` next to `path` and renames it into place, so a
/// concurrent reader sees either the old or the new file, never a mix.
pub fn replace_file(path: &Path, content: &[u8]) {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content).unwrap();
    std::fs::rename(&tmp, path).unwrap();
}

/// Sends raw request bytes and reads exactly one response.
pub async fn exchange(stream: &mut TcpStream, raw: &[u8], head: bool) -> Response {
    stream.write_all(raw).await.unwrap();
    read_response(stream, head).await
}

pub async fn read_response(stream: &mut TcpStream, head: bool) -> Response {
    let mut buf = BytesMut::new();
    loop {
        match parse_http_response(&buf, head) {
            Ok((resp, consumed)) => {
                buf.advance(consumed);
                return resp;
            }
            Err(ParseError::Incomplete) => {}
            Err(e) => panic!("bad response: {e}"),
        }
        let n = tokio::time::timeout(Duration::from_secs(5), stream.read_buf(&mut buf))
            .await
            .expect("response timed out")
            .unwrap();
        assert!(n > 0, "connection closed before a full response");
    }
}

pub async fn get(addr: SocketAddr, target: &str) -> Response {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let raw = format!("GET {target} HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n");
    exchange(&mut stream, raw.as_bytes(), false).await
}
