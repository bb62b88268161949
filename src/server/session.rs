use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::MessageWriter;
use crate::server::ServerContext;
use crate::server::handler::handle_request;

/// One accepted connection, driven through its states by [`run`](Self::run).
///
/// The whole session runs inside a single task, so its steps never overlap.
pub struct Session {
    stream: TcpStream,
    buffer: BytesMut,
    state: SessionState,
    ctx: Arc<ServerContext>,
    local: SocketAddr,
    peer: SocketAddr,
}

pub enum SessionState {
    Reading,
    Dispatching(Request),
    Writing(MessageWriter, bool), // bool = keep_alive?
    Closing,
    Closed,
}

enum ReadOutcome {
    Request(Request),
    /// Peer closed its side between requests.
    Eof,
    Malformed(ParseError),
}

impl Session {
    pub fn new(
        stream: TcpStream,
        ctx: Arc<ServerContext>,
        local: SocketAddr,
        peer: SocketAddr,
    ) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            state: SessionState::Reading,
            ctx,
            local,
            peer,
        }
    }

    pub async fn run(mut self) {
        loop {
            self.state = match std::mem::replace(&mut self.state, SessionState::Closed) {
                SessionState::Reading => self.on_read().await,

                SessionState::Dispatching(req) => {
                    let keep_alive = req.keep_alive();
                    let (method, path) = (req.method, req.path.clone());

                    let response = handle_request(&self.ctx, req, self.local, self.peer).await;
                    debug!(
                        peer = %self.peer,
                        %method,
                        %path,
                        status = response.status.as_u16(),
                        "request handled"
                    );

                    SessionState::Writing(MessageWriter::response(&response), keep_alive)
                }

                SessionState::Writing(mut writer, keep_alive) => {
                    match writer.write_to_stream(&mut self.stream).await {
                        Ok(()) if keep_alive => SessionState::Reading,
                        Ok(()) => SessionState::Closing,
                        Err(e) => {
                            warn!(peer = %self.peer, error = %e, "write failed");
                            SessionState::Closed
                        }
                    }
                }

                SessionState::Closing => {
                    self.close().await;
                    SessionState::Closed
                }

                SessionState::Closed => break,
            };
        }
    }

    async fn on_read(&mut self) -> SessionState {
        match timeout(self.ctx.read_timeout, self.read_request()).await {
            Ok(Ok(ReadOutcome::Request(req))) => SessionState::Dispatching(req),
            Ok(Ok(ReadOutcome::Eof)) => SessionState::Closing,
            Ok(Ok(ReadOutcome::Malformed(e))) => {
                debug!(peer = %self.peer, error = %e, "malformed request");
                let why = match e {
                    ParseError::InvalidMethod => "Unknown HTTP-method",
                    ParseError::TooLarge => "Request too large",
                    _ => "Malformed request",
                };
                // Framing is lost, so the connection cannot be reused.
                let response = Response::bad_request(why, false);
                SessionState::Writing(MessageWriter::response(&response), false)
            }
            Ok(Err(e)) => {
                warn!(peer = %self.peer, error = %e, "read failed");
                SessionState::Closed
            }
            Err(_) => {
                debug!(peer = %self.peer, "read timed out");
                SessionState::Closed
            }
        }
    }

    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    return Ok(ReadOutcome::Request(request));
                }
                Err(ParseError::Incomplete) => {}
                Err(e) => return Ok(ReadOutcome::Malformed(e)),
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(ReadOutcome::Eof);
                }
                anyhow::bail!("connection closed mid-request");
            }
        }
    }

    /// Half-close: tell the peer nothing more is coming.
    async fn close(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            if e.kind() != ErrorKind::NotConnected {
                warn!(peer = %self.peer, error = %e, "shutdown failed");
            }
        }
    }
}
