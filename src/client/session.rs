use std::io::ErrorKind;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, lookup_host};
use tokio::time::{Sleep, sleep_until, timeout};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{ClientConfig, ConfigError};
use crate::content::ContentCache;
use crate::http::parser::{ParseError, parse_http_response};
use crate::http::request::{Method, Request, RequestBuilder};
use crate::http::response::{Response, SERVER_NAME};
use crate::http::writer::MessageWriter;
use crate::lifecycle::ShutdownSignal;
use crate::scheduler::deadline_after;

/// Timing and target for one client session.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub url: Url,
    pub keep_alive: Duration,
    pub post: Duration,
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
    /// Single GET instead of the recurring HEAD/POST loop.
    pub once: bool,
}

impl ClientOptions {
    pub fn from_config(cfg: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            url: cfg.target_url()?,
            keep_alive: cfg.keep_alive_interval(),
            post: cfg.post_interval(),
            connect_timeout: cfg.connect_timeout(),
            io_timeout: cfg.io_timeout(),
            once: cfg.once,
        })
    }
}

/// One request/response cycle on the session's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    /// HEAD, fired by the keep-alive timer.
    Probe,
    /// POST carrying the current content snapshot, fired by the post timer.
    Push,
    /// One-shot GET.
    Fetch,
}

impl Exchange {
    pub fn method(self) -> Method {
        match self {
            Exchange::Probe => Method::HEAD,
            Exchange::Push => Method::POST,
            Exchange::Fetch => Method::GET,
        }
    }
}

pub enum ClientState {
    Resolving,
    Connecting(Vec<SocketAddr>),
    /// Connected, both timers armed, nothing in flight.
    Waiting,
    Sending(Exchange),
    Receiving(Exchange),
    Closing,
    Closed,
}

/// What a session got done before it ended.
#[derive(Debug, Default)]
pub struct SessionReport {
    pub probes: usize,
    pub pushes: usize,
    pub fetches: usize,
    pub last_response: Option<Response>,
}

/// Drives one outbound connection.
///
/// Both recurring timers are polled from the session's own task, so a HEAD
/// and a POST are never on the wire at the same time: each exchange is
/// written and answered before the next timer is even looked at.
pub struct ClientSession {
    opts: ClientOptions,
    cache: Option<Arc<ContentCache>>,
    stream: Option<TcpStream>,
    buffer: BytesMut,
    state: ClientState,
    head_timer: Pin<Box<Sleep>>,
    post_timer: Pin<Box<Sleep>>,
    shutdown: ShutdownSignal,
    report: SessionReport,
    failure: Option<anyhow::Error>,
}

impl ClientSession {
    /// `cache` supplies POST bodies; it may be `None` for a one-shot GET.
    pub fn new(
        opts: ClientOptions,
        cache: Option<Arc<ContentCache>>,
        shutdown: ShutdownSignal,
    ) -> Self {
        let head_timer = Box::pin(sleep_until(deadline_after(opts.keep_alive)));
        let post_timer = Box::pin(sleep_until(deadline_after(opts.post)));

        Self {
            opts,
            cache,
            stream: None,
            buffer: BytesMut::with_capacity(8192),
            state: ClientState::Resolving,
            head_timer,
            post_timer,
            shutdown,
            report: SessionReport::default(),
            failure: None,
        }
    }

    /// Runs until shutdown or the first failure. Nothing is retried: a
    /// failed step closes the connection and is returned as the error.
    pub async fn run(mut self) -> Result<SessionReport> {
        loop {
            self.state = match std::mem::replace(&mut self.state, ClientState::Closed) {
                ClientState::Resolving => match self.resolve().await {
                    Ok(addrs) => ClientState::Connecting(addrs),
                    Err(e) => self.fail(e.context("resolve")),
                },

                ClientState::Connecting(addrs) => match self.connect(&addrs).await {
                    Ok(stream) => {
                        info!(
                            target_url = %self.opts.url,
                            peer = %stream.peer_addr().map(|a| a.to_string()).unwrap_or_default(),
                            "connected"
                        );
                        self.stream = Some(stream);

                        if self.opts.once {
                            ClientState::Sending(Exchange::Fetch)
                        } else {
                            self.rearm(Exchange::Probe);
                            self.rearm(Exchange::Push);
                            ClientState::Waiting
                        }
                    }
                    Err(e) => self.fail(e.context("connect")),
                },

                ClientState::Waiting => {
                    tokio::select! {
                        _ = self.shutdown.recv() => ClientState::Closing,
                        _ = &mut self.head_timer => ClientState::Sending(Exchange::Probe),
                        _ = &mut self.post_timer => ClientState::Sending(Exchange::Push),
                    }
                }

                ClientState::Sending(exchange) => match self.send(exchange).await {
                    Ok(()) => ClientState::Receiving(exchange),
                    Err(e) => self.fail(e.context("write")),
                },

                ClientState::Receiving(exchange) => match self.receive(exchange).await {
                    Ok(response) => self.on_response(exchange, response),
                    Err(e) => self.fail(e.context("read")),
                },

                ClientState::Closing => {
                    self.close().await;
                    ClientState::Closed
                }

                ClientState::Closed => break,
            };
        }

        match self.failure {
            Some(e) => Err(e),
            None => Ok(self.report),
        }
    }

    fn fail(&mut self, e: anyhow::Error) -> ClientState {
        warn!(
            target_url = %self.opts.url,
            error = %format!("{:#}", e),
            "client session failed"
        );
        self.failure = Some(e);
        if self.stream.is_some() {
            ClientState::Closing
        } else {
            ClientState::Closed
        }
    }

    async fn resolve(&self) -> Result<Vec<SocketAddr>> {
        let host = self
            .opts
            .url
            .host_str()
            .context("target url has no host")?
            .to_string();
        let port = self.opts.url.port_or_known_default().unwrap_or(80);

        let lookup = lookup_host((host.as_str(), port));
        let addrs: Vec<SocketAddr> = timeout(self.opts.connect_timeout, lookup)
            .await
            .map_err(|_| anyhow!("timed out resolving {}", host))??
            .collect();

        if addrs.is_empty() {
            bail!("{} resolved to no addresses", host);
        }
        debug!(%host, count = addrs.len(), "resolved");
        Ok(addrs)
    }

    async fn connect(&self, addrs: &[SocketAddr]) -> Result<TcpStream> {
        let mut last_error = None;

        for addr in addrs {
            match timeout(self.opts.connect_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Ok(Err(e)) => {
                    last_error = Some(anyhow::Error::new(e).context(format!("connect {}", addr)));
                }
                Err(_) => last_error = Some(anyhow!("timed out connecting to {}", addr)),
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("no address to connect to")))
    }

    /// Builds the request for `exchange`; Host and target come from the url.
    pub fn build_request(&self, exchange: Exchange) -> Result<Request> {
        let url = &self.opts.url;
        let host = url.host_str().context("target url has no host")?;
        let host_header = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let target = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };

        let mut builder = RequestBuilder::new()
            .method(exchange.method())
            .path(target)
            .header("Host", host_header)
            .header("User-Agent", SERVER_NAME)
            .header(
                "Connection",
                if self.opts.once { "close" } else { "keep-alive" },
            );

        if exchange == Exchange::Push {
            if let Some(cache) = &self.cache {
                builder = builder
                    .header("Content-Type", cache.content_type())
                    .body(cache.current().to_vec());
            }
        }

        builder.build().map_err(anyhow::Error::msg)
    }

    async fn send(&mut self, exchange: Exchange) -> Result<()> {
        let request = self.build_request(exchange)?;
        let mut writer = MessageWriter::request(&request);
        let stream = self.stream.as_mut().context("not connected")?;

        timeout(self.opts.io_timeout, writer.write_to_stream(stream))
            .await
            .map_err(|_| anyhow!("timed out sending {}", request.method))??;

        debug!(method = %request.method, bytes = request.body.len(), "request sent");
        Ok(())
    }

    async fn receive(&mut self, exchange: Exchange) -> Result<Response> {
        let io_timeout = self.opts.io_timeout;
        timeout(io_timeout, self.read_response(exchange == Exchange::Probe))
            .await
            .map_err(|_| anyhow!("timed out waiting for {} response", exchange.method()))?
    }

    async fn read_response(&mut self, head_request: bool) -> Result<Response> {
        let stream = self.stream.as_mut().context("not connected")?;

        loop {
            match parse_http_response(&self.buffer, head_request) {
                Ok((response, consumed)) => {
                    self.buffer.advance(consumed);
                    return Ok(response);
                }
                Err(ParseError::Incomplete) => {}
                Err(e) => bail!("bad response: {}", e),
            }

            let n = stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                bail!("connection closed before complete response received");
            }
        }
    }

    fn on_response(&mut self, exchange: Exchange, response: Response) -> ClientState {
        info!(
            method = %exchange.method(),
            status = response.status.as_u16(),
            headers = response.headers.len(),
            content_length = response.content_length().unwrap_or(response.body.len()),
            body = %String::from_utf8_lossy(&response.body),
            "response received"
        );

        let keep_alive = response.keep_alive();
        match exchange {
            Exchange::Probe => self.report.probes += 1,
            Exchange::Push => self.report.pushes += 1,
            Exchange::Fetch => self.report.fetches += 1,
        }
        self.report.last_response = Some(response);

        if self.opts.once {
            return ClientState::Closing;
        }
        if !keep_alive {
            info!("server closed the connection");
            return ClientState::Closing;
        }

        self.rearm(exchange);
        ClientState::Waiting
    }

    fn rearm(&mut self, exchange: Exchange) {
        match exchange {
            Exchange::Probe => {
                let at = deadline_after(self.opts.keep_alive);
                self.head_timer.as_mut().reset(at);
            }
            Exchange::Push => {
                let at = deadline_after(self.opts.post);
                self.post_timer.as_mut().reset(at);
            }
            Exchange::Fetch => {}
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                if e.kind() != ErrorKind::NotConnected {
                    warn!(error = %e, "shutdown failed");
                }
            }
        }
    }
}
