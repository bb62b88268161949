use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ClientConfig, ConfigError, ServeMode, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "hotswap", version, about = "HTTP client/server pair with hot-reloaded payloads")]
pub struct Cli {
    /// Runtime worker threads (defaults to the number of CPUs)
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve (or capture into) the content file
    Server(ServerArgs),
    /// Probe and push the content file to a server
    Client(ClientArgs),
}

#[derive(Args, Debug)]
pub struct ServerArgs {
    /// YAML configuration file; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080
    #[arg(long)]
    pub listen: Option<String>,

    /// Port to listen on (keeps the configured address)
    #[arg(long)]
    pub port: Option<u16>,

    /// Seconds between reloads of the response file
    #[arg(long)]
    pub reload: Option<u64>,

    /// File whose content is served
    #[arg(long)]
    pub response: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub mode: Option<ServeMode>,

    /// Directory for targets other than `/` in serve mode
    #[arg(long)]
    pub doc_root: Option<PathBuf>,

    /// Directory receiving captured request bodies
    #[arg(long)]
    pub audit_dir: Option<PathBuf>,

    /// Seconds a connection may stay silent before it is dropped
    #[arg(long)]
    pub read_timeout: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ClientArgs {
    /// YAML configuration file; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Request target
    #[arg(long)]
    pub path: Option<String>,

    /// Seconds between HEAD requests
    #[arg(long = "keep-alive")]
    pub keep_alive: Option<u64>,

    /// Seconds between POST requests
    #[arg(long = "post-request")]
    pub post_request: Option<u64>,

    /// Seconds between reloads of the request file
    #[arg(long)]
    pub reload: Option<u64>,

    /// File whose content is POSTed
    #[arg(long)]
    pub request: Option<PathBuf>,

    #[arg(long)]
    pub connect_timeout: Option<u64>,

    #[arg(long)]
    pub io_timeout: Option<u64>,

    /// Send one GET, print the response and exit
    #[arg(long)]
    pub once: bool,
}

impl ServerArgs {
    /// Config file (if any) with these flags applied on top, validated.
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let mut cfg = ServerConfig::load(self.config.as_deref())?;

        if let Some(listen) = self.listen {
            cfg.listen_addr = listen;
        }
        if let Some(port) = self.port {
            let mut addr = cfg.socket_addr()?;
            addr.set_port(port);
            cfg.listen_addr = addr.to_string();
        }
        if let Some(reload) = self.reload {
            cfg.reload_secs = reload;
        }
        if let Some(response) = self.response {
            cfg.response_path = response;
        }
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if self.doc_root.is_some() {
            cfg.doc_root = self.doc_root;
        }
        if let Some(dir) = self.audit_dir {
            cfg.audit_dir = dir;
        }
        if let Some(secs) = self.read_timeout {
            cfg.read_timeout_secs = secs;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

impl ClientArgs {
    pub fn into_config(self) -> Result<ClientConfig, ConfigError> {
        let mut cfg = ClientConfig::load(self.config.as_deref())?;

        if let Some(host) = self.host {
            cfg.host = host;
        }
        if let Some(port) = self.port {
            cfg.port = port;
        }
        if let Some(path) = self.path {
            cfg.path = path;
        }
        if let Some(secs) = self.keep_alive {
            cfg.keep_alive_secs = secs;
        }
        if let Some(secs) = self.post_request {
            cfg.post_secs = secs;
        }
        if let Some(secs) = self.reload {
            cfg.reload_secs = secs;
        }
        if let Some(request) = self.request {
            cfg.request_path = request;
        }
        if let Some(secs) = self.connect_timeout {
            cfg.connect_timeout_secs = secs;
        }
        if let Some(secs) = self.io_timeout {
            cfg.io_timeout_secs = secs;
        }
        cfg.once |= self.once;

        cfg.validate()?;
        Ok(cfg)
    }
}
