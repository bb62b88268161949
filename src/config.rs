//! Process configuration for both sides.
//!
//! Values come from an optional YAML file, then command-line overrides, then
//! [`validate`](ServerConfig::validate). Nothing reaches the core until
//! validation passes.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0} must be a positive number of seconds")]
    NonPositive(&'static str),

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid listen address '{0}'")]
    ListenAddr(String),

    #[error("bad path_to_{kind} {}: {source}", path.display())]
    ContentFile {
        kind: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("document root {} is not a directory", .0.display())]
    DocRoot(PathBuf),

    #[error("invalid target url: {0}")]
    Url(#[from] url::ParseError),
}

/// Which requests the server accepts and what it does with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ServeMode {
    /// GET/HEAD: `/` serves the content file, other targets the document root.
    #[default]
    Serve,
    /// POST/HEAD: request bodies are audited, responses carry the content file.
    Capture,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub reload_secs: u64,
    pub response_path: PathBuf,
    pub mode: ServeMode,
    pub doc_root: Option<PathBuf>,
    pub audit_dir: PathBuf,
    pub read_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            reload_secs: 30,
            response_path: PathBuf::new(),
            mode: ServeMode::Serve,
            doc_root: None,
            audit_dir: PathBuf::from("audit"),
            read_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Defaults, overlaid with the YAML file when one is given, then with
    /// the `LISTEN` environment variable.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg: Self = match path {
            Some(path) => from_yaml_file(path)?,
            None => Self::default(),
        };

        if let Ok(listen) = std::env::var("LISTEN") {
            cfg.listen_addr = listen;
        }

        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        positive("reload", self.reload_secs)?;
        positive("read-timeout", self.read_timeout_secs)?;
        readable("response", &self.response_path)?;

        if let Some(root) = &self.doc_root {
            if !root.is_dir() {
                return Err(ConfigError::DocRoot(root.clone()));
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr
            .parse()
            .map_err(|_| ConfigError::ListenAddr(self.listen_addr.clone()))
    }

    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub keep_alive_secs: u64,
    pub post_secs: u64,
    pub reload_secs: u64,
    pub request_path: PathBuf,
    pub connect_timeout_secs: u64,
    pub io_timeout_secs: u64,
    /// Issue a single GET and exit instead of the recurring HEAD/POST loop.
    pub once: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 80,
            path: "/".to_string(),
            keep_alive_secs: 10,
            post_secs: 20,
            reload_secs: 30,
            request_path: PathBuf::new(),
            connect_timeout_secs: 10,
            io_timeout_secs: 30,
            once: false,
        }
    }
}

impl ClientConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => from_yaml_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing("host"));
        }
        if self.port == 0 {
            return Err(ConfigError::Missing("port"));
        }
        positive("keep-alive", self.keep_alive_secs)?;
        positive("post-request", self.post_secs)?;
        positive("reload", self.reload_secs)?;
        positive("connect-timeout", self.connect_timeout_secs)?;
        positive("io-timeout", self.io_timeout_secs)?;
        self.target_url()?;

        if !self.once {
            readable("request", &self.request_path)?;
        }

        Ok(())
    }

    /// `http://{host}:{port}{path}`
    pub fn target_url(&self) -> Result<Url, ConfigError> {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        Ok(Url::parse(&format!("http://{}:{}{}", self.host, self.port, path))?)
    }

    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn post_interval(&self) -> Duration {
        Duration::from_secs(self.post_secs)
    }

    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

fn from_yaml_file<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(serde_yaml::from_str(&content)?)
}

fn positive(name: &'static str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 {
        return Err(ConfigError::NonPositive(name));
    }
    Ok(())
}

fn readable(kind: &'static str, path: &Path) -> Result<(), ConfigError> {
    std::fs::File::open(path)
        .map(|_| ())
        .map_err(|source| ConfigError::ContentFile {
            kind,
            path: path.to_path_buf(),
            source,
        })
}
