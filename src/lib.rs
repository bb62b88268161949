//! hotswap - HTTP client/server pair with hot-reloaded payloads
//!
//! The server answers from a file that is re-read on a timer and swapped in
//! without disturbing open connections, and can capture every POST body to
//! disk. The client keeps one connection open and periodically probes it
//! with HEAD and pushes its own hot-reloaded file with POST.

pub mod audit;
pub mod cli;
pub mod client;
pub mod config;
pub mod content;
pub mod http;
pub mod lifecycle;
pub mod scheduler;
pub mod server;
