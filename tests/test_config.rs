use std::path::Path;
use std::time::Duration;

use clap::Parser;
use hotswap::cli::{Cli, Command};
use hotswap::config::{ClientConfig, ConfigError, ServeMode, ServerConfig};
use tempfile::TempDir;

fn touch(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, "x").unwrap();
    path.to_string_lossy().into_owned()
}

fn server_cli(args: &[&str]) -> Result<ServerConfig, ConfigError> {
    let mut argv = vec!["hotswap", "server"];
    argv.extend_from_slice(args);
    match Cli::try_parse_from(argv).unwrap().command {
        Command::Server(args) => args.into_config(),
        Command::Client(_) => unreachable!(),
    }
}

fn client_cli(args: &[&str]) -> Result<ClientConfig, ConfigError> {
    let mut argv = vec!["hotswap", "client"];
    argv.extend_from_slice(args);
    match Cli::try_parse_from(argv).unwrap().command {
        Command::Client(args) => args.into_config(),
        Command::Server(_) => unreachable!(),
    }
}

// The only test touching LISTEN; tests in this binary run concurrently.
#[test]
fn test_server_listen_env_overrides_defaults() {
    unsafe {
        std::env::remove_var("LISTEN");
    }
    assert_eq!(ServerConfig::load(None).unwrap().listen_addr, "127.0.0.1:8080");

    unsafe {
        std::env::set_var("LISTEN", "0.0.0.0:3000");
    }
    let cfg = ServerConfig::load(None).unwrap();
    unsafe {
        std::env::remove_var("LISTEN");
    }
    assert_eq!(cfg.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.socket_addr().unwrap().port(), 3000);
}

#[test]
fn test_server_yaml_file() {
    let dir = TempDir::new().unwrap();
    let response = touch(dir.path(), "response.json");
    let cfg_path = dir.path().join("server.yaml");
    std::fs::write(
        &cfg_path,
        format!("reload_secs: 5\nresponse_path: {response}\nmode: capture\n"),
    )
    .unwrap();

    let cfg = ServerConfig::load(Some(&cfg_path)).unwrap();

    assert_eq!(cfg.reload_interval(), Duration::from_secs(5));
    assert_eq!(cfg.mode, ServeMode::Capture);
    // Unset keys keep their defaults.
    assert_eq!(cfg.read_timeout(), Duration::from_secs(30));
    cfg.validate().unwrap();
}

#[test]
fn test_server_yaml_errors() {
    let dir = TempDir::new().unwrap();

    let missing = ServerConfig::load(Some(&dir.path().join("absent.yaml")));
    assert!(matches!(missing, Err(ConfigError::Read { .. })));

    let bad = dir.path().join("bad.yaml");
    std::fs::write(&bad, "reload_secs: [not a number]\n").unwrap();
    assert!(matches!(
        ServerConfig::load(Some(&bad)),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_server_validation() {
    let dir = TempDir::new().unwrap();
    let response = touch(dir.path(), "response.txt");

    let cfg = ServerConfig {
        response_path: response.clone().into(),
        ..ServerConfig::default()
    };
    cfg.validate().unwrap();

    let zero_reload = ServerConfig {
        reload_secs: 0,
        ..cfg.clone()
    };
    assert!(matches!(
        zero_reload.validate(),
        Err(ConfigError::NonPositive("reload"))
    ));

    let bad_listen = ServerConfig {
        listen_addr: "localhost".to_string(),
        ..cfg.clone()
    };
    assert!(matches!(bad_listen.validate(), Err(ConfigError::ListenAddr(_))));

    let no_file = ServerConfig {
        response_path: dir.path().join("gone.txt"),
        ..cfg.clone()
    };
    let err = no_file.validate().unwrap_err();
    assert!(err.to_string().starts_with("bad path_to_response"));

    let file_as_root = ServerConfig {
        doc_root: Some(response.into()),
        ..cfg
    };
    assert!(matches!(file_as_root.validate(), Err(ConfigError::DocRoot(_))));
}

#[test]
fn test_server_cli_overrides() {
    let dir = TempDir::new().unwrap();
    let response = touch(dir.path(), "response.txt");

    let cfg = server_cli(&[
        "--listen",
        "127.0.0.1:8080",
        "--port",
        "9000",
        "--reload",
        "2",
        "--response",
        &response,
        "--mode",
        "capture",
    ])
    .unwrap();

    assert_eq!(cfg.listen_addr, "127.0.0.1:9000");
    assert_eq!(cfg.reload_secs, 2);
    assert_eq!(cfg.mode, ServeMode::Capture);

    let err = server_cli(&["--response", &response, "--reload", "0"]).unwrap_err();
    assert!(matches!(err, ConfigError::NonPositive("reload")));
}

#[test]
fn test_client_defaults_and_url() {
    let cfg = ClientConfig {
        host: "localhost".to_string(),
        path: "status".to_string(),
        ..ClientConfig::default()
    };

    assert_eq!(cfg.keep_alive_interval(), Duration::from_secs(10));
    assert_eq!(cfg.post_interval(), Duration::from_secs(20));
    assert_eq!(cfg.target_url().unwrap().as_str(), "http://localhost/status");
}

#[test]
fn test_client_validation() {
    let dir = TempDir::new().unwrap();
    let request = touch(dir.path(), "request.json");

    let no_host = client_cli(&["--request", &request]).unwrap_err();
    assert!(matches!(no_host, ConfigError::Missing("host")));

    let zero_post = client_cli(&["--host", "h", "--request", &request, "--post-request", "0"])
        .unwrap_err();
    assert!(matches!(zero_post, ConfigError::NonPositive("post-request")));

    let no_request = client_cli(&["--host", "h"]).unwrap_err();
    assert!(no_request.to_string().starts_with("bad path_to_request"));

    // A one-shot GET sends nothing, so it needs no request file.
    let once = client_cli(&["--host", "h", "--once"]).unwrap();
    assert!(once.once);
}

#[test]
fn test_client_cli_overrides_yaml() {
    let dir = TempDir::new().unwrap();
    let request = touch(dir.path(), "request.json");
    let cfg_path = dir.path().join("client.yaml");
    std::fs::write(
        &cfg_path,
        format!("host: example.com\nport: 8081\nkeep_alive_secs: 3\nrequest_path: {request}\n"),
    )
    .unwrap();
    let cfg_arg = cfg_path.to_string_lossy().into_owned();

    let cfg = client_cli(&["--config", &cfg_arg, "--port", "9090", "--keep-alive", "7"]).unwrap();

    assert_eq!(cfg.host, "example.com");
    assert_eq!(cfg.port, 9090);
    assert_eq!(cfg.keep_alive_secs, 7);
    assert_eq!(cfg.post_secs, 20);
}
