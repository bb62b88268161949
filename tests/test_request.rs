use hotswap::http::request::{Method, Request, RequestBuilder};
use std::collections::HashMap;

fn request(version: &str, headers: &[(&str, &str)]) -> Request {
    Request {
        method: Method::GET,
        path: "/".to_string(),
        version: version.to_string(),
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body: vec![],
    }
}

#[test]
fn test_request_header_lookup_ignores_case() {
    let req = request(
        "HTTP/1.1",
        &[("Host", "example.com"), ("content-type", "application/json")],
    );

    assert_eq!(req.header("host"), Some("example.com"));
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    assert_eq!(req.header("Missing"), None);
}

#[test]
fn test_request_content_length_parsing() {
    assert_eq!(request("HTTP/1.1", &[("Content-Length", "42")]).content_length(), 42);
    assert_eq!(request("HTTP/1.1", &[]).content_length(), 0);
    assert_eq!(
        request("HTTP/1.1", &[("Content-Length", "not-a-number")]).content_length(),
        0
    );
}

#[test]
fn test_request_keep_alive_http11_default() {
    assert!(request("HTTP/1.1", &[]).keep_alive());
}

#[test]
fn test_request_keep_alive_http10_default() {
    assert!(!request("HTTP/1.0", &[]).keep_alive());
    assert!(request("HTTP/1.0", &[("Connection", "Keep-Alive")]).keep_alive());
}

#[test]
fn test_request_keep_alive_close() {
    assert!(!request("HTTP/1.1", &[("Connection", "close")]).keep_alive());
    assert!(!request("HTTP/1.1", &[("connection", "CLOSE")]).keep_alive());
}

#[test]
fn test_request_method_from_string() {
    assert_eq!(Method::from_str("GET"), Some(Method::GET));
    assert_eq!(Method::from_str("HEAD"), Some(Method::HEAD));
    assert_eq!(Method::from_str("POST"), Some(Method::POST));
    assert_eq!(Method::from_str("INVALID"), None);
    assert_eq!(Method::from_str("get"), None); // Case-sensitive
}

#[test]
fn test_request_method_display() {
    assert_eq!(Method::PATCH.to_string(), "PATCH");
    assert_eq!(Method::HEAD.as_str(), "HEAD");
}

#[test]
fn test_request_builder_defaults_version() {
    let req = RequestBuilder::new()
        .method(Method::HEAD)
        .path("/")
        .build()
        .unwrap();

    assert_eq!(req.version, "HTTP/1.1");
    assert!(req.headers.is_empty());
}

#[test]
fn test_request_builder_frames_body() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .path("/ingest")
        .header("Content-Type", "text/plain")
        .body("payload")
        .build()
        .unwrap();

    assert_eq!(req.header("Content-Length"), Some("7"));
    assert_eq!(req.content_length(), req.body.len());
}

#[test]
fn test_request_builder_empty_post_declares_zero() {
    let req = RequestBuilder::new()
        .method(Method::POST)
        .path("/")
        .build()
        .unwrap();

    assert_eq!(req.header("Content-Length"), Some("0"));
}

#[test]
fn test_request_builder_requires_method_and_path() {
    assert!(RequestBuilder::new().path("/").build().is_err());
    assert!(RequestBuilder::new().method(Method::GET).build().is_err());
}

#[test]
fn test_request_headers_map_is_plain() {
    let mut headers = HashMap::new();
    headers.insert("X-Trace".to_string(), "abc".to_string());
    let req = Request {
        method: Method::POST,
        path: "/api".to_string(),
        version: "HTTP/1.1".to_string(),
        headers,
        body: b"test body content".to_vec(),
    };

    assert_eq!(req.header("x-trace"), Some("abc"));
    assert_eq!(req.body, b"test body content".to_vec());
}
