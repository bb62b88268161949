use hotswap::http::parser::{
    MAX_BODY_BYTES, ParseError, parse_http_request, parse_http_response,
};
use hotswap::http::request::Method;
use hotswap::http::response::StatusCode;

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.path, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_post_request_with_body() {
    let req = b"POST /ingest HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.path, "/ingest");
    assert_eq!(parsed.body, b"hello".to_vec());
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_lowercase_content_length() {
    let req = b"POST / HTTP/1.1\r\ncontent-length: 3\r\n\r\nabcEXTRA";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.body, b"abc".to_vec());
    assert_eq!(consumed, req.len() - "EXTRA".len());
}

#[test]
fn test_parse_request_with_query_string() {
    let req = b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.path, "/search?q=rust");
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";

    assert!(matches!(parse_http_request(req), Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_incomplete_request_partial_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello";

    assert!(matches!(parse_http_request(req), Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_unknown_method_still_frames_request() {
    let req = b"TRACE /x HTTP/1.1\r\nConnection: keep-alive\r\n\r\nGET / HTTP/1.1\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::Other);
    assert_eq!(parsed.path, "/x");
    assert!(parsed.keep_alive());

    let (next, _) = parse_http_request(&req[consumed..]).unwrap();
    assert_eq!(next.method, Method::GET);
}

#[test]
fn test_parse_non_token_method() {
    let req = "G\u{c9}T / HTTP/1.1\r\n\r\n";

    assert!(matches!(
        parse_http_request(req.as_bytes()),
        Err(ParseError::InvalidMethod)
    ));
}

#[test]
fn test_parse_body_over_limit() {
    let req = format!(
        "POST / HTTP/1.1\r\nContent-Length: {}\r\n\r\npartial",
        MAX_BODY_BYTES + 1
    );

    assert!(matches!(
        parse_http_request(req.as_bytes()),
        Err(ParseError::TooLarge)
    ));
}

#[test]
fn test_parse_body_at_limit_waits_for_bytes() {
    let req = format!("POST / HTTP/1.1\r\nContent-Length: {MAX_BODY_BYTES}\r\n\r\n");

    assert!(matches!(
        parse_http_request(req.as_bytes()),
        Err(ParseError::Incomplete)
    ));
}

#[test]
fn test_parse_missing_version() {
    let req = b"GET /\r\n\r\n";

    assert!(matches!(parse_http_request(req), Err(ParseError::InvalidRequest)));
}

#[test]
fn test_parse_malformed_header() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n";

    assert!(matches!(parse_http_request(req), Err(ParseError::InvalidHeader)));
}

#[test]
fn test_parse_bad_content_length() {
    let req = b"POST / HTTP/1.1\r\nContent-Length: lots\r\n\r\n";

    assert!(matches!(
        parse_http_request(req),
        Err(ParseError::InvalidContentLength)
    ));
}

#[test]
fn test_parse_request_with_binary_body() {
    let req = b"POST /upload HTTP/1.1\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.body, vec![0, 1, 2, 3]);
}

#[test]
fn test_parse_response_with_body() {
    let buf = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nv1";
    let (resp, consumed) = parse_http_response(buf, false).unwrap();

    assert_eq!(resp.status, StatusCode::Ok);
    assert_eq!(resp.header("content-type"), Some("text/plain"));
    assert_eq!(resp.body, b"v1".to_vec());
    assert_eq!(consumed, buf.len());
}

#[test]
fn test_parse_response_unknown_status() {
    let buf = b"HTTP/1.1 418 I'm a teapot\r\nContent-Length: 0\r\n\r\n";
    let (resp, _) = parse_http_response(buf, false).unwrap();

    assert_eq!(resp.status, StatusCode::Other(418));
    assert!(!resp.status.is_success());
}

#[test]
fn test_parse_response_without_length_is_empty() {
    let buf = b"HTTP/1.1 204 No Content\r\n\r\n";
    let (resp, consumed) = parse_http_response(buf, false).unwrap();

    assert!(resp.body.is_empty());
    assert_eq!(consumed, buf.len());
}

#[test]
fn test_parse_response_bad_status() {
    let buf = b"HTTP/1.1 abc OK\r\n\r\n";

    assert!(matches!(
        parse_http_response(buf, false),
        Err(ParseError::InvalidStatus)
    ));
}

#[test]
fn test_parse_back_to_back_responses() {
    let buf = b"HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\n\
HTTP/1.1 200 OK\r\nContent-Length: 1\r\n\r\nxyz";

    // The first answers a HEAD: its declared length describes no bytes.
    let (head, used) = parse_http_response(buf, true).unwrap();
    assert!(head.body.is_empty());

    let (get, rest) = parse_http_response(&buf[used..], false).unwrap();
    assert_eq!(get.body, b"x".to_vec());
    assert_eq!(used + rest, buf.len() - 2);
}
