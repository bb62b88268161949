use crate::http::request::{Method, Request, is_method_token};
use crate::http::response::{Response, StatusCode};
use std::collections::HashMap;

/// Upper bound on the request/status line plus headers.
pub const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Upper bound on a request body a peer may declare.
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed start line")]
    InvalidRequest,
    #[error("unknown method")]
    InvalidMethod,
    #[error("malformed status code")]
    InvalidStatus,
    #[error("malformed header line")]
    InvalidHeader,
    #[error("malformed Content-Length")]
    InvalidContentLength,
    #[error("message exceeds size limit")]
    TooLarge,
    #[error("incomplete message")]
    Incomplete,
}

/// Parses one request from the front of `buf`.
///
/// Returns the request and the number of bytes it occupied, or
/// `ParseError::Incomplete` when more bytes are needed.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let (head, headers_end) = split_head(buf)?;
    let mut lines = head.split("\r\n");

    let request_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = request_line.split_whitespace();

    let method_str = parts.next().ok_or(ParseError::InvalidRequest)?;
    let path = parts.next().ok_or(ParseError::InvalidRequest)?;
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;

    // Unknown but well-formed verbs still frame a request; rejecting them
    // is up to the handler.
    let method = match Method::from_str(method_str) {
        Some(method) => method,
        None if is_method_token(method_str) => Method::Other,
        None => return Err(ParseError::InvalidMethod),
    };
    let headers = parse_headers(lines)?;

    let content_length = declared_length(&headers)?.unwrap_or(0);
    if content_length > MAX_BODY_BYTES {
        return Err(ParseError::TooLarge);
    }
    let body_bytes = &buf[headers_end + 4..];
    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body: body_bytes[..content_length].to_vec(),
    };

    Ok((request, headers_end + 4 + content_length))
}

/// Parses one response from the front of `buf`.
///
/// `head_request` must be set when the response answers a HEAD: such a
/// response declares a Content-Length but carries no body. A missing
/// Content-Length is read as an empty body since the connection stays open.
pub fn parse_http_response(
    buf: &[u8],
    head_request: bool,
) -> Result<(Response, usize), ParseError> {
    let (head, headers_end) = split_head(buf)?;
    let mut lines = head.split("\r\n");

    let status_line = lines.next().ok_or(ParseError::InvalidRequest)?;
    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().ok_or(ParseError::InvalidRequest)?;
    if !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidRequest);
    }
    let code: u16 = parts
        .next()
        .and_then(|c| c.parse().ok())
        .ok_or(ParseError::InvalidStatus)?;

    let headers = parse_headers(lines)?;

    let content_length = if head_request {
        0
    } else {
        declared_length(&headers)?.unwrap_or(0)
    };
    let body_bytes = &buf[headers_end + 4..];
    if body_bytes.len() < content_length {
        return Err(ParseError::Incomplete);
    }

    let response = Response {
        status: StatusCode::from_u16(code),
        headers,
        body: body_bytes[..content_length].to_vec(),
    };

    Ok((response, headers_end + 4 + content_length))
}

fn split_head(buf: &[u8]) -> Result<(&str, usize), ParseError> {
    let Some(headers_end) = find_headers_end(buf) else {
        if buf.len() > MAX_HEADER_BYTES {
            return Err(ParseError::TooLarge);
        }
        return Err(ParseError::Incomplete);
    };

    let head = std::str::from_utf8(&buf[..headers_end]).map_err(|_| ParseError::InvalidRequest)?;
    Ok((head, headers_end))
}

fn parse_headers<'a>(
    lines: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, String>, ParseError> {
    let mut headers = HashMap::new();

    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;

        headers.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(headers)
}

fn declared_length(headers: &HashMap<String, String>) -> Result<Option<usize>, ParseError> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
        .map(|(_, v)| v.parse::<usize>().map_err(|_| ParseError::InvalidContentLength))
        .transpose()
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
