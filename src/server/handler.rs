//! The dispatch step: turns one parsed request into one response.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::io::AsyncReadExt;

use crate::audit::AuditRecord;
use crate::config::ServeMode;
use crate::http::mime::mime_type;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, SERVER_NAME, StatusCode};
use crate::server::ServerContext;

/// Builds the response for `req`.
///
/// Method and target are validated before anything else, so a rejected
/// request never touches the file system, the content cache or the audit
/// queue. In capture mode a POST body is queued for auditing before the
/// response is built.
pub async fn handle_request(
    ctx: &ServerContext,
    req: Request,
    local: SocketAddr,
    remote: SocketAddr,
) -> Response {
    let keep_alive = req.keep_alive();

    if !method_allowed(ctx.mode, req.method) {
        return Response::bad_request("Unknown HTTP-method", keep_alive);
    }
    if !target_is_legal(&req.path) {
        return Response::bad_request("Illegal request-target", keep_alive);
    }

    match ctx.mode {
        ServeMode::Capture => {
            let method = req.method;
            if method == Method::POST {
                ctx.audit.push(AuditRecord::new(local, remote, req.body));
            }
            snapshot_response(ctx, method, keep_alive)
        }
        ServeMode::Serve => {
            let target = strip_query(&req.path);
            if target == "/" {
                snapshot_response(ctx, req.method, keep_alive)
            } else {
                file_response(ctx, req.method, &req.path, keep_alive).await
            }
        }
    }
}

pub fn method_allowed(mode: ServeMode, method: Method) -> bool {
    match mode {
        ServeMode::Serve => matches!(method, Method::GET | Method::HEAD),
        ServeMode::Capture => matches!(method, Method::POST | Method::HEAD),
    }
}

/// Target must be absolute and free of `..`.
pub fn target_is_legal(target: &str) -> bool {
    target.starts_with('/') && !target.contains("..")
}

fn strip_query(target: &str) -> &str {
    target.split(['?', '#']).next().unwrap_or(target)
}

fn snapshot_response(ctx: &ServerContext, method: Method, keep_alive: bool) -> Response {
    let snapshot = ctx.cache.current();
    let builder = ResponseBuilder::new(StatusCode::Ok)
        .header("Server", SERVER_NAME)
        .header("Content-Type", ctx.cache.content_type())
        .keep_alive(keep_alive);

    if method == Method::HEAD {
        builder.content_length(snapshot.len()).build()
    } else {
        builder.body(snapshot.to_vec()).build()
    }
}

async fn file_response(
    ctx: &ServerContext,
    method: Method,
    target: &str,
    keep_alive: bool,
) -> Response {
    let Some(path) = resolve(ctx, strip_query(target)) else {
        return Response::not_found(target, keep_alive);
    };

    let mut file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Response::not_found(target, keep_alive);
        }
        Err(e) => return Response::server_error(&e.to_string(), keep_alive),
    };

    let size = match file.metadata().await {
        Ok(meta) if meta.is_dir() => return Response::not_found(target, keep_alive),
        Ok(meta) => meta.len() as usize,
        Err(e) => return Response::server_error(&e.to_string(), keep_alive),
    };

    let builder = ResponseBuilder::new(StatusCode::Ok)
        .header("Server", SERVER_NAME)
        .header("Content-Type", mime_type(&path.to_string_lossy()))
        .keep_alive(keep_alive);

    if method == Method::HEAD {
        return builder.content_length(size).build();
    }

    let mut body = Vec::with_capacity(size);
    if let Err(e) = file.read_to_end(&mut body).await {
        return Response::server_error(&e.to_string(), keep_alive);
    }
    builder.body(body).build()
}

/// Maps a target onto the document root, appending `index.html` to
/// directory targets. `None` when no document root is configured.
fn resolve(ctx: &ServerContext, target: &str) -> Option<PathBuf> {
    let root = ctx.doc_root.as_ref()?;
    let mut path = root.join(target.trim_start_matches('/'));
    if target.ends_with('/') {
        path.push("index.html");
    }
    Some(path)
}
