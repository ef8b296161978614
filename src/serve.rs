//! Development server that rebuilds on every request.
//!
//! Each inbound request runs a full build, then serves the requested file
//! from the output root. There is no file watching and no caching: what you
//! see is always what the current sources produce.
//!
//! Request resolution:
//!
//! 1. Build fails → 500 with the error text
//! 2. Exact file match → serve file
//! 3. Directory with `index.html` → serve `index.html`
//! 4. Anything else (including `..` segments) → 404
//!
//! Requests are handled one at a time on the calling thread, so builds never
//! overlap.

use crate::build::{self, BuildError};
use crate::config::SiteConfig;
use crate::paths::INDEX_FILE;
use std::fs;
use std::io::Cursor;
use std::net::{IpAddr, SocketAddr};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("invalid serve.interface {0:?}")]
    Interface(String),
    #[error("failed to bind after {attempts} attempts (ports {first}-{last}): {message}")]
    Bind {
        attempts: u16,
        first: u16,
        last: u16,
        message: String,
    },
}

/// Serve the site rooted at `root` until the process is interrupted.
pub fn serve_site(config: &SiteConfig, root: &Path) -> Result<(), ServeError> {
    let interface: IpAddr = config
        .serve
        .interface
        .parse()
        .map_err(|_| ServeError::Interface(config.serve.interface.clone()))?;
    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    tracing::info!(%addr, "serving");
    println!("Serving on http://{addr}");

    let output_root = config.paths.resolve(root).output;
    for request in server.incoming_requests() {
        let result = match build::build(config, root) {
            Ok(_) => serve_path(request, &output_root),
            Err(err) => serve_build_error(request, &err),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "request error");
        }
    }
    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr), ServeError> {
    let mut last_error = String::new();
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);
        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    tracing::info!(base_port, port, "port in use, using next free port");
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(ServeError::Bind {
        attempts: max_retries,
        first: base_port,
        last: base_port.saturating_add(max_retries.saturating_sub(1)),
        message: last_error,
    })
}

// ============================================================================
// Request Handling
// ============================================================================

/// Map a request URL onto a file under `root`.
///
/// Percent-decodes, drops the query string, and rejects any path that would
/// climb out of `root`.
pub fn resolve_request(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(path).ok()?;

    let mut local = root.to_path_buf();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => local.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    if local.is_file() {
        return Some(local);
    }
    let index = local.join(INDEX_FILE);
    index.is_file().then_some(index)
}

fn serve_path(request: Request, root: &Path) -> std::io::Result<()> {
    match resolve_request(root, request.url()) {
        Some(path) => serve_file(request, &path),
        None => serve_text(request, 404, "404 Not Found"),
    }
}

fn serve_build_error(request: Request, err: &BuildError) -> std::io::Result<()> {
    tracing::error!(error = %err, "build failed");
    serve_text(request, 500, &format!("Build failed: {err}"))
}

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path) -> std::io::Result<()> {
    let content = fs::read(path)?;
    let response = Response::from_data(content).with_header(content_type(guess_content_type(path)));
    request.respond(response)
}

fn serve_text(request: Request, status: u16, text: &str) -> std::io::Result<()> {
    let bytes = text.as_bytes().to_vec();
    let len = bytes.len();
    let response = Response::new(
        StatusCode(status),
        vec![content_type("text/plain; charset=utf-8")],
        Cursor::new(bytes),
        Some(len),
        None,
    );
    request.respond(response)
}

fn content_type(value: &'static str) -> Header {
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes())
        .expect("static header is valid ASCII")
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "xml" => "application/xml; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
