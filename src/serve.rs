//! Development server for watch mode.
//!
//! Serves the output directory over HTTP while a watcher thread rebuilds
//! changed sources. The Director holds single-threaded state, so the
//! watcher thread builds its own from the cloned configuration and site.
//! Ctrl+C unblocks the request loop, stops the watcher and joins it
//! before returning.

use crate::config::Configuration;
use crate::director::Director;
use crate::error::{AbortError, Result};
use crate::log;
use crate::site::Site;
use crate::watch;
use std::{
    fs,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Retry on busy ports so a second session "just works".
const MAX_PORT_RETRIES: u16 = 10;

/// Serve the output directory and rebuild on source changes.
///
/// Blocks until Ctrl+C.
pub fn serve_site(config: Configuration, site: Site, port: u16) -> Result<()> {
    let outdir = match &config.outdir {
        Some(outdir) => outdir.clone(),
        None => site.output_root(),
    };

    let interface = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let (server, addr) = try_bind_port(interface, port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);
    let stop = Arc::new(AtomicBool::new(false));

    let server_for_signal = Arc::clone(&server);
    let stop_for_signal = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down ...");
        stop_for_signal.store(true, Ordering::SeqCst);
        server_for_signal.unblock();
    })
    .map_err(|err| AbortError::msg(format!("failed to set Ctrl+C handler: {err}")))?;

    log!("serve"; "http://{addr}");

    let stop_for_watcher = Arc::clone(&stop);
    let watcher = std::thread::spawn(move || {
        // The Director is not Send; build one on this thread.
        let mut director = match Director::new(config, site) {
            Ok(director) => director,
            Err(err) => {
                log!("watch"; "{err}");
                return;
            }
        };
        if let Err(err) = watch::watch_site(&mut director, &stop_for_watcher) {
            log!("watch"; "{err}");
        }
    });

    for request in server.incoming_requests() {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        if let Err(err) = handle_request(request, &outdir) {
            log!("serve"; "request error: {err}");
        }
    }

    stop.store(true, Ordering::SeqCst);
    watcher
        .join()
        .map_err(|_| AbortError::msg("watcher thread panicked"))?;
    Ok(())
}

fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {base_port} in use, using {port} instead");
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < max_retries => continue,
            Err(err) => {
                return Err(AbortError::msg(format!(
                    "failed to bind after {max_retries} attempts (ports {base_port}-{port}): {err}"
                )));
            }
        }
    }
    unreachable!()
}

/// Resolve one request against the output tree: exact file, then a
/// directory's `index.html`, then 404.
fn handle_request(request: Request, serve_root: &Path) -> Result<()> {
    let url_path = urlencoding::decode(request.url())
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();
    let path_without_query = url_path.split('?').next().unwrap_or(&url_path);
    let request_path = path_without_query.trim_matches('/');
    let local_path = resolve_request_path(serve_root, request_path);

    if local_path.is_file() {
        return serve_file(request, &local_path);
    }

    if local_path.is_dir() {
        let index_path = local_path.join("index.html");
        if index_path.is_file() {
            return serve_file(request, &index_path);
        }
    }

    serve_not_found(request)
}

/// Join the request path onto the serve root, refusing traversal above it.
fn resolve_request_path(serve_root: &Path, request_path: &str) -> PathBuf {
    let mut resolved = serve_root.to_path_buf();
    for part in request_path.split('/') {
        if part.is_empty() || part == "." || part == ".." {
            continue;
        }
        resolved.push(part);
    }
    resolved
}

fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).map_err(AbortError::io(path))?;
    let content_type = guess_content_type(path);

    let response = Response::from_data(content).with_header(
        Header::from_bytes("Content-Type", content_type)
            .map_err(|_| AbortError::msg("invalid content-type header"))?,
    );
    request
        .respond(response)
        .map_err(AbortError::io(path))?;
    Ok(())
}

fn serve_not_found(request: Request) -> Result<()> {
    let body = "404 Not Found";
    let response = Response::new(
        StatusCode(404),
        Vec::new(),
        std::io::Cursor::new(body),
        Some(body.len()),
        None,
    );
    request
        .respond(response)
        .map_err(|err| AbortError::msg(format!("failed to respond: {err}")))?;
    Ok(())
}

/// MIME type from the file extension, octet-stream for the rest.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml" | "atom") => "application/xml; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        _ => "application/octet-stream",
    }
}
