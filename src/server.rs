// =============================================================================
// server.rs: THE FRONT DOOR
// =============================================================================
//
// A one-route HTTP/1.1 server on raw tokio TCP, same school as the metrics
// listener. `GET /` builds the page; everything else gets a 404. Each
// connection runs on its own task and is closed after one response.
//
// Upstream failures never change the status code here. A page where every
// section is empty is still a 200.
// =============================================================================

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::page::build_page;
use crate::render::Renderer;
use crate::sources::Upstream;

/// Header lines read before we give up on a request.
const MAX_HEADER_LINES: usize = 100;

/// Longest request or header line we will buffer. Anything longer is a 400.
const MAX_LINE_BYTES: u64 = 8 * 1024;

/// How long a client gets to deliver the request head.
const HEAD_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a page view needs, shared across connections.
pub struct AppState {
    pub upstream: Upstream,
    pub renderer: Renderer,
}

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Dashboard,
    NotFound,
    BadRequest,
    TimedOut,
}

enum Line {
    Eof,
    Complete(String),
    TooLong,
}

struct HttpResponse {
    status: u16,
    reason: &'static str,
    content_type: &'static str,
    body: String,
}

impl HttpResponse {
    fn html(body: String) -> Self {
        Self {
            status: 200,
            reason: "OK",
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    fn text(status: u16, reason: &'static str) -> Self {
        Self {
            status,
            reason,
            content_type: "text/plain; charset=utf-8",
            body: format!("{} {}\n", status, reason),
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            self.reason,
            self.content_type,
            self.body.len(),
            self.body,
        )
        .into_bytes()
    }
}

/// Accept connections until shutdown flips.
pub async fn run_dashboard_server(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: &mut watch::Receiver<bool>,
) {
    if let Ok(addr) = listener.local_addr() {
        info!("🌐 Dashboard listening on http://{}", addr);
    }

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer)) => {
                        let state = state.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, state).await {
                                debug!(peer = %peer, error = %e, "Connection ended with an I/O error");
                            }
                        });
                    }
                    Err(e) => {
                        error!("Dashboard accept error: {}", e);
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("Dashboard server: shutting down");
                break;
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, state: Arc<AppState>) -> io::Result<()> {
    let matched = {
        let mut reader = BufReader::new(&mut stream);
        match tokio::time::timeout(HEAD_READ_TIMEOUT, read_head(&mut reader)).await {
            Ok(head) => match head? {
                Some(route) => route,
                None => return Ok(()),
            },
            Err(_) => Route::TimedOut,
        }
    };

    let response = match matched {
        Route::Dashboard => {
            let request_id = Uuid::new_v4();
            serve_dashboard(&state)
                .instrument(info_span!("page", %request_id))
                .await
        }
        Route::NotFound => HttpResponse::text(404, "Not Found"),
        Route::BadRequest => HttpResponse::text(400, "Bad Request"),
        Route::TimedOut => HttpResponse::text(408, "Request Timeout"),
    };

    stream.write_all(&response.into_bytes()).await?;
    stream.shutdown().await
}

/// Read the request line and drain the headers. `None` means the client
/// hung up before sending anything.
async fn read_head<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<Option<Route>> {
    let request_line = match read_capped_line(reader).await? {
        Line::Eof => return Ok(None),
        Line::TooLong => return Ok(Some(Route::BadRequest)),
        Line::Complete(line) => line,
    };

    // GETs carry no body worth reading.
    for _ in 0..MAX_HEADER_LINES {
        match read_capped_line(reader).await? {
            Line::Eof => break,
            Line::TooLong => return Ok(Some(Route::BadRequest)),
            Line::Complete(line) if line == "\r\n" || line == "\n" => break,
            Line::Complete(_) => {}
        }
    }

    Ok(Some(route(&request_line)))
}

async fn read_capped_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<Line> {
    let mut buf = Vec::new();
    let n = (&mut *reader).take(MAX_LINE_BYTES).read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(Line::Eof);
    }
    if !buf.ends_with(b"\n") && n as u64 >= MAX_LINE_BYTES {
        return Ok(Line::TooLong);
    }
    Ok(Line::Complete(String::from_utf8_lossy(&buf).into_owned()))
}

async fn serve_dashboard(state: &AppState) -> HttpResponse {
    state.upstream.metrics().increment_pages();
    let ctx = build_page(&state.upstream).await;

    match state.renderer.render(&ctx) {
        Ok(html) => HttpResponse::html(html),
        Err(e) => {
            error!(error = %e, "Template rendering failed");
            HttpResponse::text(500, "Internal Server Error")
        }
    }
}

/// `GET /` (query string ignored) is the only page.
fn route(request_line: &str) -> Route {
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next()) else {
        return Route::BadRequest;
    };
    if !version.starts_with("HTTP/") {
        return Route::BadRequest;
    }

    let path = target.split('?').next().unwrap_or(target);
    if method == "GET" && path == "/" {
        Route::Dashboard
    } else {
        Route::NotFound
    }
}
