// Test rig: a throwaway HTTP server that plays the part of an upstream.
//
// Same raw-TCP approach as the metrics listener. It answers every request
// with the same canned status and body, and counts how many times it was
// dialled so tests can prove a request did (or did not) happen.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::config::Config;
use crate::metrics::MetricsCollector;
use crate::sources::Upstream;

pub struct StubUpstream {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl StubUpstream {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Spawn a stub that answers every request with `status` and `body`.
pub async fn stub_upstream(status: u16, content_type: &str, body: &str) -> StubUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let response = format!(
        "HTTP/1.1 {} STUB\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body,
    );

    let counter = hits.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let response = response.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut seen = Vec::new();
                // Read until the end of the request head; GETs have no body.
                while let Ok(n) = stream.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                    seen.extend_from_slice(&buf[..n]);
                    if seen.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    StubUpstream {
        url: format!("http://{}/", addr),
        hits,
    }
}

/// A URL on a port nothing is listening on. Connects get refused.
pub async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", addr)
}

/// Config with every upstream pointed at `url`.
pub fn config_pointing_at(url: &str) -> Config {
    Config {
        request_timeout: std::time::Duration::from_secs(5),
        news_url: url.to_string(),
        repos_url: url.to_string(),
        models_url: url.to_string(),
        papers_url: url.to_string(),
        videos_url: url.to_string(),
        ..Config::default()
    }
}

pub fn upstream(config: Config) -> Upstream {
    Upstream::new(Arc::new(config), Arc::new(MetricsCollector::new())).unwrap()
}
