// ═══════════════════════════════════════════════════════════════
// METRICS COLLECTOR - The page never admits an upstream failed. This does.
// ═══════════════════════════════════════════════════════════════
//
// Every fetcher swallows its errors so the page always renders. That is
// great for the page and terrible for whoever has to figure out why the
// videos section has been empty since Tuesday. So the failures get counted
// here, per source, with atomics, and served as JSON on their own port.
//
// The metrics listener is deliberately NOT a route on the dashboard. The
// dashboard has exactly one page and we intend to keep it that way.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{info, error};
use serde::Serialize;

use crate::models::Source;

/// Per-source counters, as serialized.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SourceSnapshot {
    /// Requests actually sent. The credential short-circuit does not count.
    pub attempts: u64,
    pub failures: u64,
    /// Total entries returned across all successful fetches.
    pub items: u64,
}

/// The metrics snapshot - what gets serialized to JSON
#[derive(Debug, Serialize, Clone)]
pub struct MetricsSnapshot {
    pub pages_served: u64,
    pub sources: BTreeMap<&'static str, SourceSnapshot>,
    pub uptime_seconds: u64,
    pub pages_per_minute: f64,
    pub status: String,
}

#[derive(Default)]
struct SourceCounters {
    attempts: AtomicU64,
    failures: AtomicU64,
    items: AtomicU64,
}

impl SourceCounters {
    fn snapshot(&self) -> SourceSnapshot {
        SourceSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            items: self.items.load(Ordering::Relaxed),
        }
    }
}

/// Thread-safe atomic metrics collector, shared by every request.
pub struct MetricsCollector {
    pages_served: AtomicU64,
    news: SourceCounters,
    repos: SourceCounters,
    models: SourceCounters,
    papers: SourceCounters,
    videos: SourceCounters,
    start_time: Instant,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            pages_served: AtomicU64::new(0),
            news: SourceCounters::default(),
            repos: SourceCounters::default(),
            models: SourceCounters::default(),
            papers: SourceCounters::default(),
            videos: SourceCounters::default(),
            start_time: Instant::now(),
        }
    }

    fn counters(&self, source: Source) -> &SourceCounters {
        match source {
            Source::News => &self.news,
            Source::Repos => &self.repos,
            Source::Models => &self.models,
            Source::Papers => &self.papers,
            Source::Videos => &self.videos,
        }
    }

    pub fn increment_pages(&self) {
        self.pages_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attempt(&self, source: Source) {
        self.counters(source).attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, source: Source) {
        self.counters(source).failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_items(&self, source: Source, count: usize) {
        self.counters(source)
            .items
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Take a snapshot of all metrics (lock-free reads)
    pub fn snapshot(&self) -> MetricsSnapshot {
        let uptime = self.start_time.elapsed().as_secs();
        let pages = self.pages_served.load(Ordering::Relaxed);
        let pages_per_minute = if uptime > 0 {
            (pages as f64 / uptime as f64) * 60.0
        } else {
            0.0
        };

        let sources = Source::ALL
            .iter()
            .map(|source| (source.key(), self.counters(*source).snapshot()))
            .collect();

        MetricsSnapshot {
            pages_served: pages,
            sources,
            uptime_seconds: uptime,
            pages_per_minute,
            status: "operational".to_string(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Serve the JSON snapshot to anyone who connects, until shutdown.
/// Any request on any path gets the same answer.
pub async fn run_metrics_server(
    listener: tokio::net::TcpListener,
    metrics: Arc<MetricsCollector>,
    shutdown: &mut watch::Receiver<bool>,
) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    if let Ok(addr) = listener.local_addr() {
        info!("📊 Metrics server listening on http://{}", addr);
    }

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((mut stream, _addr)) => {
                        // Drain whatever request line the client sent; we answer the same regardless.
                        let mut scratch = [0u8; 1024];
                        let _ = stream.read(&mut scratch).await;

                        let snapshot = metrics.snapshot();
                        let json = serde_json::to_string_pretty(&snapshot)
                            .unwrap_or_else(|_| "{}".to_string());

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nAccess-Control-Allow-Origin: *\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            json.len(),
                            json,
                        );

                        let _ = stream.write_all(response.as_bytes()).await;
                        let _ = stream.shutdown().await;
                    }
                    Err(e) => {
                        error!("Metrics server accept error: {}", e);
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("Metrics server: shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_per_source() {
        let metrics = MetricsCollector::new();
        metrics.record_attempt(Source::News);
        metrics.record_attempt(Source::News);
        metrics.record_failure(Source::News);
        metrics.record_items(Source::Papers, 5);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sources["news"], SourceSnapshot { attempts: 2, failures: 1, items: 0 });
        assert_eq!(snapshot.sources["papers"].items, 5);
        assert_eq!(snapshot.sources["videos"], SourceSnapshot { attempts: 0, failures: 0, items: 0 });
    }

    #[test]
    fn test_snapshot_lists_every_source() {
        let snapshot = MetricsCollector::new().snapshot();
        assert_eq!(snapshot.sources.len(), Source::ALL.len());
        assert_eq!(snapshot.pages_served, 0);
    }

    #[tokio::test]
    async fn test_metrics_server_serves_json_and_stops_on_shutdown() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let metrics = Arc::new(MetricsCollector::new());
        metrics.increment_pages();

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let server_metrics = metrics.clone();
        let handle = tokio::spawn(async move {
            run_metrics_server(listener, server_metrics, &mut shutdown_rx).await;
        });

        let body: serde_json::Value = reqwest::get(format!("http://{}/", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["pages_served"], 1);
        assert!(body["sources"]["videos"].is_object());

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
