// =============================================================================
// sources/mod.rs: THE FIVE FIREHOSES
// =============================================================================
//
// Five public APIs, five formats of opinion about what a search result is,
// one contract: `fetch` always returns something. An upstream that is down,
// slow, rate-limiting, or answering in HTML gets an empty section on the
// page and a line in the log. It never gets to take the page down with it.
//
// Each source module exposes:
//   - `fetch(&Upstream)`: the total, never-failing entry point
//   - `parse(&str)`: the pure body -> records mapping, tested in isolation
//
// `Upstream` owns the shared pieces: one pooled reqwest client, the config,
// and the metrics collector that keeps score of who failed and how.
// =============================================================================

pub mod news;
pub mod repos;
pub mod model_hub;
pub mod papers;
pub mod videos;

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::FetchError;
use crate::metrics::MetricsCollector;
use crate::models::{ModelListing, ResultSet, Source};

/// Upstreams are asked for this many items. The cap is applied by them, not us.
pub const RESULT_LIMIT: &str = "5";

/// Shared outbound plumbing for every source.
pub struct Upstream {
    http: reqwest::Client,
    config: Arc<Config>,
    metrics: Arc<MetricsCollector>,
}

impl Upstream {
    /// Build the pooled client. The timeout applies to the whole request,
    /// connect through last body byte.
    pub fn new(config: Arc<Config>, metrics: Arc<MetricsCollector>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            config,
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// One GET with query parameters. Anything other than a 2xx with a
    /// readable body is an error.
    async fn get_text(
        &self,
        source: Source,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<String, FetchError> {
        let url = Url::parse_with_params(endpoint, params)?;

        self.metrics.record_attempt(source);
        debug!(source = %source, host = url.host_str().unwrap_or(""), "Fetching upstream");

        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UpstreamStatus(status));
        }

        Ok(response.text().await?)
    }

    /// The fail-silent boundary. Whatever happened, the caller gets a value.
    fn settle<T: Tally>(
        &self,
        source: Source,
        result: Result<T, FetchError>,
        fallback: impl FnOnce() -> T,
    ) -> T {
        match result {
            Ok(value) => {
                let count = value.tally();
                self.metrics.record_items(source, count);
                debug!(source = %source, items = count, "Upstream fetch complete");
                value
            }
            Err(FetchError::MissingCredential) => {
                debug!(source = %source, "No credential configured, section left empty");
                fallback()
            }
            Err(e) => {
                self.metrics.record_failure(source);
                warn!(
                    source = %source,
                    kind = e.kind(),
                    error = %e,
                    "Upstream fetch failed, rendering an empty section"
                );
                fallback()
            }
        }
    }
}

/// How many entries a fetch produced, for the logs and counters.
trait Tally {
    fn tally(&self) -> usize;
}

impl Tally for ResultSet {
    fn tally(&self) -> usize {
        self.len()
    }
}

impl Tally for ModelListing {
    fn tally(&self) -> usize {
        self.as_array().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, stub_upstream};

    #[tokio::test]
    async fn test_get_text_rejects_non_success_status() {
        let stub = stub_upstream(503, "application/json", "{}").await;
        let upstream = test_support::upstream(Config::default());

        let result = upstream.get_text(Source::News, &stub.url, &[("q", "x")]).await;
        assert!(matches!(result, Err(FetchError::UpstreamStatus(s)) if s.as_u16() == 503));
        assert_eq!(stub.hits(), 1);
    }

    #[tokio::test]
    async fn test_get_text_reports_refused_connection_as_network_error() {
        let upstream = test_support::upstream(Config::default());
        let dead = test_support::dead_endpoint().await;

        let result = upstream.get_text(Source::Repos, &dead, &[]).await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn test_get_text_rejects_garbage_endpoint() {
        let upstream = test_support::upstream(Config::default());
        let result = upstream.get_text(Source::Models, "not a url", &[]).await;
        assert!(matches!(result, Err(FetchError::InvalidEndpoint(_))));
        assert_eq!(upstream.metrics().snapshot().sources["models"].attempts, 0);
    }

    #[tokio::test]
    async fn test_settle_counts_failures_but_not_missing_credentials() {
        let upstream = test_support::upstream(Config::default());

        let out: ResultSet = upstream.settle(Source::Videos, Err(FetchError::MissingCredential), Vec::new);
        assert!(out.is_empty());
        let out: ResultSet = upstream.settle(
            Source::News,
            Err(FetchError::Xml("boom".to_string())),
            Vec::new,
        );
        assert!(out.is_empty());

        let snapshot = upstream.metrics().snapshot();
        assert_eq!(snapshot.sources["videos"].failures, 0);
        assert_eq!(snapshot.sources["news"].failures, 1);
    }
}
