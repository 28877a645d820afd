// =============================================================================
// config.rs: THE CONTROL PANEL
// =============================================================================
//
// Where the dials live. Everything here is read once at startup and then
// handed around by reference. Nothing downstream reads the process
// environment on its own; tests build a `Config` literal instead.
//
// Every knob can be overridden with an AI_PULSE_ environment variable. The
// YouTube key keeps its conventional name, because that is what everyone
// already has in their shell.
// =============================================================================

use std::env;
use std::time::Duration;

pub const DEFAULT_NEWS_URL: &str = "https://hn.algolia.com/api/v1/search";
pub const DEFAULT_REPOS_URL: &str = "https://api.github.com/search/repositories";
pub const DEFAULT_MODELS_URL: &str = "https://huggingface.co/api/models";
pub const DEFAULT_PAPERS_URL: &str = "https://export.arxiv.org/api/query";
pub const DEFAULT_VIDEOS_URL: &str = "https://www.googleapis.com/youtube/v3/search";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_METRICS_PORT: u16 = 9090;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_USER_AGENT: &str = "AiPulseDashboard/0.1";

/// Every tunable in the dashboard. Cloned into an `Arc` at startup and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Interface the dashboard binds to. Default: 0.0.0.0
    pub bind_host: String,

    /// Port serving the page. Default: 8000
    pub port: u16,

    /// Port for the JSON metrics listener. `0` turns it off.
    /// Default: 9090, because Prometheus conventions are conventions.
    pub metrics_port: u16,

    // =========================================================================
    // OUTBOUND
    // =========================================================================

    /// Per-request timeout for every upstream call. Default: 10 seconds.
    pub request_timeout: Duration,

    /// Sent on every outbound request. GitHub answers 403 to anyone who
    /// shows up without one.
    pub user_agent: String,

    pub news_url: String,
    pub repos_url: String,
    pub models_url: String,
    pub papers_url: String,
    pub videos_url: String,

    /// YouTube Data API key. `None` means the videos section stays empty and
    /// we never dial Google at all.
    pub youtube_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            news_url: DEFAULT_NEWS_URL.to_string(),
            repos_url: DEFAULT_REPOS_URL.to_string(),
            models_url: DEFAULT_MODELS_URL.to_string(),
            papers_url: DEFAULT_PAPERS_URL.to_string(),
            videos_url: DEFAULT_VIDEOS_URL.to_string(),
            youtube_api_key: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset or unparsable.
    ///
    /// A `.env` file in the working directory is honoured if present and
    /// silently skipped if not.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let defaults = Config::default();

        Config {
            bind_host: env_or_default("AI_PULSE_HOST", &defaults.bind_host),
            port: env_or_default("AI_PULSE_PORT", "")
                .parse()
                .unwrap_or(defaults.port),
            metrics_port: env_or_default("AI_PULSE_METRICS_PORT", "")
                .parse()
                .unwrap_or(defaults.metrics_port),
            request_timeout: Duration::from_secs(
                env_or_default("AI_PULSE_REQUEST_TIMEOUT_SECS", "")
                    .parse()
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            user_agent: env_or_default("AI_PULSE_USER_AGENT", &defaults.user_agent),

            // Upstream endpoints. Overridable so a test rig or a proxy can
            // stand in for the real thing.
            news_url: env_or_default("AI_PULSE_NEWS_URL", &defaults.news_url),
            repos_url: env_or_default("AI_PULSE_REPOS_URL", &defaults.repos_url),
            models_url: env_or_default("AI_PULSE_MODELS_URL", &defaults.models_url),
            papers_url: env_or_default("AI_PULSE_PAPERS_URL", &defaults.papers_url),
            videos_url: env_or_default("AI_PULSE_VIDEOS_URL", &defaults.videos_url),

            youtube_api_key: non_empty(env::var("YOUTUBE_API_KEY").ok()),
        }
    }

    /// `host:port` string for the dashboard listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// `host:port` for the metrics listener, or `None` when disabled.
    pub fn metrics_addr(&self) -> Option<String> {
        (self.metrics_port != 0).then(|| format!("{}:{}", self.bind_host, self.metrics_port))
    }

    /// Whether the video source has a usable credential.
    pub fn has_youtube_key(&self) -> bool {
        self.youtube_api_key.is_some()
    }
}

fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// An empty key is no key. `YOUTUBE_API_KEY=` in a .env file should not
/// send us off to Google with `key=`.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_public_endpoints() {
        let config = Config::default();
        assert_eq!(config.news_url, DEFAULT_NEWS_URL);
        assert_eq!(config.papers_url, DEFAULT_PAPERS_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(!config.has_youtube_key());
    }

    #[test]
    fn test_blank_key_counts_as_absent() {
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("abc".to_string())), Some("abc".to_string()));
    }

    #[test]
    fn test_metrics_port_zero_disables_listener() {
        let mut config = Config::default();
        assert_eq!(config.metrics_addr(), Some("0.0.0.0:9090".to_string()));
        config.metrics_port = 0;
        assert_eq!(config.metrics_addr(), None);
    }

    #[test]
    fn test_bind_addr() {
        let config = Config {
            bind_host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }
}
