// =============================================================================
// error.rs: EVERYTHING THAT CAN GO WRONG ON THE WAY OUT
// =============================================================================
//
// These never reach the page. Every fetcher folds them into an empty section
// at its own boundary; the enum exists so the logs and metrics can say WHICH
// flavour of broken an upstream was today.
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connect, TLS, timeout, or the body going away mid-read.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The upstream answered, just not with a 2xx.
    #[error("upstream returned HTTP {0}")]
    UpstreamStatus(reqwest::StatusCode),

    /// Body was not the JSON shape we expected.
    #[error("malformed body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    /// Body was not well-formed XML, or was missing a required element.
    #[error("malformed feed: {0}")]
    Xml(String),

    /// The video source has no API key configured.
    #[error("no credential configured")]
    MissingCredential,

    /// The configured endpoint is not a URL.
    #[error("invalid endpoint url: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

impl From<quick_xml::Error> for FetchError {
    fn from(err: quick_xml::Error) -> Self {
        FetchError::Xml(err.to_string())
    }
}

impl FetchError {
    /// Short label for log fields and metric buckets.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::UpstreamStatus(_) => "upstream_status",
            FetchError::MalformedBody(_) => "malformed_body",
            FetchError::Xml(_) => "malformed_feed",
            FetchError::MissingCredential => "missing_credential",
            FetchError::InvalidEndpoint(_) => "invalid_endpoint",
        }
    }
}
