// =============================================================================
// sources/model_hub.rs: HUGGING FACE MODEL LISTING
// =============================================================================
//
// GET https://huggingface.co/api/models?limit=5&sort=downloads
//
// The odd one out. Every other source gets boiled down to title/url records;
// this one hands the parsed JSON straight to the renderer, whatever shape it
// is. The renderer knows how to pull `id`s out of an array of models and
// shrugs at anything else.
// =============================================================================

use crate::error::FetchError;
use crate::models::{empty_model_listing, ModelListing, Source};
use crate::sources::{Upstream, RESULT_LIMIT};

pub async fn fetch(upstream: &Upstream) -> ModelListing {
    let params = [("limit", RESULT_LIMIT), ("sort", "downloads")];

    let result = match upstream
        .get_text(Source::Models, &upstream.config().models_url, &params)
        .await
    {
        Ok(body) => parse(&body),
        Err(e) => Err(e),
    };

    upstream.settle(Source::Models, result, empty_model_listing)
}

/// Any well-formed JSON goes through untouched.
pub fn parse(body: &str) -> Result<ModelListing, FetchError> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::test_support::{self, stub_upstream};

    #[test]
    fn test_parse_passes_array_through_verbatim() {
        let body = r#"[{"id": "openai/whisper-large-v3", "downloads": 1234, "tags": ["audio"]}]"#;
        assert_eq!(
            parse(body).unwrap(),
            json!([{"id": "openai/whisper-large-v3", "downloads": 1234, "tags": ["audio"]}])
        );
    }

    #[test]
    fn test_parse_passes_object_through_verbatim() {
        let body = r#"{"error": "Invalid sort"}"#;
        assert_eq!(parse(body).unwrap(), json!({"error": "Invalid sort"}));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse("Service Unavailable").is_err());
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty_array() {
        let stub = stub_upstream(502, "text/html", "<h1>Bad Gateway</h1>").await;
        let upstream = test_support::upstream(test_support::config_pointing_at(&stub.url));

        assert_eq!(fetch(&upstream).await, json!([]));
    }

    #[tokio::test]
    async fn test_fetch_returns_raw_body() {
        let stub = stub_upstream(200, "application/json", r#"[{"id": "a"}, {"id": "b"}]"#).await;
        let upstream = test_support::upstream(test_support::config_pointing_at(&stub.url));

        assert_eq!(fetch(&upstream).await, json!([{"id": "a"}, {"id": "b"}]));
        assert_eq!(upstream.metrics().snapshot().sources["models"].items, 2);
    }

    #[tokio::test]
    async fn test_fetch_is_empty_array_when_unreachable() {
        let dead = test_support::dead_endpoint().await;
        let upstream = test_support::upstream(test_support::config_pointing_at(&dead));

        assert_eq!(fetch(&upstream).await, json!([]));
        assert_eq!(upstream.metrics().snapshot().sources["models"].failures, 1);
    }

    #[tokio::test]
    async fn test_fetch_is_empty_array_on_garbage_body() {
        let stub = stub_upstream(200, "application/json", "<!doctype html><p>maintenance</p>").await;
        let upstream = test_support::upstream(test_support::config_pointing_at(&stub.url));

        assert_eq!(fetch(&upstream).await, json!([]));
        assert_eq!(stub.hits(), 1);
        assert_eq!(upstream.metrics().snapshot().sources["models"].failures, 1);
    }
}
