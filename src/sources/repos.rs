// =============================================================================
// sources/repos.rs: GITHUB REPOSITORY SEARCH
// =============================================================================
//
// GET https://api.github.com/search/repositories?q=topic:ai&order=desc&per_page=5
//
// Unauthenticated, so it is rate-limited to a handful of calls a minute.
// When GitHub says no it answers 403 with a JSON lecture, which lands here
// as an UpstreamStatus error and an empty section.
// =============================================================================

use crate::error::FetchError;
use crate::models::{GitHubSearchResponse, Record, ResultSet, Source};
use crate::sources::{Upstream, RESULT_LIMIT};

const TOPIC_FILTER: &str = "topic:ai";

pub async fn fetch(upstream: &Upstream) -> ResultSet {
    let params = [
        ("q", TOPIC_FILTER),
        ("order", "desc"),
        ("per_page", RESULT_LIMIT),
    ];

    let result = match upstream
        .get_text(Source::Repos, &upstream.config().repos_url, &params)
        .await
    {
        Ok(body) => parse(&body),
        Err(e) => Err(e),
    };

    upstream.settle(Source::Repos, result, Vec::new)
}

/// Title is `owner/name` when GitHub gives us one, bare `name` otherwise.
pub fn parse(body: &str) -> Result<ResultSet, FetchError> {
    let response: GitHubSearchResponse = serde_json::from_str(body)?;

    Ok(response
        .items
        .into_iter()
        .map(|repo| Record {
            title: repo.full_name.or(repo.name),
            url: repo.html_url,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, stub_upstream};

    #[test]
    fn test_parse_uses_full_name_and_html_url() {
        let body = r#"{
            "total_count": 2,
            "items": [
                {"name": "transformers", "full_name": "huggingface/transformers",
                 "html_url": "https://github.com/huggingface/transformers", "stargazers_count": 140000},
                {"name": "llama.cpp", "html_url": "https://github.com/ggml-org/llama.cpp"}
            ]
        }"#;

        let records = parse(body).unwrap();
        assert_eq!(
            records,
            vec![
                Record::new("huggingface/transformers", "https://github.com/huggingface/transformers"),
                Record::new("llama.cpp", "https://github.com/ggml-org/llama.cpp"),
            ]
        );
    }

    #[test]
    fn test_parse_missing_items_is_empty() {
        let body = r#"{"message": "API rate limit exceeded"}"#;
        assert!(parse(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_top_level_array() {
        assert!(parse(r#"[{"name": "x"}]"#).is_err());
    }

    #[tokio::test]
    async fn test_fetch_is_empty_on_rate_limit() {
        let stub = stub_upstream(
            403,
            "application/json",
            r#"{"message": "API rate limit exceeded"}"#,
        )
        .await;
        let upstream = test_support::upstream(test_support::config_pointing_at(&stub.url));

        assert!(fetch(&upstream).await.is_empty());
        assert_eq!(stub.hits(), 1);
    }

    #[tokio::test]
    async fn test_fetch_is_empty_on_truncated_json() {
        let stub = stub_upstream(200, "application/json", r#"{"items": [{"name": "#).await;
        let upstream = test_support::upstream(test_support::config_pointing_at(&stub.url));

        assert!(fetch(&upstream).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_is_empty_when_unreachable() {
        let dead = test_support::dead_endpoint().await;
        let upstream = test_support::upstream(test_support::config_pointing_at(&dead));

        assert!(fetch(&upstream).await.is_empty());
        assert_eq!(upstream.metrics().snapshot().sources["repos"].failures, 1);
    }
}
