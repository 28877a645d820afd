// =============================================================================
// page.rs: THE ASSEMBLY LINE
// =============================================================================
//
// One page view, five fetches, strictly one after another in page order.
// Nothing here can fail: every fetcher already turned its bad day into an
// empty section before handing it back.
// =============================================================================

use std::time::Instant;

use tracing::info;

use crate::models::{RenderContext, Source};
use crate::sources::{model_hub, news, papers, repos, videos, Upstream};

/// Fetch every section and collect the results.
pub async fn build_page(upstream: &Upstream) -> RenderContext {
    let started = Instant::now();

    let ctx = RenderContext {
        news: news::fetch(upstream).await,
        repos: repos::fetch(upstream).await,
        models: model_hub::fetch(upstream).await,
        papers: papers::fetch(upstream).await,
        videos: videos::fetch(upstream).await,
    };

    info!(
        news = ctx.len_of(Source::News),
        repos = ctx.len_of(Source::Repos),
        models = ctx.len_of(Source::Models),
        papers = ctx.len_of(Source::Papers),
        videos = ctx.len_of(Source::Videos),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Page assembled"
    );

    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_support::{self, stub_upstream};

    #[tokio::test]
    async fn test_all_upstreams_down_still_yields_every_section() {
        let dead = test_support::dead_endpoint().await;
        let upstream = test_support::upstream(Config {
            youtube_api_key: Some("key".to_string()),
            ..test_support::config_pointing_at(&dead)
        });

        let ctx = build_page(&upstream).await;
        assert_eq!(ctx, RenderContext::empty());

        let snapshot = upstream.metrics().snapshot();
        for source in Source::ALL {
            assert_eq!(snapshot.sources[source.key()].failures, 1, "{}", source.key());
        }
    }

    #[tokio::test]
    async fn test_one_healthy_source_does_not_depend_on_the_others() {
        // The stub serves an HN body to everyone: news parses it, repos and
        // videos see an object without `items`, papers chokes on JSON, and
        // models passes it through verbatim.
        let body = r#"{"hits": [{"title": "A", "url": "http://a"}]}"#;
        let stub = stub_upstream(200, "application/json", body).await;
        let upstream = test_support::upstream(test_support::config_pointing_at(&stub.url));

        let ctx = build_page(&upstream).await;

        assert_eq!(ctx.news.len(), 1);
        assert!(ctx.repos.is_empty());
        assert_eq!(ctx.models, serde_json::json!({"hits": [{"title": "A", "url": "http://a"}]}));
        assert!(ctx.papers.is_empty());
        assert!(ctx.videos.is_empty());

        // No key configured, so only four requests went out.
        assert_eq!(stub.hits(), 4);
    }
}
