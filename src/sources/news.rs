// =============================================================================
// sources/news.rs: HACKER NEWS, BY WAY OF ALGOLIA
// =============================================================================
//
// GET https://hn.algolia.com/api/v1/search?query=AI&tags=story&hitsPerPage=5
//
// Answers with `{ "hits": [ { "title": ..., "url": ..., ... }, ... ] }`.
// Text posts (Ask HN and friends) have a null `url`; some hits carry the
// link in `story_url` instead, so we fall back to that.
// =============================================================================

use crate::error::FetchError;
use crate::models::{HnSearchResponse, Record, ResultSet, Source};
use crate::sources::{Upstream, RESULT_LIMIT};

const QUERY: &str = "AI";

pub async fn fetch(upstream: &Upstream) -> ResultSet {
    let params = [
        ("query", QUERY),
        ("tags", "story"),
        ("hitsPerPage", RESULT_LIMIT),
    ];

    let result = match upstream
        .get_text(Source::News, &upstream.config().news_url, &params)
        .await
    {
        Ok(body) => parse(&body),
        Err(e) => Err(e),
    };

    upstream.settle(Source::News, result, Vec::new)
}

/// Map an Algolia response body to records, in hit order.
pub fn parse(body: &str) -> Result<ResultSet, FetchError> {
    let response: HnSearchResponse = serde_json::from_str(body)?;

    Ok(response
        .hits
        .into_iter()
        .map(|hit| Record {
            title: hit.title,
            url: hit.url.or(hit.story_url),
        })
        .collect())
}
