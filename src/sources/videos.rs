// =============================================================================
// sources/videos.rs: YOUTUBE DATA API v3
// =============================================================================
//
// GET https://www.googleapis.com/youtube/v3/search
//       ?part=snippet&q=AI&type=video&order=viewCount&maxResults=5&key=...
//
// The only source that needs a credential. No key, no request: we bail out
// before a socket is ever opened, and the section renders empty.
//
// Search results carry `id.videoId` and `snippet.title`; the watch URL is
// ours to build.
// =============================================================================

use crate::error::FetchError;
use crate::models::{Record, ResultSet, Source, YouTubeSearchResponse};
use crate::sources::{Upstream, RESULT_LIMIT};

const QUERY: &str = "AI";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

pub async fn fetch(upstream: &Upstream) -> ResultSet {
    let result = fetch_inner(upstream).await;
    upstream.settle(Source::Videos, result, Vec::new)
}

async fn fetch_inner(upstream: &Upstream) -> Result<ResultSet, FetchError> {
    let config = upstream.config();
    let api_key = config
        .youtube_api_key
        .as_deref()
        .ok_or(FetchError::MissingCredential)?;

    let params = [
        ("part", "snippet"),
        ("q", QUERY),
        ("type", "video"),
        ("order", "viewCount"),
        ("maxResults", RESULT_LIMIT),
        ("key", api_key),
    ];

    let body = upstream
        .get_text(Source::Videos, &config.videos_url, &params)
        .await?;
    parse(&body)
}

/// Map a search response to watch-page records. Every item must carry a
/// video id; one bad item fails the lot.
pub fn parse(body: &str) -> Result<ResultSet, FetchError> {
    let response: YouTubeSearchResponse = serde_json::from_str(body)?;

    Ok(response
        .items
        .into_iter()
        .map(|item| Record {
            title: item.snippet.title,
            url: Some(watch_url(&item.id.video_id)),
        })
        .collect())
}

pub fn watch_url(video_id: &str) -> String {
    format!("{}{}", WATCH_URL, video_id)
}
