// =============================================================================
// models.rs: THE SHAPES OF THINGS
// =============================================================================
//
// Two kinds of structs live here. Ours (Record, RenderContext, Source), which
// are what the page is built from, and theirs (the upstream response types),
// which mirror just enough of each public API to pull a title and a link out.
//
// Upstream types are deliberately lax: almost every field is an Option,
// because five different companies get to decide what "a search hit" looks
// like and none of them asked us first.
// =============================================================================

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Which upstream a result came from. Also the key under which it shows up
/// in logs and metrics.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum Source {
    /// Hacker News, via the Algolia search API.
    News,
    /// GitHub repository search.
    Repos,
    /// Hugging Face model listing. The odd one out: passed through raw.
    Models,
    /// arXiv, in glorious Atom XML.
    Papers,
    /// YouTube Data API v3. Needs a key.
    Videos,
}

impl Source {
    /// Every source, in page order.
    pub const ALL: [Source; 5] = [
        Source::News,
        Source::Repos,
        Source::Models,
        Source::Papers,
        Source::Videos,
    ];

    /// Stable lowercase key, shared by the render context and metrics.
    pub fn key(&self) -> &'static str {
        match self {
            Source::News => "news",
            Source::Repos => "repos",
            Source::Models => "models",
            Source::Papers => "papers",
            Source::Videos => "videos",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::News => write!(f, "HN_ALGOLIA"),
            Source::Repos => write!(f, "GITHUB"),
            Source::Models => write!(f, "HUGGING_FACE"),
            Source::Papers => write!(f, "ARXIV"),
            Source::Videos => write!(f, "YOUTUBE"),
        }
    }
}

/// One displayable item: a title and a link.
///
/// Both halves are optional because upstream entries are sometimes missing
/// one or the other, and the renderer copes with that rather than the
/// fetcher throwing the entry away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub title: Option<String>,
    pub url: Option<String>,
}

impl Record {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            url: Some(url.into()),
        }
    }
}

/// The output of one fetch. Never absent, possibly empty.
pub type ResultSet = Vec<Record>;

/// Whatever JSON the model hub sent back, untouched.
pub type ModelListing = serde_json::Value;

/// The five sections of the page, in page order. Every field is always
/// present; a failed source is an empty section, not a missing one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderContext {
    pub news: ResultSet,
    pub repos: ResultSet,
    pub models: ModelListing,
    pub papers: ResultSet,
    pub videos: ResultSet,
}

impl RenderContext {
    /// A page with nothing on it. What total upstream failure looks like.
    pub fn empty() -> Self {
        Self {
            news: Vec::new(),
            repos: Vec::new(),
            models: empty_model_listing(),
            papers: Vec::new(),
            videos: Vec::new(),
        }
    }

    /// Number of entries in a section. For models this counts array
    /// elements; any other JSON shape counts as zero.
    pub fn len_of(&self, source: Source) -> usize {
        match source {
            Source::News => self.news.len(),
            Source::Repos => self.repos.len(),
            Source::Models => self.models.as_array().map_or(0, Vec::len),
            Source::Papers => self.papers.len(),
            Source::Videos => self.videos.len(),
        }
    }
}

/// The failure value for the model listing: an empty JSON array.
pub fn empty_model_listing() -> ModelListing {
    serde_json::Value::Array(Vec::new())
}

// =============================================================================
// Upstream response types
// =============================================================================

/// Algolia's HN search response. We only care about `hits`.
#[derive(Debug, Clone, Deserialize)]
pub struct HnSearchResponse {
    #[serde(default)]
    pub hits: Vec<HnHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HnHit {
    pub title: Option<String>,
    pub url: Option<String>,
    /// Populated on some hits where `url` is null.
    pub story_url: Option<String>,
}

/// GitHub search response. Items arrive already sorted by the upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubSearchResponse {
    #[serde(default)]
    pub items: Vec<GitHubRepo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub html_url: Option<String>,
}

/// YouTube search response.
#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeSearchResponse {
    #[serde(default)]
    pub items: Vec<YouTubeItem>,
}

/// `id` and `id.videoId` are required: an item without them fails the
/// whole response, same as any other malformed body.
#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeItem {
    pub id: YouTubeItemId,
    pub snippet: YouTubeSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeItemId {
    #[serde(rename = "videoId")]
    pub video_id: String,
}

/// `title` must be present, though YouTube is allowed to send it as `null`.
#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeSnippet {
    #[serde(deserialize_with = "present_but_nullable")]
    pub title: Option<String>,
}

/// A missing key is an error. `null` is `None`.
fn present_but_nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}
