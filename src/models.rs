//! Data models shared across the pipeline.
//!
//! - [`Article`]: one normalized item from a feed or web page
//! - [`Candidates`]: freshly scored articles split by output section

use serde::{Deserialize, Serialize};

/// A normalized article, as produced by a source adapter.
///
/// The same record is persisted in the run state (`today_news` /
/// `today_tech`), so the field names double as the state file schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// Feed-provided id, or the link when the feed has none. Stable across
    /// runs for the same item.
    pub id: String,
    pub title: String,
    /// Cleaned, length-bounded summary text.
    pub summary: String,
    pub link: String,
    /// Name of the source descriptor that produced the article.
    pub source: String,
    /// Representative image URL, if one was found.
    pub image: Option<String>,
    /// Relevance score; zero until the scorer has run.
    #[serde(default)]
    pub score: u32,
}

/// Articles fetched and scored in the current run, not yet merged.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Candidates {
    pub news: Vec<Article>,
    pub tech: Vec<Article>,
}

impl Candidates {
    pub fn len(&self) -> usize {
        self.news.len() + self.tech.len()
    }

    pub fn is_empty(&self) -> bool {
        self.news.is_empty() && self.tech.is_empty()
    }
}
