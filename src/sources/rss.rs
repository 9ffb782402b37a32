//! Feed reader for `type: rss` sources.
//!
//! The feed itself is downloaded through the safe fetcher like every other
//! page, then parsed with `feed-rs` (RSS 0.9x/1.0/2.0, Atom, JSON Feed).
//! Entries are taken in feed order; nothing is re-sorted here.

use feed_rs::model::{Entry, Link, Text};
use feed_rs::parser::{self, Parser};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use super::{MAX_ENTRIES_PER_SOURCE, summary_or_fallback};
use crate::config::SourceDescriptor;
use crate::extract::Extractor;
use crate::fetch::PageFetch;
use crate::models::Article;

/// The fields of a feed entry the digest cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FeedEntry {
    id: String,
    title: String,
    link: String,
    raw_summary: String,
}

impl FeedEntry {
    /// `None` for entries without a usable link.
    fn from_entry(entry: Entry) -> Option<Self> {
        let link = entry
            .links
            .first()
            .map(|link| link.href.trim().to_string())
            .filter(|href| !href.is_empty());
        let Some(link) = link else {
            warn!(id = %entry.id, "Skipping feed entry without a link");
            return None;
        };

        let id = if entry.id.trim().is_empty() {
            link.clone()
        } else {
            entry.id
        };
        let title = entry.title.map(|text| text.content).unwrap_or_default();
        let raw_summary = entry
            .summary
            .map(|text| text.content)
            .or_else(|| entry.content.and_then(|content| content.body))
            .unwrap_or_default();

        Some(Self {
            id,
            title,
            link,
            raw_summary,
        })
    }

    async fn into_article<F: PageFetch>(
        self,
        source: &SourceDescriptor,
        extractor: &Extractor<'_, F>,
    ) -> Article {
        let image = extractor.main_image(&self.link).await;
        let summary = summary_or_fallback(&self.raw_summary, &self.link, extractor).await;
        Article {
            id: self.id,
            title: self.title,
            summary,
            link: self.link,
            source: source.name.clone(),
            image,
            score: 0,
        }
    }
}

/// Entries without an id of their own are identified by their first link.
///
/// The default generator hashes link and title together, so a headline edit
/// would turn an already pushed item into a new one.
fn link_id(links: &[Link], _title: &Option<Text>, _uri: Option<&str>) -> String {
    links
        .first()
        .map(|link| link.href.trim().to_string())
        .unwrap_or_default()
}

fn feed_parser() -> Parser {
    parser::Builder::new().id_generator(link_id).build()
}

/// Parse a feed document into at most [`MAX_ENTRIES_PER_SOURCE`] entries.
fn parse_entries(body: &[u8]) -> Result<Vec<FeedEntry>, parser::ParseFeedError> {
    let feed = feed_parser().parse(body)?;
    Ok(feed
        .entries
        .into_iter()
        .take(MAX_ENTRIES_PER_SOURCE)
        .filter_map(FeedEntry::from_entry)
        .collect())
}

/// Fetch a feed and build an article for each of its first entries.
///
/// Entries are enriched one at a time: main image first, then the fallback
/// summary when the feed's own summary is too thin.
#[instrument(level = "info", skip(source, extractor), fields(source = %source.name))]
pub async fn fetch_articles<F: PageFetch>(
    source: &SourceDescriptor,
    feed_url: &str,
    extractor: &Extractor<'_, F>,
) -> Vec<Article> {
    let page = match extractor.fetcher().fetch(feed_url).await {
        Ok(page) => page,
        Err(e) => {
            warn!(%feed_url, error = %e, "Feed fetch failed");
            return Vec::new();
        }
    };
    let entries = match parse_entries(&page.body) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(%feed_url, error = %e, "Feed parse failed");
            return Vec::new();
        }
    };
    debug!(count = entries.len(), "Parsed feed entries");

    let articles: Vec<Article> = stream::iter(entries)
        .then(|entry| async move { entry.into_article(source, extractor).await })
        .collect()
        .await;

    info!(count = articles.len(), "Fetched feed articles");
    articles
}
