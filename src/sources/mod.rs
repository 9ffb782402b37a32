//! Source adapters: turn a [`SourceDescriptor`] into [`Article`]s.
//!
//! # Source types
//!
//! | `type` | Module | Notes |
//! |--------|--------|-------|
//! | `rss` | [`rss`] | RSS, Atom or JSON Feed at `url`; first 5 entries |
//! | `html` | see [`HtmlParser`] | `parser` must name a registered parser |
//!
//! Anything else is logged and contributes no articles.
//!
//! # Registered HTML parsers
//!
//! | Name | Module |
//! |------|--------|
//! | `huggingface_blog` | [`huggingface`] |
//!
//! Parser names are looked up in a fixed table; configuration cannot reach
//! any other code path.

use tracing::{instrument, warn};

use crate::config::SourceDescriptor;
use crate::extract::{Extractor, clean_summary};
use crate::fetch::PageFetch;
use crate::models::Article;

pub mod huggingface;
pub mod rss;

/// Entries taken from the top of each source.
pub const MAX_ENTRIES_PER_SOURCE: usize = 5;
/// Provided summaries shorter than this are replaced by the page fallback.
pub const MIN_SUMMARY_CHARS: usize = 50;

/// Typed HTML parsers that a source descriptor may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlParser {
    HuggingFaceBlog,
}

const REGISTERED_PARSERS: &[(&str, HtmlParser)] =
    &[("huggingface_blog", HtmlParser::HuggingFaceBlog)];

impl HtmlParser {
    /// Registered parser for `name`, if any.
    pub fn lookup(name: &str) -> Option<Self> {
        REGISTERED_PARSERS
            .iter()
            .find(|(registered, _)| *registered == name)
            .map(|(_, parser)| *parser)
    }

    pub async fn fetch_articles<F: PageFetch>(
        self,
        source: &SourceDescriptor,
        extractor: &Extractor<'_, F>,
    ) -> Vec<Article> {
        match self {
            HtmlParser::HuggingFaceBlog => huggingface::fetch_articles(source, extractor).await,
        }
    }
}

/// Fetch the articles for one source. Never fails; problems are logged and
/// yield an empty list.
#[instrument(level = "info", skip_all, fields(source = %source.name, kind = %source.kind))]
pub async fn fetch_articles<F: PageFetch>(
    source: &SourceDescriptor,
    extractor: &Extractor<'_, F>,
) -> Vec<Article> {
    match source.kind.as_str() {
        "rss" => match source.url.as_deref() {
            Some(url) => rss::fetch_articles(source, url, extractor).await,
            None => {
                warn!("RSS source has no url; skipping");
                Vec::new()
            }
        },
        "html" => {
            let name = source.parser.as_deref().unwrap_or_default();
            match HtmlParser::lookup(name) {
                Some(parser) => parser.fetch_articles(source, extractor).await,
                None => {
                    warn!(parser = name, "Unknown parser; skipping");
                    Vec::new()
                }
            }
        }
        other => {
            warn!(kind = other, "Unknown source type; skipping");
            Vec::new()
        }
    }
}

/// Clean the provided summary, or fall back to the article page when it is
/// missing or too short to be useful.
pub(crate) async fn summary_or_fallback<F: PageFetch>(
    raw: &str,
    link: &str,
    extractor: &Extractor<'_, F>,
) -> String {
    if raw.chars().count() < MIN_SUMMARY_CHARS {
        extractor.fallback_summary(link).await
    } else {
        clean_summary(raw)
    }
}
