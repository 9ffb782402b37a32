//! Candidate collection for one run.
//!
//! Sources are visited in configuration order, one at a time. Each article
//! that has never been pushed gets its summary condensed and a score, then
//! lands in the bucket of its source's category.

use std::collections::BTreeSet;

use tracing::{debug, info, instrument};

use crate::config::{Category, SourceDescriptor};
use crate::extract::Extractor;
use crate::fetch::PageFetch;
use crate::models::{Article, Candidates};
use crate::scoring::Scorer;
use crate::sources::fetch_articles;
use crate::utils::{SUMMARY_MAX_CHARS, condense_summary};

/// Fetch every source and return the scored, unseen articles per category.
///
/// Sources in a category other than `news`/`tech` are still fetched, but
/// their articles are dropped.
#[instrument(level = "info", skip_all, fields(sources = sources.len(), pushed = pushed_ids.len()))]
pub async fn collect_candidates<F: PageFetch>(
    sources: &[SourceDescriptor],
    pushed_ids: &BTreeSet<String>,
    extractor: &Extractor<'_, F>,
    scorer: &Scorer,
) -> Candidates {
    let mut candidates = Candidates::default();

    for source in sources {
        info!(source = %source.name, "Fetching source");
        let fetched = fetch_articles(source, extractor).await;
        let total = fetched.len();

        let fresh: Vec<Article> = fetched
            .into_iter()
            .filter(|article| !pushed_ids.contains(&article.id))
            .map(|article| prepare(article, scorer))
            .collect();
        debug!(
            source = %source.name,
            total,
            fresh = fresh.len(),
            "Filtered already pushed articles"
        );

        match source.category {
            Category::News => candidates.news.extend(fresh),
            Category::Tech => candidates.tech.extend(fresh),
            Category::Other => {
                debug!(source = %source.name, dropped = fresh.len(), "Source has no section");
            }
        }
    }

    info!(
        news = candidates.news.len(),
        tech = candidates.tech.len(),
        "Collected candidates"
    );
    candidates
}

/// Condense the summary, then score.
fn prepare(mut article: Article, scorer: &Scorer) -> Article {
    article.summary = condense_summary(&article.summary, SUMMARY_MAX_CHARS);
    article.score = scorer.score(&article);
    debug!(id = %article.id, score = article.score, "Scored article");
    article
}
