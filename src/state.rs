//! Run state persistence and the daily selection.
//!
//! The state file carries two things between runs:
//!
//! - `pushed_ids`: every article id ever selected. It only grows, and any
//!   article listed there is never considered again.
//! - `today_date` / `today_news` / `today_tech`: the selection made by the
//!   previous run. When the next run happens on the same day, those articles
//!   are put back in front of the new candidates so several runs per day
//!   accumulate instead of starting over.
//!
//! # Append vs Replace
//!
//! `pushed_ids` is extended; the `today_*` fields are replaced on every run.

use std::collections::BTreeSet;
use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::models::{Article, Candidates};

/// Articles kept in the news section.
pub const NEWS_LIMIT: usize = 8;
/// Articles kept in the research & tech section.
pub const TECH_LIMIT: usize = 5;

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RunState {
    #[serde(default)]
    pub pushed_ids: BTreeSet<String>,
    #[serde(default)]
    pub today_date: Option<NaiveDate>,
    #[serde(default)]
    pub today_news: Vec<Article>,
    #[serde(default)]
    pub today_tech: Vec<Article>,
}

/// The ranked articles chosen by one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    pub news: Vec<Article>,
    pub tech: Vec<Article>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.news.is_empty() && self.tech.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Article> {
        self.news.iter().chain(&self.tech)
    }
}

/// Keep the first article for each id, preserving order.
pub fn dedup_by_id<I>(articles: I) -> Vec<Article>
where
    I: IntoIterator<Item = Article>,
{
    articles.into_iter().unique_by(|a| a.id.clone()).collect()
}

/// Dedup, stable-sort by score descending, keep the top `limit`.
///
/// Equal scores keep their merge order.
pub fn rank<I>(articles: I, limit: usize) -> Vec<Article>
where
    I: IntoIterator<Item = Article>,
{
    let mut ranked = dedup_by_id(articles);
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(limit);
    ranked
}

impl RunState {
    /// Load the state file. A missing file is an empty state.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed files are an error: starting over would
    /// forget `pushed_ids` and republish old articles.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        match fs::read_to_string(path).await {
            Ok(json) => {
                let state: Self = serde_json::from_str(&json)?;
                info!(
                    pushed = state.pushed_ids.len(),
                    today_date = ?state.today_date,
                    "Loaded run state"
                );
                Ok(state)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No state file yet; starting empty");
                Ok(Self::default())
            }
            Err(e) => Err(Box::new(e)),
        }
    }

    /// Overwrite the state file.
    ///
    /// The JSON is written to a sibling temporary file first and renamed over
    /// the target, so a crash mid-write leaves the previous state intact.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn save(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let json = serde_json::to_string(self)?;
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        fs::write(&tmp_path, json).await?;
        fs::rename(&tmp_path, path).await?;
        info!(pushed = self.pushed_ids.len(), "Saved run state");
        Ok(())
    }

    /// Merge today's candidates with earlier selections and pick the winners.
    ///
    /// Earlier selections are reused only when they were made on `today`.
    /// Every selected id is recorded in `pushed_ids`, and the selection
    /// becomes the new `today_*` record.
    pub fn select(&mut self, today: NaiveDate, candidates: Candidates) -> Selection {
        let (prev_news, prev_tech) = if self.today_date == Some(today) {
            (
                std::mem::take(&mut self.today_news),
                std::mem::take(&mut self.today_tech),
            )
        } else {
            debug!(previous = ?self.today_date, %today, "New day; discarding earlier selections");
            (Vec::new(), Vec::new())
        };

        let news = rank(prev_news.into_iter().chain(candidates.news), NEWS_LIMIT);
        let tech = rank(prev_tech.into_iter().chain(candidates.tech), TECH_LIMIT);
        let selection = Selection { news, tech };

        for article in selection.iter() {
            self.pushed_ids.insert(article.id.clone());
        }
        self.today_date = Some(today);
        self.today_news = selection.news.clone();
        self.today_tech = selection.tech.clone();

        selection
    }
}
