//! `config.yaml` loading.
//!
//! ```yaml
//! sources:
//!   - name: arXiv cs.AI
//!     category: tech
//!     type: rss
//!     url: https://rss.arxiv.org/rss/cs.AI
//!   - name: Hugging Face Blog
//!     category: tech
//!     type: html
//!     parser: huggingface_blog
//! # optional overrides of the built-in lists
//! keywords: [llm, transformer]
//! ```

use std::error::Error;
use std::path::Path;

use serde::Deserialize;
use tokio::fs;
use tracing::{info, instrument};

use crate::keywords::{CONTENT_IMAGE_KEYWORDS, ImageKeywords, KEYWORDS, UNWANTED_IMAGE_KEYWORDS};
use crate::scoring::Scorer;

/// Output section a source contributes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    News,
    Tech,
    /// Any other value: the source is fetched but lands in no section.
    #[default]
    #[serde(other)]
    Other,
}

/// One entry of the `sources` list.
///
/// `kind` is kept as the raw string so an unsupported type can be logged and
/// skipped instead of failing the whole configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(rename = "type")]
    pub kind: String,
    /// Feed URL, for `type: rss`.
    pub url: Option<String>,
    /// Registered parser name, for `type: html`.
    pub parser: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sources: Vec<SourceDescriptor>,
    pub keywords: Option<Vec<String>>,
    pub unwanted_image_keywords: Option<Vec<String>>,
    pub content_image_keywords: Option<Vec<String>>,
}

impl Config {
    /// Read and parse a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid configuration. Both
    /// are fatal for a run.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let yaml = fs::read_to_string(path).await?;
        let config = Self::from_yaml(&yaml)?;
        info!(sources = config.sources.len(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Scorer built from the configured keywords, or the built-in list.
    pub fn scorer(&self) -> Scorer {
        match &self.keywords {
            Some(keywords) => Scorer::new(keywords),
            None => Scorer::new(KEYWORDS),
        }
    }

    /// Image keyword lists, each falling back to its built-in default.
    pub fn image_keywords(&self) -> ImageKeywords {
        let unwanted = self
            .unwanted_image_keywords
            .clone()
            .unwrap_or_else(|| UNWANTED_IMAGE_KEYWORDS.iter().map(|s| s.to_string()).collect());
        let content = self
            .content_image_keywords
            .clone()
            .unwrap_or_else(|| CONTENT_IMAGE_KEYWORDS.iter().map(|s| s.to_string()).collect());
        ImageKeywords::new(unwanted, content)
    }
}
