//! Hugging Face blog parser (`parser: huggingface_blog`).
//!
//! Follows the same two-phase pattern as the feed reader, without a feed:
//!
//! 1. **Indexing**: collect post links from the blog listing page
//! 2. **Fetching**: read each post's title and description, then enrich it
//!    like any other article (main image, fallback summary)

use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{MAX_ENTRIES_PER_SOURCE, summary_or_fallback};
use crate::config::SourceDescriptor;
use crate::extract::{Extractor, element_text};
use crate::fetch::PageFetch;
use crate::models::Article;

pub const BLOG_INDEX_URL: &str = "https://huggingface.co/blog";

static POST_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href^="/blog/"]"#).expect("valid selector"));
static HEADLINE: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("valid selector"));
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("valid selector"));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="description"], meta[property="og:description"]"#)
        .expect("valid selector")
});

/// Listing sections that live under `/blog/` but are not posts.
const NON_POST_SLUGS: &[&str] = &["community", "zh", "feed.xml"];

/// Absolute URLs of the first distinct posts on the listing page.
pub fn index_posts(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&POST_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .filter(|url| {
            let segments: Vec<&str> = url
                .path_segments()
                .map(|segments| segments.filter(|s| !s.is_empty()).collect())
                .unwrap_or_default();
            url.query().is_none()
                && segments.len() == 2
                && !NON_POST_SLUGS.contains(&segments[1])
        })
        .map(|mut url| {
            url.set_fragment(None);
            url.to_string()
        })
        .unique()
        .take(MAX_ENTRIES_PER_SOURCE)
        .collect()
}

/// Title and description of a post page.
///
/// The title comes from the first `<h1>`, else `og:title`. The description
/// is the page's meta description, or empty.
pub fn parse_post(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);
    let title = document
        .select(&HEADLINE)
        .map(element_text)
        .find(|text| !text.is_empty())
        .or_else(|| {
            document
                .select(&OG_TITLE)
                .filter_map(|meta| meta.value().attr("content"))
                .map(|content| content.trim().to_string())
                .find(|content| !content.is_empty())
        });
    let description = document
        .select(&DESCRIPTION)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .unwrap_or_default()
        .to_string();
    (title, description)
}

#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn fetch_articles<F: PageFetch>(
    source: &SourceDescriptor,
    extractor: &Extractor<'_, F>,
) -> Vec<Article> {
    let index = match extractor.fetcher().fetch(BLOG_INDEX_URL).await {
        Ok(page) => page,
        Err(e) => {
            warn!(url = BLOG_INDEX_URL, error = %e, "Blog index fetch failed");
            return Vec::new();
        }
    };
    let post_urls = index_posts(&index.text(), &index.url);
    info!(count = post_urls.len(), "Indexed blog posts");
    debug!(urls = ?post_urls, "Blog post URLs");

    let mut articles = Vec::with_capacity(post_urls.len());
    for url in post_urls {
        match fetch_post(&url, source, extractor).await {
            Some(article) => articles.push(article),
            None => warn!(%url, "Blog post produced no article"),
        }
    }

    info!(count = articles.len(), "Fetched blog articles");
    articles
}

async fn fetch_post<F: PageFetch>(
    url: &str,
    source: &SourceDescriptor,
    extractor: &Extractor<'_, F>,
) -> Option<Article> {
    let html = match extractor.fetcher().fetch_text(url).await {
        Ok(html) => html,
        Err(e) => {
            warn!(%url, error = %e, "Blog post fetch failed");
            return None;
        }
    };
    let (title, description) = parse_post(&html);
    let title = title?;

    let image = extractor.main_image(url).await;
    let summary = summary_or_fallback(&description, url, extractor).await;
    Some(Article {
        id: url.to_string(),
        title,
        summary,
        link: url.to_string(),
        source: source.name.clone(),
        image,
        score: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Category;
    use crate::fetch::stub::StubFetcher;
    use crate::keywords::ImageKeywords;

    const LISTING: &str = r##"
        <a href="/blog/community">Community</a>
        <a href="/blog/smollm3">SmolLM3</a>
        <a href="/blog/smollm3#comments">Comments</a>
        <a href="/blog/?p=2">Next</a>
        <a href="/blog/zh">中文</a>
        <a href="/blog/zh/smollm3">SmolLM3 (zh)</a>
        <a href="/blog/open-r1">Open R1</a>
        <a href="/models">Models</a>
    "##;

    #[test]
    fn test_index_posts_filters_and_dedups() {
        let base = Url::parse(BLOG_INDEX_URL).unwrap();
        assert_eq!(
            index_posts(LISTING, &base),
            vec![
                "https://huggingface.co/blog/smollm3".to_string(),
                "https://huggingface.co/blog/open-r1".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_post_title_fallbacks() {
        let html = r#"<head><meta property="og:title" content="OG Title">
            <meta name="description" content=" A short description. "></head>
            <body><h1> </h1></body>"#;
        let (title, description) = parse_post(html);
        assert_eq!(title.as_deref(), Some("OG Title"));
        assert_eq!(description, "A short description.");

        let (title, description) = parse_post("<h1>Real  Title</h1>");
        assert_eq!(title.as_deref(), Some("Real Title"));
        assert_eq!(description, "");
    }

    #[tokio::test]
    async fn test_fetch_articles_builds_posts() {
        let description =
            "Training a small language model that beats larger baselines on benchmarks.";
        let post = format!(
            r#"<head><meta name="description" content="{description}"></head>
               <body><h1>SmolLM3</h1><img src="/blog/assets/smollm3/architecture.png" alt="Model architecture"></body>"#
        );
        let fetcher = StubFetcher::new()
            .with_page(
                BLOG_INDEX_URL,
                r#"<a href="/blog/smollm3">SmolLM3</a><a href="/blog/missing">x</a>"#,
            )
            .with_page("https://huggingface.co/blog/smollm3", &post);
        let keywords = ImageKeywords::default();
        let extractor = Extractor::new(&fetcher, &keywords);
        let source = SourceDescriptor {
            name: "Hugging Face Blog".to_string(),
            category: Category::Tech,
            kind: "html".to_string(),
            url: None,
            parser: Some("huggingface_blog".to_string()),
        };

        let articles = fetch_articles(&source, &extractor).await;

        assert_eq!(articles.len(), 1);
        let article = &articles[0];
        assert_eq!(article.id, "https://huggingface.co/blog/smollm3");
        assert_eq!(article.title, "SmolLM3");
        assert_eq!(article.summary, description);
        assert_eq!(article.source, "Hugging Face Blog");
        assert_eq!(
            article.image.as_deref(),
            Some("https://huggingface.co/blog/assets/smollm3/architecture.png")
        );
    }
}
