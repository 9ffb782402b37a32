//! Best-effort content extraction.
//!
//! Everything here degrades instead of failing: a fetch or parse problem
//! yields an empty summary or `None`, logged once at the point where the
//! value is produced. The parsing halves are plain functions over HTML
//! strings; [`Extractor`] wires them to a [`PageFetch`] implementation.
//!
//! # Operations
//!
//! | Operation | Network | Result on failure |
//! |-----------|---------|-------------------|
//! | [`clean_summary`] | none | n/a |
//! | [`Extractor::fallback_summary`] | article page | `""` |
//! | [`Extractor::main_image`] | article page | `None` |
//! | [`Extractor::arxiv_figure`] | abstract page + HTML rendering | `None` |

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::fetch::PageFetch;
use crate::keywords::{HOSTED_IMAGE_MARKERS, ImageKeywords, contains_any};
use crate::utils::{collapse_whitespace, truncate_for_log};

/// Paragraphs at or below this many characters are skipped by the fallback.
const MIN_PARAGRAPH_CHARS: usize = 30;
/// The fallback stops collecting once its text is longer than this.
const FALLBACK_TARGET_CHARS: usize = 500;

static ARXIV_ANNOUNCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^arXiv:[\d.]+v\d+\s+Announce Type:\s*\w+\s*").expect("valid regex")
});
static LEADING_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[【\[].*?[】\]]\s*").expect("valid regex"));
static ARXIV_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"arxiv\.org/abs/([\d.]+)").expect("valid regex"));
static VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"v(\d+)").expect("valid regex"));

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));
static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));
static BOLD: Lazy<Selector> = Lazy::new(|| selector("b"));
static LTX_FIGURE: Lazy<Selector> = Lazy::new(|| selector("figure.ltx_figure"));
static SUMMARY_NOISE: Lazy<Selector> =
    Lazy::new(|| selector("script, style, img, footer, nav"));
/// Content containers, in order of preference.
static CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["div.prose", "article", "section", "div.content"]
        .into_iter()
        .map(selector)
        .collect()
});

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Whitespace-normalized text of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Normalize a feed-provided summary.
///
/// HTML input (anything containing both `<` and `>`) is reduced to its first
/// non-empty paragraph, or to all of its text when there is none, after
/// dropping scripts, styles, images, footers and navigation. A leading arXiv
/// announcement line and a leading bracketed tag are removed, and whitespace
/// is collapsed.
pub fn clean_summary(raw: &str) -> String {
    let text = if raw.contains('<') && raw.contains('>') {
        html_summary_text(raw)
    } else {
        raw.trim().to_string()
    };

    let text = ARXIV_ANNOUNCE.replace(&text, "");
    let text = LEADING_TAG.replace(&text, "");
    collapse_whitespace(&text)
}

fn html_summary_text(raw: &str) -> String {
    let mut fragment = Html::parse_fragment(raw);
    let noise: Vec<_> = fragment.select(&SUMMARY_NOISE).map(|el| el.id()).collect();
    for id in noise {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }

    // Select from the root so detached subtrees are not visited.
    let root = fragment.root_element();
    root.select(&PARAGRAPH)
        .map(element_text)
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| element_text(root))
}

/// Build a summary from the paragraphs of an article page.
///
/// Paragraphs come from the first matching content container (`div.prose`,
/// `article`, `section`, `div.content`) or from the whole document. Only
/// paragraphs longer than 30 characters that are not cookie notices or
/// tables of contents are kept; collection stops past 500 characters.
pub fn summary_from_page(html: &str) -> String {
    let document = Html::parse_document(html);
    let container = CONTAINERS
        .iter()
        .find_map(|container| document.select(container).next());
    let paragraphs: Vec<ElementRef<'_>> = match container {
        Some(container) => container.select(&PARAGRAPH).collect(),
        None => document.select(&PARAGRAPH).collect(),
    };

    let mut body = String::new();
    for paragraph in paragraphs {
        let text = element_text(paragraph);
        let lower = text.to_lowercase();
        if text.chars().count() <= MIN_PARAGRAPH_CHARS
            || lower.contains("cookie")
            || lower.contains("table of contents")
        {
            continue;
        }
        body.push_str(&text);
        body.push_str("\n\n");
        if body.chars().count() > FALLBACK_TARGET_CHARS {
            break;
        }
    }
    body.trim().to_string()
}

fn is_hosted_image(src_lower: &str) -> bool {
    contains_any(src_lower, HOSTED_IMAGE_MARKERS)
}

/// +3 for a content keyword in `alt`, +1 when the URL is not CDN/avatar hosted.
fn score_image(src_lower: &str, alt_lower: &str, keywords: &ImageKeywords) -> u32 {
    let mut score = 0;
    if keywords.is_content(alt_lower) {
        score += 3;
    }
    if !is_hosted_image(src_lower) {
        score += 1;
    }
    score
}

/// Pick the most representative `<img>` on a page.
///
/// Images whose `src` or `alt` mention an unwanted keyword, or whose `src`
/// points at a CDN or avatar service, are dropped. The rest are scored and
/// the best one wins. Equal scores resolve to the lexicographically greatest
/// URL: arbitrary, but stable from run to run.
pub fn select_main_image(html: &str, page_url: &Url, keywords: &ImageKeywords) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&IMG)
        .filter_map(|img| {
            let src = img.value().attr("src").unwrap_or_default().trim();
            if src.is_empty() {
                return None;
            }
            let src_lower = src.to_lowercase();
            let alt = img.value().attr("alt").unwrap_or_default().trim().to_lowercase();
            if keywords.is_unwanted(&src_lower)
                || is_hosted_image(&src_lower)
                || keywords.is_unwanted(&alt)
            {
                return None;
            }

            let resolved = if src.starts_with("http") {
                src.to_string()
            } else {
                page_url.join(src).ok()?.to_string()
            };
            let score = score_image(&resolved.to_lowercase(), &alt, keywords);
            (score > 0).then_some((score, resolved))
        })
        .max()
        .map(|(_, url)| url)
}

/// Paper id from an `arxiv.org/abs/<id>` link.
pub fn arxiv_paper_id(url: &str) -> Option<&str> {
    ARXIV_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Latest version tag listed on an arXiv abstract page, `v1` if none.
pub fn latest_version(abstract_html: &str) -> String {
    let document = Html::parse_document(abstract_html);
    document
        .select(&BOLD)
        .filter_map(|b| {
            let text = b.text().collect::<String>();
            VERSION.captures(&text)?.get(1)?.as_str().parse::<u32>().ok()
        })
        .max()
        .map_or_else(|| "v1".to_string(), |n| format!("v{n}"))
}

/// Absolute `src` of the image in the first `figure.ltx_figure`.
pub fn first_figure_src(html: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let figure = document.select(&LTX_FIGURE).next()?;
    let src = figure.select(&IMG).next()?.value().attr("src")?;
    base.join(src.trim()).ok().map(|url| url.to_string())
}

/// Fetching half of the extractor.
#[derive(Debug)]
pub struct Extractor<'a, F> {
    fetcher: &'a F,
    images: &'a ImageKeywords,
}

impl<'a, F: PageFetch> Extractor<'a, F> {
    pub fn new(fetcher: &'a F, images: &'a ImageKeywords) -> Self {
        Self { fetcher, images }
    }

    pub fn fetcher(&self) -> &'a F {
        self.fetcher
    }

    /// Summary built from the article page itself; empty on failure.
    #[instrument(level = "info", skip(self))]
    pub async fn fallback_summary(&self, url: &str) -> String {
        match self.fetcher.fetch_text(url).await {
            Ok(html) => {
                let summary = summary_from_page(&html);
                debug!(%url, summary = %truncate_for_log(&summary, 80), "Built fallback summary");
                summary
            }
            Err(e) => {
                warn!(%url, error = %e, "Fallback summary failed");
                String::new()
            }
        }
    }

    /// Representative image for an article link.
    ///
    /// arXiv links are routed to [`Extractor::arxiv_figure`].
    #[instrument(level = "info", skip(self))]
    pub async fn main_image(&self, url: &str) -> Option<String> {
        if url.contains("arxiv.org") {
            return self.arxiv_figure(url).await;
        }

        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(%url, error = %e, "Extract image failed");
                return None;
            }
        };
        let image = select_main_image(&page.text(), &page.url, self.images);
        debug!(%url, image = ?image, "Main image selection finished");
        image
    }

    /// First figure of an arXiv paper, via its HTML rendering.
    #[instrument(level = "info", skip(self))]
    pub async fn arxiv_figure(&self, paper_url: &str) -> Option<String> {
        let Some(paper_id) = arxiv_paper_id(paper_url) else {
            debug!(%paper_url, "No arXiv paper id in link");
            return None;
        };

        let abstract_page = match self.fetcher.fetch_text(paper_url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(%paper_url, error = %e, "Failed to fetch arXiv abstract page");
                return None;
            }
        };
        let version = latest_version(&abstract_page);
        let html_url = format!("https://arxiv.org/html/{paper_id}{version}/");

        let rendering = match self.fetcher.fetch(&html_url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(%paper_url, %html_url, error = %e, "Failed to fetch arXiv HTML rendering");
                return None;
            }
        };
        let figure = first_figure_src(&rendering.text(), &rendering.url);
        if figure.is_none() {
            debug!(%html_url, "arXiv rendering has no ltx_figure image");
        }
        figure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::stub::StubFetcher;

    fn base() -> Url {
        Url::parse("https://blog.example.com/posts/new-model").unwrap()
    }

    #[test]
    fn test_clean_summary_arxiv_boilerplate() {
        let raw = "arXiv:2301.00001v2 Announce Type: new  Some text.  ";
        assert_eq!(clean_summary(raw), "Some text.");
    }

    #[test]
    fn test_clean_summary_leading_tags() {
        assert_eq!(clean_summary("【速報】 New model out"), "New model out");
        assert_eq!(clean_summary("[Research] Scaling laws   revisited"), "Scaling laws revisited");
        // only a leading tag is removed
        assert_eq!(clean_summary("Results [v2] are in"), "Results [v2] are in");
    }

    #[test]
    fn test_clean_summary_html_first_paragraph() {
        let raw = r#"<div><img src="x.png"><p>  </p><p>First   real
            paragraph.</p><p>Second.</p></div>"#;
        assert_eq!(clean_summary(raw), "First real paragraph.");
    }

    #[test]
    fn test_clean_summary_html_strips_noise_without_paragraphs() {
        let raw = r#"<nav>Home | About</nav><span>Body text</span><script>var x = 1;</script>
            <style>p { color: red }</style><footer>Copyright</footer>"#;
        assert_eq!(clean_summary(raw), "Body text");
    }

    #[test]
    fn test_clean_summary_ignores_paragraphs_inside_nav() {
        let raw = "<nav><p>Menu entry</p></nav><p>Actual summary</p>";
        assert_eq!(clean_summary(raw), "Actual summary");
    }

    #[test]
    fn test_clean_summary_plain_text() {
        assert_eq!(clean_summary("  plain\ttext\n\nhere "), "plain text here");
        assert_eq!(clean_summary(""), "");
    }

    #[test]
    fn test_summary_from_page_prefers_prose_container() {
        let html = r#"<html><body>
            <p>This paragraph lives outside the container and is long enough.</p>
            <div class="prose">
              <p>Short.</p>
              <p>We accept cookies to improve your experience on this website.</p>
              <p>The new model improves reasoning benchmarks by a wide margin.</p>
            </div>
        </body></html>"#;
        assert_eq!(
            summary_from_page(html),
            "The new model improves reasoning benchmarks by a wide margin."
        );
    }

    #[test]
    fn test_summary_from_page_stops_after_target_length() {
        let paragraph = "Sentence about machine learning research progress. ".repeat(4);
        let html = format!(
            "<article>{}</article>",
            (0..10).map(|_| format!("<p>{paragraph}</p>")).collect::<String>()
        );
        let summary = summary_from_page(&html);
        let kept = summary.split("\n\n").count();
        // each paragraph is ~200 chars, so three cross the 500 char mark
        assert_eq!(kept, 3);
    }

    #[test]
    fn test_summary_from_page_without_container() {
        let html = "<p>Table of Contents for this very long article page</p>\
                    <p>A plain paragraph that is comfortably over thirty characters.</p>";
        assert_eq!(
            summary_from_page(html),
            "A plain paragraph that is comfortably over thirty characters."
        );
    }

    #[test]
    fn test_select_main_image_prefers_content_alt() {
        let html = r#"
            <img src="/images/site-logo.png" alt="Logo">
            <img src="https://cdn.example.com/hero.png" alt="model architecture">
            <img src="/images/photo.jpg" alt="team photo">
            <img src="/images/fig1.png" alt="Figure 1: benchmark results">
        "#;
        let image = select_main_image(html, &base(), &ImageKeywords::default());
        assert_eq!(image.as_deref(), Some("https://blog.example.com/images/fig1.png"));
    }

    #[test]
    fn test_select_main_image_tie_breaks_on_greatest_url() {
        let html = r#"<img src="/a.png" alt="x"><img src="/b.png" alt="y">"#;
        let image = select_main_image(html, &base(), &ImageKeywords::default());
        assert_eq!(image.as_deref(), Some("https://blog.example.com/b.png"));
    }

    #[test]
    fn test_select_main_image_none_when_all_filtered() {
        let html = r#"<img src="/avatar.png"><img src=""><img src="https://secure.gravatar.com/x">"#;
        assert_eq!(select_main_image(html, &base(), &ImageKeywords::default()), None);
    }

    #[test]
    fn test_arxiv_paper_id() {
        assert_eq!(arxiv_paper_id("https://arxiv.org/abs/2301.00001v2"), Some("2301.00001"));
        assert_eq!(arxiv_paper_id("https://arxiv.org/abs/2410.12345"), Some("2410.12345"));
        assert_eq!(arxiv_paper_id("https://arxiv.org/pdf/2410.12345"), None);
    }

    #[test]
    fn test_latest_version() {
        let html = "<div><b>[v1]</b> Mon, 2 Jan 2023</div><div><b>[v3]</b> Fri</div><b>[v2]</b>";
        assert_eq!(latest_version(html), "v3");
        assert_eq!(latest_version("<p>no history</p>"), "v1");
    }

    #[test]
    fn test_first_figure_src() {
        let html = r#"<figure class="ltx_table"><img src="t.png"></figure>
            <figure class="ltx_figure"><img src="x1.png"></figure>
            <figure class="ltx_figure"><img src="x2.png"></figure>"#;
        let base = Url::parse("https://arxiv.org/html/2301.00001v2/").unwrap();
        assert_eq!(
            first_figure_src(html, &base).as_deref(),
            Some("https://arxiv.org/html/2301.00001v2/x1.png")
        );
    }

    #[tokio::test]
    async fn test_arxiv_figure_two_stage_fetch() {
        let fetcher = StubFetcher::new()
            .with_page(
                "https://arxiv.org/abs/2301.00001",
                "<b>[v1]</b><b>[v2]</b>",
            )
            .with_page(
                "https://arxiv.org/html/2301.00001v2/",
                r#"<figure class="ltx_figure"><img src="x1.png"></figure>"#,
            );
        let keywords = ImageKeywords::default();
        let extractor = Extractor::new(&fetcher, &keywords);

        let figure = extractor.main_image("https://arxiv.org/abs/2301.00001").await;

        assert_eq!(figure.as_deref(), Some("https://arxiv.org/html/2301.00001v2/x1.png"));
        assert_eq!(
            fetcher.requests(),
            vec![
                "https://arxiv.org/abs/2301.00001".to_string(),
                "https://arxiv.org/html/2301.00001v2/".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_arxiv_figure_without_id_makes_no_request() {
        let fetcher = StubFetcher::new();
        let keywords = ImageKeywords::default();
        let extractor = Extractor::new(&fetcher, &keywords);

        assert_eq!(extractor.arxiv_figure("https://arxiv.org/list/cs.AI/new").await, None);
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetches_degrade() {
        let fetcher = StubFetcher::new();
        let keywords = ImageKeywords::default();
        let extractor = Extractor::new(&fetcher, &keywords);

        assert_eq!(extractor.fallback_summary("https://example.com/missing").await, "");
        assert_eq!(extractor.main_image("https://example.com/missing").await, None);
        assert_eq!(extractor.arxiv_figure("https://arxiv.org/abs/2301.00001").await, None);
    }
}
