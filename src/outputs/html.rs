//! Static digest page.
//!
//! The page is a single self-contained document: inline styles only, no
//! scripts, and a Content-Security-Policy that forbids everything else.
//! Every piece of article text is HTML-escaped; links are only emitted for
//! `http`/`https` URLs.

use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

use crate::models::Article;

pub const PAGE_FILENAME: &str = "index.html";

const NO_NEWS: &str = r#"<p style="color:#6c7086">No news articles today.</p>"#;
const NO_TECH: &str = r#"<p style="color:#6c7086">No research articles today.</p>"#;

/// Escape text for use in element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The escaped link if it is an `http`/`https` URL, else `#`.
pub fn safe_link(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => escape_html(raw),
        _ => "#".to_string(),
    }
}

fn image_html(image: Option<&str>) -> String {
    let src: String = image
        .unwrap_or_default()
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n'))
        .collect();
    if !src.starts_with("http") {
        return String::new();
    }
    format!(
        r#"<img src="{}" alt="" loading="lazy" style="width:100%;border-radius:8px;margin-top:12px">"#,
        escape_html(&src)
    )
}

fn render_card(article: &Article) -> String {
    let title = if article.title.is_empty() {
        "Untitled"
    } else {
        &article.title
    };
    let source = if article.source.is_empty() {
        "Unknown"
    } else {
        &article.source
    };

    format!(
        r#"<article style="background:#1e1e2e;border-radius:12px;padding:20px;margin-bottom:16px">
  <span style="background:#313244;color:#cdd6f4;padding:4px 10px;border-radius:6px;font-size:0.8em">{source}</span>
  <h3 style="margin:10px 0 8px"><a href="{link}" target="_blank" rel="noopener" style="color:#89b4fa;text-decoration:none">{title}</a></h3>
  <p style="color:#a6adc8;line-height:1.6;margin:0">{summary}</p>
  {image}
</article>"#,
        source = escape_html(source),
        link = safe_link(&article.link),
        title = escape_html(title),
        summary = escape_html(&article.summary),
        image = image_html(article.image.as_deref()),
    )
}

fn render_section(articles: &[Article], placeholder: &str) -> String {
    if articles.is_empty() {
        return placeholder.to_string();
    }
    articles.iter().map(render_card).collect::<Vec<_>>().join("\n")
}

/// Render the full digest page for `date`.
pub fn render_page(date: NaiveDate, news: &[Article], tech: &[Article]) -> String {
    let date = escape_html(&date.format("%Y-%m-%d").to_string());
    let news_cards = render_section(news, NO_NEWS);
    let tech_cards = render_section(tech, NO_TECH);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<meta http-equiv="Content-Security-Policy" content="default-src 'none'; style-src 'unsafe-inline'; img-src https:; frame-ancestors 'none'; base-uri 'none'; form-action 'none'">
<meta http-equiv="X-Content-Type-Options" content="nosniff">
<meta name="referrer" content="no-referrer">
<title>AI Daily News &mdash; {date}</title>
<style>
  *{{margin:0;padding:0;box-sizing:border-box}}
  body{{background:#11111b;color:#cdd6f4;font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;padding:24px;max-width:820px;margin:0 auto}}
  h1{{font-size:1.8em;margin-bottom:4px}}
  h2{{color:#89b4fa;margin:32px 0 16px;font-size:1.3em}}
  .date{{color:#6c7086;margin-bottom:24px}}
  a:hover{{text-decoration:underline}}
</style>
</head>
<body>
<h1>AI Daily News</h1>
<p class="date">{date}</p>

<h2>News</h2>
{news_cards}

<h2>Research &amp; Tech</h2>
{tech_cards}

<footer style="text-align:center;color:#6c7086;margin-top:48px;padding:16px;font-size:0.85em">
  Generated automatically from public RSS feeds.
</footer>
</body>
</html>
"#
    )
}

/// Write `html` to `{output_dir}/index.html`, creating the directory first.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display()))]
pub async fn write_page(output_dir: &Path, html: &str) -> Result<PathBuf, Box<dyn Error>> {
    fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(PAGE_FILENAME);
    fs::write(&path, html).await?;
    info!(path = %path.display(), bytes = html.len(), "Wrote digest page");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, link: &str, image: Option<&str>) -> Article {
        Article {
            id: link.to_string(),
            title: title.to_string(),
            summary: "Summary with <b>markup</b> & \"quotes\"".to_string(),
            link: link.to_string(),
            source: "Lab <Blog>".to_string(),
            image: image.map(str::to_string),
            score: 4,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom's & Jerry</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom&#x27;s &amp; Jerry&lt;/a&gt;"
        );
    }

    #[test]
    fn test_safe_link() {
        assert_eq!(safe_link("https://example.com/a?b=1&c=2"), "https://example.com/a?b=1&amp;c=2");
        assert_eq!(safe_link("HTTP://example.com/"), "HTTP://example.com/");
        assert_eq!(safe_link("javascript:alert(1)"), "#");
        assert_eq!(safe_link("/relative/path"), "#");
        assert_eq!(safe_link(""), "#");
    }

    #[test]
    fn test_image_html() {
        assert_eq!(image_html(None), "");
        assert_eq!(image_html(Some("data:image/png;base64,AAAA")), "");
        let html = image_html(Some(" https://cdn.example.com/a.png\r\n"));
        assert!(html.contains(r#"src="https://cdn.example.com/a.png""#));
        assert!(!html.contains("onerror"));
    }

    #[test]
    fn test_render_page_escapes_everything() {
        let news = vec![article(
            "<script>alert(1)</script>",
            "javascript:alert(1)",
            Some("https://example.com/img.png"),
        )];

        let page = render_page(date(), &news, &[]);

        assert!(page.contains("default-src 'none'"));
        assert!(page.contains(r#"<meta name="referrer" content="no-referrer">"#));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!page.contains("<script>"));
        assert!(page.contains(r##"<a href="#""##));
        assert!(page.contains("Lab &lt;Blog&gt;"));
        assert!(page.contains("&lt;b&gt;markup&lt;/b&gt; &amp; &quot;quotes&quot;"));
        assert!(page.contains(r#"<img src="https://example.com/img.png""#));
        assert!(page.contains(NO_TECH));
        assert!(!page.contains(NO_NEWS));
        assert!(page.contains("<title>AI Daily News &mdash; 2025-05-06</title>"));
    }

    #[test]
    fn test_render_card_defaults() {
        let mut a = article("", "https://example.com/post", None);
        a.source = String::new();
        let card = render_card(&a);
        assert!(card.contains(">Untitled</a>"));
        assert!(card.contains(">Unknown</span>"));
        assert!(card.contains(r#"href="https://example.com/post""#));
        assert!(!card.contains("<img"));
    }

    #[test]
    fn test_render_section_order_and_placeholder() {
        let articles = vec![
            article("First", "https://example.com/1", None),
            article("Second", "https://example.com/2", None),
        ];
        let section = render_section(&articles, NO_NEWS);
        let first = section.find("First").unwrap();
        let second = section.find("Second").unwrap();
        assert!(first < second);
        assert_eq!(render_section(&[], NO_NEWS), NO_NEWS);
    }

    #[tokio::test]
    async fn test_write_page_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("docs");

        let path = write_page(&output_dir, "<html></html>").await.unwrap();

        assert_eq!(path, output_dir.join(PAGE_FILENAME));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<html></html>");
    }
}
