//! Relevance scoring.

use crate::keywords::{KEYWORDS, lowercase_all};
use crate::models::Article;

/// Pure, deterministic article scorer.
///
/// | Signal | Points |
/// |--------|--------|
/// | keyword in title | +2 each |
/// | keyword in summary | +1 each |
/// | image present | +2 |
/// | summary has 2+ line breaks or more than 300 chars | +1 |
/// | title length 10..=100 chars | +1 |
#[derive(Debug, Clone)]
pub struct Scorer {
    keywords: Vec<String>,
}

impl Scorer {
    pub fn new<I>(keywords: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            keywords: lowercase_all(keywords),
        }
    }

    pub fn score(&self, article: &Article) -> u32 {
        let title = article.title.to_lowercase();
        let summary = article.summary.to_lowercase();

        let mut score = 0;
        for keyword in &self.keywords {
            if title.contains(keyword.as_str()) {
                score += 2;
            }
            if summary.contains(keyword.as_str()) {
                score += 1;
            }
        }

        if article.image.as_deref().is_some_and(|url| !url.is_empty()) {
            score += 2;
        }
        if summary.matches('\n').count() >= 2 || summary.chars().count() > 300 {
            score += 1;
        }
        if (10..=100).contains(&title.chars().count()) {
            score += 1;
        }

        score
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(KEYWORDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, summary: &str, image: Option<&str>) -> Article {
        Article {
            id: "id".to_string(),
            title: title.to_string(),
            summary: summary.to_string(),
            link: "https://example.com".to_string(),
            source: "Example".to_string(),
            image: image.map(str::to_string),
            score: 0,
        }
    }

    #[test]
    fn test_score_all_signals() {
        let scorer = Scorer::new(["transformer", "gpt"]);
        let summary = format!("gpt {}", "a".repeat(306));
        assert_eq!(summary.chars().count(), 310);
        let a = article(
            "New Transformer Model Released",
            &summary,
            Some("https://example.com/fig.png"),
        );
        // 2 (title kw) + 1 (summary kw) + 2 (image) + 1 (long summary) + 1 (title length)
        assert_eq!(scorer.score(&a), 7);
    }

    #[test]
    fn test_score_is_deterministic() {
        let scorer = Scorer::default();
        let a = article("OpenAI launches a GPT benchmark", "LLM evaluation news", None);
        assert_eq!(scorer.score(&a), scorer.score(&a));
    }

    #[test]
    fn test_keyword_counts_in_title_and_summary_independently() {
        let scorer = Scorer::new(["llm"]);
        let a = article("LLM", "an llm", None);
        // title kw +2, summary kw +1, title too short for the length bonus
        assert_eq!(scorer.score(&a), 3);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let scorer = Scorer::new(["DeepSeek"]);
        let a = article("deepseek", "", None);
        assert_eq!(scorer.score(&a), 2);
    }

    #[test]
    fn test_line_breaks_count_as_rich_summary() {
        let scorer = Scorer::new(Vec::<String>::new());
        assert_eq!(scorer.score(&article("x", "a\nb\nc", None)), 1);
        assert_eq!(scorer.score(&article("x", "a\nb", None)), 0);
    }

    #[test]
    fn test_empty_image_is_not_an_image() {
        let scorer = Scorer::new(Vec::<String>::new());
        assert_eq!(scorer.score(&article("x", "", Some(""))), 0);
        assert_eq!(scorer.score(&article("x", "", Some("https://a/b.png"))), 2);
    }

    #[test]
    fn test_title_length_bounds() {
        let scorer = Scorer::new(Vec::<String>::new());
        assert_eq!(scorer.score(&article(&"t".repeat(9), "", None)), 0);
        assert_eq!(scorer.score(&article(&"t".repeat(10), "", None)), 1);
        assert_eq!(scorer.score(&article(&"t".repeat(100), "", None)), 1);
        assert_eq!(scorer.score(&article(&"t".repeat(101), "", None)), 0);
    }
}
