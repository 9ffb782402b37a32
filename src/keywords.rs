//! Built-in keyword lists.
//!
//! These are plain data. The scorer and the image selector receive them (or
//! the overrides from `config.yaml`) at construction time and never mutate
//! them afterwards.

/// Topic keywords used for relevance scoring. Matched as lower-case
/// substrings of the title and summary.
pub const KEYWORDS: &[&str] = &[
    // LLM / language models
    "llm", "gpt", "chatgpt", "openai", "bard", "claude", "mistral", "mixtral", "gemini",
    "transformer", "attention", "autoregressive", "language model", "tokenizer",
    "pretraining", "finetuning", "instruction tuning", "rlhf", "deepseek",
    // Multimodal
    "multimodal", "vision-language", "vlm", "clip", "blip", "llava", "flamingo", "dalle",
    "image captioning", "audio-language", "text-to-audio",
    // Reinforcement learning
    "reinforcement learning", "rl", "actor-critic", "ppo", "td3", "q-learning",
    "policy gradient", "self-play", "reward shaping", "exploration",
    // General ML
    "machine learning", "deep learning", "classifier", "classification", "decision tree",
    "random forest", "xgboost", "svm", "ensemble", "supervised learning",
    "unsupervised learning", "semi-supervised", "self-supervised", "transfer learning",
    "meta-learning", "active learning", "few-shot", "zero-shot", "learning algorithm",
    // Vision
    "computer vision", "object detection", "segmentation", "image classification", "resnet",
    "cnn", "vision transformer", "vit", "image generation", "style transfer",
    "3d reconstruction", "depth estimation", "pose estimation",
    // Diffusion
    "diffusion model", "ddpm", "score-based", "latent diffusion", "text-to-image",
    "stable diffusion", "denoising", "noise schedule",
    // Industry
    "funding", "investment", "acquisition", "launch", "release", "series a", "seed round",
    "startup", "partnership", "collaboration",
    // Benchmarks
    "benchmark", "leaderboard", "evaluation", "mmlu", "hellaswag", "gsm8k", "truthfulqa",
    "performance", "accuracy", "score", "precision", "recall",
    // Infrastructure
    "scaling law", "gpu", "moe", "sparse model", "quantization", "distillation",
    "inference acceleration", "training compute", "deployment", "efficiency", "latency",
    // Open source and frameworks
    "huggingface", "pytorch", "tensorflow", "jax", "open source", "model card", "dataset",
    "weights", "github", "colab", "api",
    // Signal processing
    "signal processing", "audio", "speech", "voice", "ultrasound", "acoustic", "fft",
    "wavelet", "filtering", "sampling", "modulation", "demodulation", "beamforming",
    "source separation", "speech enhancement", "noise reduction", "echo cancellation",
];

/// Terms that mark an `<img>` as chrome (navigation, branding, ads) rather
/// than article content. Checked against both `src` and `alt`.
pub const UNWANTED_IMAGE_KEYWORDS: &[&str] = &[
    "avatar", "logo", "icon", "favicon", "thumbnail",
    "profile", "menu", "nav", "header", "footer", "sidebar", "widget",
    "loading", "spinner", "placeholder", "empty", "no-image",
    "background", "banner", "decorative", "watermark",
    "sponsor", "ads", "advertisement", "promotion",
    "brand", "partner", "badge", "certification",
    "arrow", "dropdown", "search", "expand", "collapse",
];

/// Terms in an image's `alt` text that suggest a figure worth showing.
pub const CONTENT_IMAGE_KEYWORDS: &[&str] = &[
    "model", "chart", "figure", "result", "example", "demo", "case", "experiment",
    "plot", "graph", "table", "visualization",
    "architecture", "diagram", "pipeline", "framework",
    "output", "input", "prediction", "inference",
    "comparison", "ablation", "benchmark", "evaluation",
    "dataset", "data", "training", "testing",
    "sample", "case study", "application",
    "analysis", "study", "research",
    "reconstruction", "generation", "segmentation", "translation",
    "classification", "detection", "recognition",
    "heatmap", "attention", "embedding", "feature",
    "loss", "accuracy", "precision", "recall",
    "performance", "metric", "score",
];

/// Substrings of an image URL that indicate a CDN or avatar service.
pub const HOSTED_IMAGE_MARKERS: &[&str] = &["cdn", "gravatar"];

/// Keyword lists consumed by main-image selection.
#[derive(Debug, Clone)]
pub struct ImageKeywords {
    unwanted: Vec<String>,
    content: Vec<String>,
}

impl ImageKeywords {
    pub fn new<U, C>(unwanted: U, content: C) -> Self
    where
        U: IntoIterator,
        U::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            unwanted: lowercase_all(unwanted),
            content: lowercase_all(content),
        }
    }

    /// `text` must already be lower-cased.
    pub fn is_unwanted(&self, text: &str) -> bool {
        contains_any(text, &self.unwanted)
    }

    /// `text` must already be lower-cased.
    pub fn is_content(&self, text: &str) -> bool {
        contains_any(text, &self.content)
    }
}

impl Default for ImageKeywords {
    fn default() -> Self {
        Self::new(UNWANTED_IMAGE_KEYWORDS, CONTENT_IMAGE_KEYWORDS)
    }
}

pub fn contains_any<S: AsRef<str>>(text: &str, keywords: &[S]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_ref()))
}

pub(crate) fn lowercase_all<I>(words: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_keywords_lowercase_overrides() {
        let keywords = ImageKeywords::new(["LOGO", " Banner "], ["Figure"]);
        assert!(keywords.is_unwanted("site-logo.png"));
        assert!(keywords.is_unwanted("top banner"));
        assert!(keywords.is_content("figure 1: results"));
        assert!(!keywords.is_content("a photo"));
    }

    #[test]
    fn test_empty_keywords_dropped() {
        let keywords = ImageKeywords::new(["", "  "], Vec::<String>::new());
        assert!(!keywords.is_unwanted("anything"));
    }

    #[test]
    fn test_contains_any() {
        assert!(contains_any("https://cdn.example.com/a.png", HOSTED_IMAGE_MARKERS));
        assert!(!contains_any("https://example.com/a.png", HOSTED_IMAGE_MARKERS));
    }
}
