use scraper::Html;

/// Turns description markup into a short plain-text summary
pub trait Summarizer: Send + Sync {
    fn summarize(&self, markup: &str) -> String;
}

/// Strips markup, collapses whitespace and truncates to `max_chars` characters
#[derive(Debug, Clone)]
pub struct PlainTextSummarizer {
    max_chars: usize,
}

impl PlainTextSummarizer {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl Summarizer for PlainTextSummarizer {
    fn summarize(&self, markup: &str) -> String {
        let fragment = Html::parse_fragment(markup);
        let text: String = fragment.root_element().text().collect::<Vec<_>>().join(" ");
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

        collapsed.chars().take(self.max_chars).collect::<String>().trim_end().to_string()
    }
}
