//! Default comment body validation

use folio_common::EngagementConfig;
use folio_core::{ContentValidator, ValidationOutcome};

/// Fewer letters than this are never judged as shouting
const MIN_CAPS_LETTERS: usize = 8;

/// Length, repetition, caps, and term checks driven by [`EngagementConfig`]
#[derive(Debug, Clone)]
pub struct DefaultContentValidator {
    min_chars: usize,
    max_chars: usize,
    max_repeated_words: usize,
    max_repeated_chars: usize,
    max_caps_ratio: f64,
    /// Lowercased
    disallowed_terms: Vec<String>,
}

impl DefaultContentValidator {
    /// Length and term checks with the default repetition and caps limits
    pub fn new(min_chars: usize, max_chars: usize, disallowed_terms: &[String]) -> Self {
        let defaults = EngagementConfig::default();
        Self {
            min_chars,
            max_chars,
            max_repeated_words: defaults.max_repeated_words,
            max_repeated_chars: defaults.max_repeated_chars,
            max_caps_ratio: defaults.max_caps_ratio,
            disallowed_terms: disallowed_terms
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn with_spam_limits(
        mut self,
        max_repeated_words: usize,
        max_repeated_chars: usize,
        max_caps_ratio: f64,
    ) -> Self {
        self.max_repeated_words = max_repeated_words;
        self.max_repeated_chars = max_repeated_chars;
        self.max_caps_ratio = max_caps_ratio;
        self
    }

    pub fn from_config(config: &EngagementConfig) -> Self {
        Self::new(
            config.min_comment_length,
            config.max_comment_length,
            &config.disallowed_terms,
        )
        .with_spam_limits(
            config.max_repeated_words,
            config.max_repeated_chars,
            config.max_caps_ratio,
        )
    }

    fn longest_word_run(text: &str) -> usize {
        let mut longest = 0;
        let mut run = 0;
        let mut previous: Option<String> = None;
        for word in text.split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            run = if previous.as_deref() == Some(word.as_str()) {
                run + 1
            } else {
                1
            };
            longest = longest.max(run);
            previous = Some(word);
        }
        longest
    }

    fn longest_char_run(text: &str) -> usize {
        let mut longest = 0;
        let mut run = 0;
        let mut previous = None;
        for ch in text.chars().filter(|c| !c.is_whitespace()) {
            run = if previous == Some(ch) { run + 1 } else { 1 };
            longest = longest.max(run);
            previous = Some(ch);
        }
        longest
    }

    fn is_shouting(&self, text: &str) -> bool {
        let (letters, upper) = text
            .chars()
            .filter(|c| c.is_alphabetic())
            .fold((0usize, 0usize), |(letters, upper), c| {
                (letters + 1, upper + usize::from(c.is_uppercase()))
            });
        letters >= MIN_CAPS_LETTERS && upper as f64 / letters as f64 > self.max_caps_ratio
    }
}

impl Default for DefaultContentValidator {
    fn default() -> Self {
        Self::from_config(&EngagementConfig::default())
    }
}

impl ContentValidator for DefaultContentValidator {
    fn validate(&self, text: &str) -> ValidationOutcome {
        let chars = text.trim().chars().count();
        if chars < self.min_chars {
            return ValidationOutcome::rejected("Comment is too short");
        }
        if chars > self.max_chars {
            return ValidationOutcome::rejected(format!(
                "Comment is too long (max {} characters)",
                self.max_chars
            ));
        }

        if Self::longest_word_run(text) > self.max_repeated_words
            || Self::longest_char_run(text) > self.max_repeated_chars
        {
            return ValidationOutcome::rejected("Comment looks like spam (too much repetition)");
        }
        if self.is_shouting(text) {
            return ValidationOutcome::rejected("Please don't write the comment in all caps");
        }

        let lowered = text.to_lowercase();
        if self
            .disallowed_terms
            .iter()
            .any(|term| lowered.contains(term.as_str()))
        {
            return ValidationOutcome::rejected("Comment contains language that is not allowed");
        }

        ValidationOutcome::valid()
    }

    /// Drops control characters, normalizes line endings, collapses runs of
    /// blank lines, and trims
    fn sanitize(&self, text: &str) -> String {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

        let mut out = String::with_capacity(normalized.len());
        let mut newlines = 0;
        for ch in normalized.chars() {
            if ch == '\n' {
                newlines += 1;
                if newlines <= 2 {
                    out.push(ch);
                }
                continue;
            }
            if ch.is_control() && ch != '\t' {
                continue;
            }
            newlines = 0;
            out.push(ch);
        }

        out.trim().to_string()
    }
}
