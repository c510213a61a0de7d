use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error(
        "No words left to render: every word was excluded or the source text has no usable words"
    )]
    EmptyCorpus,
}

/// Lowercase tokens in source order, duplicates kept. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCorpus {
    tokens: Vec<String>,
}

impl NormalizedCorpus {
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Space-joined text handed to the rasterizer.
    pub fn as_text(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Case-insensitive exact-match exclusion terms.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    terms: HashSet<String>,
}

impl ExclusionSet {
    pub fn parse(raw: Option<&str>) -> Self {
        let terms = raw
            .unwrap_or_default()
            .split(',')
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect();
        Self { terms }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.terms.contains(token)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[,\s]+").expect("separator pattern"))
}

fn strip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\w-]").expect("strip pattern"))
}

/// Splits on runs of whitespace and commas.
pub fn split_raw_tokens(text: &str) -> impl Iterator<Item = &str> {
    separator_pattern()
        .split(text)
        .filter(|token| !token.is_empty())
}

/// Drops everything except word characters and hyphens, then lowercases.
/// A token left with no word character at all is dropped.
pub fn clean_token(raw: &str) -> Option<String> {
    let stripped = strip_pattern().replace_all(raw, "");
    if !stripped.chars().any(|ch| ch != '-') {
        return None;
    }
    Some(stripped.to_lowercase())
}

pub fn normalize(
    text: &str,
    exclude_words: Option<&str>,
) -> Result<NormalizedCorpus, NormalizeError> {
    let exclusions = ExclusionSet::parse(exclude_words);
    let tokens = split_raw_tokens(text)
        .filter_map(clean_token)
        .filter(|token| !exclusions.contains(token))
        .collect::<Vec<_>>();
    if tokens.is_empty() {
        return Err(NormalizeError::EmptyCorpus);
    }
    Ok(NormalizedCorpus { tokens })
}
