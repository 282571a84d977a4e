//! Cache key generators for consistent key naming.
//!
//! Keys have the shape `{domain}:{scope...}:{param values sorted by name}`.
//! Every value is trimmed and escaped so user input can neither add segments
//! nor smuggle in wildcards. Parameter values are also lowercased; scope
//! segments are identifiers and keep their case.

use super::KeyPattern;
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// News listings and searches.
pub const NEWS_DOMAIN: &str = "news";
/// Podcast listings.
pub const PODCASTS_DOMAIN: &str = "podcasts";
/// Single podcasts and their episodes.
pub const PODCAST_DOMAIN: &str = "podcast";
/// User profiles.
pub const USER_DOMAIN: &str = "user";

/// Placeholder for an absent filter such as a category.
pub const ANY_FILTER: &str = "all";
/// Placeholder for absent free text such as a search query.
pub const NO_TEXT: &str = "none";

/// Deterministic cache key builder.
///
/// Parameters are kept sorted by name, so the order in which they are added
/// never changes the resulting key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    domain: &'static str,
    scope: Vec<String>,
    params: BTreeMap<&'static str, String>,
}

impl CacheKey {
    /// Starts a key in `domain`.
    #[must_use]
    pub fn new(domain: &'static str) -> Self {
        Self {
            domain,
            scope: Vec::new(),
            params: BTreeMap::new(),
        }
    }

    /// Appends a positional segment (e.g. a resource id) right after the domain.
    ///
    /// Segments are case-sensitive: `AbC` and `abc` name different resources.
    #[must_use]
    pub fn scoped(mut self, segment: impl AsRef<str>) -> Self {
        self.scope.push(encode(segment.as_ref(), "", false));
        self
    }

    /// Adds a filter parameter; absent or blank values become `all`.
    #[must_use]
    pub fn filter(self, name: &'static str, value: Option<&str>) -> Self {
        self.with_placeholder(name, value, ANY_FILTER)
    }

    /// Adds a free-text parameter; absent or blank values become `none`.
    #[must_use]
    pub fn text(self, name: &'static str, value: Option<&str>) -> Self {
        self.with_placeholder(name, value, NO_TEXT)
    }

    /// Adds a parameter that is always present.
    #[must_use]
    pub fn param(mut self, name: &'static str, value: impl Display) -> Self {
        self.params.insert(name, encode(&value.to_string(), "", true));
        self
    }

    fn with_placeholder(mut self, name: &'static str, value: Option<&str>, placeholder: &str) -> Self {
        let encoded = match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => encode(v, placeholder, true),
            None => placeholder.to_string(),
        };
        self.params.insert(name, encoded);
        self
    }

    /// Renders the key.
    #[must_use]
    pub fn build(&self) -> String {
        self.to_string()
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.domain)?;
        for segment in self.scope.iter().chain(self.params.values()) {
            write!(f, ":{}", segment)?;
        }
        Ok(())
    }
}

/// Normalizes and escapes a value, lowercasing it when `fold_case` is set.
///
/// A value that would read as `placeholder` gets its first character
/// percent-encoded so it cannot collide with an absent parameter.
fn encode(value: &str, placeholder: &str, fold_case: bool) -> String {
    let trimmed = value.trim();
    let normalized = if fold_case {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    };
    let mut out = String::with_capacity(normalized.len());
    let mut in_whitespace = false;

    for c in normalized.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push_str("%20");
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        match c {
            ':' | '*' | '%' | '?' | '[' | ']' | '\\' => push_percent(&mut out, c),
            _ => out.push(c),
        }
    }

    if !placeholder.is_empty() && out == placeholder {
        let mut chars = out.chars();
        if let Some(first) = chars.next() {
            let mut escaped = String::with_capacity(out.len() + 2);
            push_percent(&mut escaped, first);
            escaped.push_str(chars.as_str());
            return escaped;
        }
    }

    out
}

fn push_percent(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    for byte in c.encode_utf8(&mut buf).bytes() {
        out.push_str(&format!("%{:02x}", byte));
    }
}

/// Pattern covering every news entry.
#[must_use]
pub fn news_pattern() -> KeyPattern {
    KeyPattern::prefix(&format!("{}:", NEWS_DOMAIN))
}

/// Key for a cached user profile.
#[must_use]
pub fn user_profile(subject: &str) -> CacheKey {
    CacheKey::new(USER_DOMAIN).scoped(subject)
}
