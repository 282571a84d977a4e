//! Invalidation patterns.

use std::fmt;
use tidings_core::{TidingsError, TidingsResult};

/// A validated key pattern: an exact key, or a prefix followed by a single
/// trailing `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    raw: String,
}

impl KeyPattern {
    /// Parses and validates a pattern.
    pub fn parse(pattern: &str) -> TidingsResult<Self> {
        if pattern.is_empty() {
            return Err(TidingsError::validation("Pattern must not be empty"));
        }

        let wildcards = pattern.matches('*').count();
        if wildcards > 1 || (wildcards == 1 && !pattern.ends_with('*')) {
            return Err(TidingsError::validation(format!(
                "Invalid pattern '{}': only a single trailing '*' is supported",
                pattern
            )));
        }

        Ok(Self {
            raw: pattern.to_string(),
        })
    }

    /// Pattern matching every key that starts with `literal`.
    ///
    /// `literal` must not contain `*`.
    #[must_use]
    pub fn prefix(literal: &str) -> Self {
        debug_assert!(!literal.contains('*'));
        Self {
            raw: format!("{}*", literal),
        }
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the pattern ends with a wildcard.
    #[must_use]
    pub fn is_prefix(&self) -> bool {
        self.raw.ends_with('*')
    }

    fn literal(&self) -> &str {
        self.raw.strip_suffix('*').unwrap_or(&self.raw)
    }

    /// Whether `key` matches this pattern.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        if self.is_prefix() {
            key.starts_with(self.literal())
        } else {
            key == self.raw
        }
    }

    /// Renders the pattern as a Redis `MATCH` glob, escaping glob
    /// metacharacters in the literal part.
    #[must_use]
    pub fn to_redis_glob(&self) -> String {
        let mut glob = String::with_capacity(self.raw.len() + 4);
        for c in self.literal().chars() {
            if matches!(c, '?' | '[' | ']' | '\\') {
                glob.push('\\');
            }
            glob.push(c);
        }
        if self.is_prefix() {
            glob.push('*');
        }
        glob
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_pattern_matches() {
        let pattern = KeyPattern::parse("news:*").unwrap();
        assert!(pattern.matches("news:all:none:1"));
        assert!(pattern.matches("news:"));
        assert!(!pattern.matches("podcasts:popular"));
        assert!(!pattern.matches("new"));
    }

    #[test]
    fn test_exact_pattern() {
        let pattern = KeyPattern::parse("podcast:tech-talks").unwrap();
        assert!(!pattern.is_prefix());
        assert!(pattern.matches("podcast:tech-talks"));
        assert!(!pattern.matches("podcast:tech-talks:episodes"));
    }

    #[test]
    fn test_rejects_invalid_patterns() {
        assert!(KeyPattern::parse("").is_err());
        assert!(KeyPattern::parse("news:*:page").is_err());
        assert!(KeyPattern::parse("*news*").is_err());
        assert!(KeyPattern::parse("*").is_ok());
    }

    #[test]
    fn test_redis_glob_escapes_metacharacters() {
        let pattern = KeyPattern::parse("news:[a]?*").unwrap();
        assert_eq!(pattern.to_redis_glob(), "news:\\[a\\]\\?*");
        assert_eq!(KeyPattern::parse("news:*").unwrap().to_redis_glob(), "news:*");
    }
}
