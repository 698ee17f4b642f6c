//! Route pattern matching
//!
//! Route patterns are literal paths with two wildcard tokens:
//!
//! - `**` matches any run of characters, including `/` and the empty string
//! - `*` matches any run of characters inside a single path segment (no `/`)
//!
//! Everything else is matched literally and case-sensitively against the
//! whole path. Patterns are compiled to anchored regexes once, when the
//! policy is built.

use crate::error::ConfigError;
use regex::Regex;

/// A single compiled route pattern
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
}

impl RoutePattern {
    /// Compile a route pattern
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        validate(pattern)?;

        let regex = Regex::new(&to_regex(pattern))
            .map_err(|e| ConfigError::invalid_pattern(pattern, e.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Check whether the whole path matches this pattern
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// The pattern as written in configuration
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The literal text before the first wildcard
    pub fn literal_prefix(&self) -> &str {
        match self.source.find('*') {
            Some(idx) => &self.source[..idx],
            None => &self.source,
        }
    }

    /// Returns `true` if every path matched by `other` is also matched by
    /// `self`.
    ///
    /// This is conservative: it only recognises identical patterns and
    /// catch-all patterns of the form `<literal>**`, which is enough to spot
    /// the common ordering mistake of a broad rule listed before a narrow one.
    pub fn covers(&self, other: &RoutePattern) -> bool {
        if self.source == other.source {
            return true;
        }

        match self.source.strip_suffix("**") {
            Some(prefix) if !prefix.contains('*') => other.literal_prefix().starts_with(prefix),
            _ => false,
        }
    }
}

impl PartialEq for RoutePattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for RoutePattern {}

/// One-shot helper: does `path` match `pattern`?
///
/// Compiles the pattern on every call; policy evaluation uses precompiled
/// [`RoutePattern`]s instead.
pub fn matches(pattern: &str, path: &str) -> Result<bool, ConfigError> {
    Ok(RoutePattern::new(pattern)?.matches(path))
}

fn validate(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::invalid_pattern(pattern, "pattern is empty"));
    }
    if !pattern.starts_with('/') {
        return Err(ConfigError::invalid_pattern(
            pattern,
            "pattern must start with '/'",
        ));
    }
    if pattern.contains("***") {
        return Err(ConfigError::invalid_pattern(
            pattern,
            "wildcards are '*' (one segment) or '**' (any depth)",
        ));
    }
    Ok(())
}

/// Translate a route pattern into an anchored regex
fn to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');

    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '*' {
            literal.push(c);
            continue;
        }

        out.push_str(&regex::escape(&literal));
        literal.clear();

        if chars.peek() == Some(&'*') {
            chars.next();
            out.push_str(".*");
        } else {
            out.push_str("[^/]*");
        }
    }

    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}

/// Ordered list of compiled route patterns
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    patterns: Vec<RoutePattern>,
}

impl PatternMatcher {
    /// Create a new pattern matcher from a list of route patterns
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let compiled = patterns
            .iter()
            .map(|p| RoutePattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns: compiled })
    }

    /// Create an empty pattern matcher (matches nothing)
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Check if a path matches any pattern
    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    /// Check if a path matches any pattern, returning the first matching pattern
    pub fn find_match(&self, path: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.matches(path))
            .map(|p| p.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutePattern> {
        self.patterns.iter()
    }

    /// Check if this matcher has any patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Get the number of patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}
