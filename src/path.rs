//! Relative path matching.
//!
//! Path predicates never look at the absolute request path. Each nested chain
//! sees a [`PathBinding`]: the part of the path consumed by enclosing prefixes
//! and the part still to be matched. Matching consumes whole segments only.

use std::collections::HashMap;
use std::fmt;

use crate::core::ChainBuildError;

/// What has been consumed from the request path so far, and what remains.
///
/// Invariant: `consumed() + remaining()` is the request path without its
/// leading `/`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathBinding {
    consumed: String,
    remaining: String,
    tokens: HashMap<String, String>,
}

impl PathBinding {
    /// Root binding for an absolute request path.
    pub fn root(path: &str) -> Self {
        Self {
            consumed: String::new(),
            remaining: path.strip_prefix('/').unwrap_or(path).to_string(),
            tokens: HashMap::new(),
        }
    }

    /// Raw consumed text, including the separator after the last bound segment.
    #[inline]
    pub fn consumed(&self) -> &str {
        &self.consumed
    }

    /// Consumed path without a trailing separator, e.g. `api/v1`.
    #[inline]
    pub fn bound(&self) -> &str {
        self.consumed.strip_suffix('/').unwrap_or(&self.consumed)
    }

    /// Path not yet matched by any enclosing predicate.
    #[inline]
    pub fn remaining(&self) -> &str {
        &self.remaining
    }

    /// Value captured by a `:name` token here or in an enclosing binding.
    pub fn token(&self, name: &str) -> Option<&str> {
        self.tokens.get(name).map(String::as_str)
    }

    /// All captured tokens; nearer bindings override outer ones.
    pub fn tokens(&self) -> &HashMap<String, String> {
        &self.tokens
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(String),
}

/// A compiled `a/:id/b` style pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern. Leading and trailing `/` are ignored; `""` matches
    /// zero segments.
    pub fn parse(pattern: &str) -> Result<Self, ChainBuildError> {
        let trimmed = pattern.trim_matches('/');
        let invalid = |reason| ChainBuildError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        if !trimmed.is_empty() {
            for raw in trimmed.split('/') {
                if raw.is_empty() {
                    return Err(invalid("empty segment"));
                }
                match raw.strip_prefix(':') {
                    Some("") => return Err(invalid("token without a name")),
                    Some(name) => segments.push(Segment::Token(name.to_string())),
                    None => segments.push(Segment::Literal(raw.to_string())),
                }
            }
        }

        Ok(Self {
            source: trimmed.to_string(),
            segments,
        })
    }

    /// Number of segments this pattern consumes.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the pattern has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Match against the remaining path of `parent`.
    ///
    /// `exhaustive` requires the pattern to consume everything that remains
    /// (a single trailing `/` is tolerated). On success the returned binding
    /// has advanced past exactly `self.len()` segments.
    pub fn bind(&self, parent: &PathBinding, exhaustive: bool) -> Option<PathBinding> {
        let mut rest = parent.remaining.as_str();
        let mut consumed_len = 0;
        let mut tokens = Vec::new();

        for segment in &self.segments {
            let (value, after, sep) = match rest.find('/') {
                Some(idx) => (&rest[..idx], &rest[idx + 1..], 1),
                None => (rest, "", 0),
            };
            if value.is_empty() {
                return None;
            }
            match segment {
                Segment::Literal(literal) if literal == value => {}
                Segment::Literal(_) => return None,
                Segment::Token(name) => tokens.push((name.clone(), decode(value))),
            }
            consumed_len += value.len() + sep;
            rest = after;
        }

        if exhaustive && !rest.is_empty() {
            return None;
        }

        let mut binding = parent.clone();
        let consumed = &parent.remaining[..consumed_len];
        binding.consumed.push_str(consumed);
        binding.remaining = rest.to_string();
        binding.tokens.extend(tokens);
        Some(binding)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn decode(segment: &str) -> String {
    percent_encoding::percent_decode_str(segment)
        .decode_utf8_lossy()
        .into_owned()
}
