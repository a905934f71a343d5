//! Compiled path patterns.
//!
//! A pattern is a `/`-separated template with three segment kinds:
//!
//! - literals, matched exactly (`/users`),
//! - `:name` captures, matching exactly one path component (`/users/:id`),
//! - a trailing `*`, matching everything after — including nothing
//!   (`/api/*`).
//!
//! Patterns carry no precedence of their own. The router tries them in
//! registration order and the first structural match wins, so a pattern only
//! answers "does this path fit, and what did the captures see".
//!
//! Compilation happens once, at registration. Structural defects (empty
//! pattern, missing leading slash, empty capture name, a `*` anywhere but
//! last, duplicate capture names) surface here and never at request time.

use std::collections::HashMap;
use std::fmt;

// ── Compilation errors ────────────────────────────────────────────────────────

/// A structurally invalid path pattern.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PatternError {
    Empty,
    MissingLeadingSlash,
    EmptyParameter,
    WildcardNotLast,
    DuplicateParameter(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "pattern is empty"),
            Self::MissingLeadingSlash => write!(f, "pattern must start with `/`"),
            Self::EmptyParameter => write!(f, "`:` segment is missing a parameter name"),
            Self::WildcardNotLast => write!(f, "`*` is only allowed as the final segment"),
            Self::DuplicateParameter(name) => {
                write!(f, "parameter `:{name}` appears more than once")
            }
        }
    }
}

impl std::error::Error for PatternError {}

// ── Pattern ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A path pattern, compiled at registration time.
#[derive(Debug)]
pub(crate) struct Pattern {
    raw: String,
    segments: Vec<Segment>,
    wildcard: bool,
}

impl Pattern {
    pub(crate) fn parse(raw: &str) -> Result<Self, PatternError> {
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        let rest = raw.strip_prefix('/').ok_or(PatternError::MissingLeadingSlash)?;

        let mut segments = Vec::new();
        let mut wildcard = false;

        // `/` compiles to no segments at all and matches only the root path.
        if !rest.is_empty() {
            for piece in rest.split('/') {
                if wildcard {
                    return Err(PatternError::WildcardNotLast);
                }
                if piece == "*" {
                    wildcard = true;
                } else if let Some(name) = piece.strip_prefix(':') {
                    if name.is_empty() {
                        return Err(PatternError::EmptyParameter);
                    }
                    if segments.iter().any(|s| matches!(s, Segment::Param(n) if n == name)) {
                        return Err(PatternError::DuplicateParameter(name.to_owned()));
                    }
                    segments.push(Segment::Param(name.to_owned()));
                } else {
                    segments.push(Segment::Literal(piece.to_owned()));
                }
            }
        }

        Ok(Self { raw: raw.to_owned(), segments, wildcard })
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.raw
    }

    /// Matches `path` against the pattern. `Some` carries the captured
    /// parameters (possibly empty); `None` means no structural match. The
    /// query string must already be stripped by the caller.
    pub(crate) fn capture(&self, path: &str) -> Option<HashMap<String, String>> {
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = if rest.is_empty() { Vec::new() } else { rest.split('/').collect() };

        if self.wildcard {
            if parts.len() < self.segments.len() {
                return None;
            }
        } else if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), (*part).to_owned());
                }
            }
        }
        Some(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
        Pattern::parse(pattern).unwrap().capture(path)
    }

    #[test]
    fn literal_segments_match_exactly() {
        assert!(capture("/users", "/users").is_some());
        assert!(capture("/users", "/Users").is_none());
        assert!(capture("/users", "/users/42").is_none());
        assert!(capture("/", "/").is_some());
        assert!(capture("/", "/users").is_none());
    }

    #[test]
    fn params_capture_one_component_each() {
        let params = capture("/users/:id", "/users/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        // No trailing wildcard, so an extra component is no match.
        assert!(capture("/users/:id", "/users/42/edit").is_none());
        assert!(capture("/users/:id", "/users").is_none());
    }

    #[test]
    fn multiple_params_capture_independently() {
        let params = capture("/repos/:owner/:name", "/repos/alice/trellis").unwrap();
        assert_eq!(params.get("owner").map(String::as_str), Some("alice"));
        assert_eq!(params.get("name").map(String::as_str), Some("trellis"));
    }

    #[test]
    fn trailing_wildcard_matches_everything_after() {
        assert!(capture("/api/*", "/api/ping").is_some());
        assert!(capture("/api/*", "/api/v1/users/7").is_some());
        // Zero remaining components still match.
        assert!(capture("/api/*", "/api").is_some());
        assert!(capture("/api/*", "/apiping").is_none());
    }

    #[test]
    fn structural_defects_fail_compilation() {
        assert_eq!(Pattern::parse("").unwrap_err(), PatternError::Empty);
        assert_eq!(Pattern::parse("users").unwrap_err(), PatternError::MissingLeadingSlash);
        assert_eq!(Pattern::parse("/users/:").unwrap_err(), PatternError::EmptyParameter);
        assert_eq!(Pattern::parse("/*/users").unwrap_err(), PatternError::WildcardNotLast);
        assert_eq!(
            Pattern::parse("/pairs/:id/:id").unwrap_err(),
            PatternError::DuplicateParameter("id".to_owned())
        );
    }

    #[test]
    fn no_empty_string_placeholders_for_absent_params() {
        let params = capture("/users", "/users").unwrap();
        assert!(params.is_empty());
    }
}
