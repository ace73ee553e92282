//! URL-like resource patterns with named placeholders.
//!
//! `/api/invitations/:invitationId` has two literal segments and one
//! placeholder. A placeholder matches exactly one non-empty path segment.

use std::fmt;

use crate::error::{AclError, Result};

/// One segment of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches the identical segment.
    Literal(String),
    /// Matches any single segment.
    Param(String),
}

/// A compiled resource pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePattern {
    source: String,
    segments: Vec<Segment>,
}

impl ResourcePattern {
    /// Compile a pattern.
    ///
    /// Patterns must start with `/`. A single trailing `/` is ignored; any
    /// other empty segment, or a placeholder without a name, is rejected.
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| AclError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let body = pattern
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;
        let body = match body.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => body,
        };

        let mut segments = Vec::new();
        if !body.is_empty() {
            for raw in body.split('/') {
                if raw.is_empty() {
                    return Err(invalid("empty path segment"));
                }
                match raw.strip_prefix(':') {
                    Some("") => return Err(invalid("placeholder without a name")),
                    Some(name) => segments.push(Segment::Param(name.to_string())),
                    None => segments.push(Segment::Literal(raw.to_string())),
                }
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The compiled segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Test whether `path` matches this pattern segment by segment.
    ///
    /// Any query string is ignored. Relative paths never match.
    pub fn matches(&self, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or_default();
        let Some(body) = path.strip_prefix('/') else {
            return false;
        };
        let body = body.strip_suffix('/').unwrap_or(body);

        if body.is_empty() {
            return self.segments.is_empty();
        }

        let mut parts = body.split('/');
        for segment in &self.segments {
            let Some(part) = parts.next() else {
                return false;
            };
            let ok = match segment {
                Segment::Literal(literal) => literal == part,
                Segment::Param(_) => !part.is_empty(),
            };
            if !ok {
                return false;
            }
        }

        parts.next().is_none()
    }
}

impl fmt::Display for ResourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
