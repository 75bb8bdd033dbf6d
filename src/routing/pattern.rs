//! Regular-expression URI patterns with named captures.

use std::borrow::Cow;

use regex::Regex;

use super::RoutingError;
use crate::http::Parameters;

/// Outcome of testing a [`UriPattern`] against a subject.
///
/// `exact` implies `matched`, and `parameters` is empty whenever `matched` is false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    matched: bool,
    exact: bool,
    parameters: Parameters,
}

impl MatchResult {
    /// A negative result.
    pub fn no_match() -> Self {
        Self::default()
    }

    pub fn matched(&self) -> bool {
        self.matched
    }

    /// `true` when the match region spans the whole subject.
    pub fn exact(&self) -> bool {
        self.exact
    }

    /// Named captures in declaration order.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn into_parameters(self) -> Parameters {
        self.parameters
    }
}

/// A compiled URI pattern.
///
/// Patterns are compiled once, when routes are configured; an invalid expression
/// is reported then and never while matching. Only named groups (`(?<name>…)` or
/// `(?P<name>…)`) feed [`MatchResult::parameters`]; positional groups are ignored.
///
/// # Examples
///
/// ```
/// use icehawk::routing::UriPattern;
///
/// let pattern = UriPattern::new(r"^/unit/(?<testKey>.*)$").unwrap();
/// let result = pattern.match_uri("/unit/test");
///
/// assert!(result.matched());
/// assert!(result.exact());
/// assert_eq!(result.parameters().get("testKey"), Some("test"));
/// ```
#[derive(Debug, Clone)]
pub struct UriPattern {
    regex: Regex,
}

impl UriPattern {
    /// Compiles `pattern` as given; it matches anywhere unless it anchors itself.
    pub fn new(pattern: &str) -> Result<Self, RoutingError> {
        let regex = Regex::new(pattern).map_err(|source| RoutingError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Self { regex })
    }

    /// Compiles `pattern` wrapped in `^(?:…)$`, so every match is exact.
    pub fn anchored(pattern: &str) -> Result<Self, RoutingError> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            RoutingError::InvalidPattern {
                pattern: pattern.to_owned(),
                source,
            }
        })?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// `true` when the pattern declares at least one named group.
    pub fn has_named_groups(&self) -> bool {
        self.capture_names().next().is_some()
    }

    /// Names of the named groups, in declaration order.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.regex.capture_names().flatten()
    }

    pub fn match_uri(&self, subject: &str) -> MatchResult {
        let Some(captures) = self.regex.captures(subject) else {
            return MatchResult::no_match();
        };

        // Group 0 always participates in a successful match.
        let exact = captures
            .get(0)
            .is_some_and(|whole| whole.start() == 0 && whole.end() == subject.len());

        let parameters = self
            .capture_names()
            .filter_map(|name| captures.name(name).map(|m| (name, m.as_str())))
            .collect();

        MatchResult {
            matched: true,
            exact,
            parameters,
        }
    }

    /// Replaces the first match in `subject`, expanding `$name` / `$1` in `replacement`.
    pub fn replace<'s>(&self, subject: &'s str, replacement: &str) -> Cow<'s, str> {
        self.regex.replace(subject, replacement)
    }
}

impl PartialEq for UriPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for UriPattern {}
