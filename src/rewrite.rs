//! URI rewriting: the HTTP-level redirect check that runs before dispatch.

use tracing::debug;

use crate::http::{ProvidesRequestInfo, Redirect, RequestInfo, StatusCode};
use crate::routing::{RoutingError, UriPattern};

/// Decides where a request should live.
///
/// A returned [`Redirect`] whose URL equals the request URI means "handle it here".
pub trait RewritesUri: Send + Sync {
    fn rewrite(&self, request_info: &RequestInfo) -> Redirect;
}

/// One rewrite: requests whose URI matches `pattern` are sent to `replacement`.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: UriPattern,
    replacement: String,
    status: StatusCode,
}

impl RewriteRule {
    /// `replacement` may use `$1` or `$name` to refer to the pattern's groups.
    pub fn new(pattern: &str, replacement: impl Into<String>, status: StatusCode) -> Result<Self, RoutingError> {
        Ok(Self {
            pattern: UriPattern::new(pattern)?,
            replacement: replacement.into(),
            status,
        })
    }

    fn apply(&self, uri: &str) -> Option<Redirect> {
        if !self.pattern.match_uri(uri).matched() {
            return None;
        }
        let target = self.pattern.replace(uri, &self.replacement);
        Some(Redirect::new(target.into_owned(), self.status))
    }
}

/// Ordered rewrite rules; the first matching rule decides.
///
/// Without a matching rule the decision points at the request URI itself with
/// `301 Moved Permanently`, which never triggers a redirect.
///
/// # Examples
///
/// ```
/// use icehawk::http::{RequestInfo, StatusCode};
/// use icehawk::rewrite::{RewriteRule, RewritesUri, UriRewriter};
///
/// let rewriter = UriRewriter::new().with_rule(
///     RewriteRule::new(r"^/legacy/(?<page>\w+)$", "/pages/$page", StatusCode::MovedPermanently).unwrap(),
/// );
///
/// let redirect = rewriter.rewrite(&RequestInfo::new("GET", "/legacy/about"));
/// assert_eq!(redirect.url(), "/pages/about");
///
/// let stay = rewriter.rewrite(&RequestInfo::new("GET", "/pages/about"));
/// assert!(stay.url_equals("/pages/about"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct UriRewriter {
    rules: Vec<RewriteRule>,
}

impl UriRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rule(mut self, rule: RewriteRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RewritesUri for UriRewriter {
    fn rewrite(&self, request_info: &RequestInfo) -> Redirect {
        let uri = request_info.uri();

        match self.rules.iter().find_map(|rule| rule.apply(uri)) {
            Some(redirect) => {
                debug!(uri, target = redirect.url(), status = %redirect.status(), "uri rewritten");
                redirect
            }
            None => Redirect::new(uri, StatusCode::MovedPermanently),
        }
    }
}
