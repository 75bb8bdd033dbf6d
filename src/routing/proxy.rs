//! Applies the first matching [`RouteRedirect`] before routing.

use super::RouteRedirect;
use crate::request::RequestEnvelope;

/// Ordered list of redirects; at most one fires per request.
///
/// # Examples
///
/// ```
/// use icehawk::http::Method;
/// use icehawk::request::RequestEnvelope;
/// use icehawk::routing::{RequestProxy, RouteRedirect};
///
/// let proxy = RequestProxy::new()
///     .with_redirect(RouteRedirect::from_strings("^/old$", "/new", "GET").unwrap());
///
/// let request = proxy.proxy_request(RequestEnvelope::new(Method::Get, "/old"));
/// assert_eq!(request.uri(), "/new");
///
/// let untouched = proxy.proxy_request(RequestEnvelope::new(Method::Get, "/other"));
/// assert_eq!(untouched.uri(), "/other");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestProxy {
    redirects: Vec<RouteRedirect>,
}

impl RequestProxy {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_redirect(mut self, redirect: RouteRedirect) -> Self {
        self.add_redirect(redirect);
        self
    }

    pub fn add_redirect(&mut self, redirect: RouteRedirect) {
        self.redirects.push(redirect);
    }

    pub fn redirects(&self) -> &[RouteRedirect] {
        &self.redirects
    }

    pub fn len(&self) -> usize {
        self.redirects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.redirects.is_empty()
    }

    /// Returns the envelope produced by the first matching redirect, or `request`
    /// unchanged when none matches. Later redirects are not evaluated once one matched.
    pub fn proxy_request(&self, request: RequestEnvelope) -> RequestEnvelope {
        self.redirects
            .iter()
            .find_map(|redirect| redirect.redirect(&request))
            .unwrap_or(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, Parameters};

    const STORE_STOCKS: &str = r"^/companies/(?<companyId>\d*)/stores/(?<storeId>\d*)/stocks$";
    const STORES_REVERSED: &str = r"^/companies/stores/(?<storeId>\d*)/(?<companyId>\d*)/stocks$";

    fn redirect(pattern: &str, target: &str, method: &str) -> RouteRedirect {
        RouteRedirect::from_strings(pattern, target, method).unwrap()
    }

    #[test]
    fn first_matching_redirect_applies() {
        let proxy = RequestProxy::new()
            .with_redirect(redirect("^/companies/stocks$", "/stocks/company", "PUT"))
            .with_redirect(redirect(STORE_STOCKS, "/stocks/store/:storeId", "GET"))
            .with_redirect(redirect(STORES_REVERSED, "/stocks/company/:companyId", "PUT"));

        let request = RequestEnvelope::new(Method::Post, "/companies/1/stores/2/stocks")
            .with_body([("stock", "3")].into_iter().collect());
        let out = proxy.proxy_request(request);

        assert_eq!(out.uri(), "/stocks/store/2");
        assert_eq!(out.method(), Method::Get);
        assert_eq!(out.query_string(), "companyId=1&storeId=2");
        assert_eq!(out.body().get("stock"), Some("3"));
    }

    #[test]
    fn head_request_keeps_existing_query() {
        let proxy = RequestProxy::new()
            .with_redirect(redirect("^/companies/stocks$", "/stocks/company", "HEAD"))
            .with_redirect(redirect(STORE_STOCKS, "/stocks/store/:storeId", "GET"));

        let request = RequestEnvelope::new(Method::Head, "/companies/1/stores/2/stocks")
            .with_query(Parameters::parse_query("stock=1"));
        let out = proxy.proxy_request(request);

        assert_eq!(out.query_string(), "stock=1&companyId=1&storeId=2");
    }

    #[test]
    fn write_redirect_fills_body() {
        let proxy = RequestProxy::new()
            .with_redirect(redirect("^/companies/stocks$", "/stocks/company", "DELETE"))
            .with_redirect(redirect(
                STORE_STOCKS,
                "/company/:companyId/stocks/store/:storeId",
                "PUT",
            ))
            .with_redirect(redirect(STORES_REVERSED, "/stocks/company/:companyId", "POST"));

        let out = proxy.proxy_request(RequestEnvelope::new(Method::Post, "/companies/1/stores/2/stocks"));

        assert_eq!(out.uri(), "/company/1/stocks/store/2");
        assert_eq!(out.method(), Method::Put);
        assert_eq!(
            out.body(),
            &[("companyId", "1"), ("storeId", "2")].into_iter().collect::<Parameters>()
        );
    }

    #[test]
    fn only_one_redirect_fires() {
        // The second redirect would match the first one's output.
        let proxy = RequestProxy::new()
            .with_redirect(redirect("^/a$", "/b", "GET"))
            .with_redirect(redirect("^/b$", "/c", "GET"))
            .with_redirect(redirect("^/a$", "/d", "GET"));

        let out = proxy.proxy_request(RequestEnvelope::new(Method::Get, "/a"));
        assert_eq!(out.uri(), "/b");
    }

    #[test]
    fn no_match_returns_request_unchanged() {
        let proxy = RequestProxy::new().with_redirect(redirect("^/a$", "/b", "POST"));
        let request = RequestEnvelope::new(Method::Get, "/z")
            .with_query(Parameters::parse_query("x=1"));
        assert_eq!(proxy.proxy_request(request.clone()), request);
    }

    #[test]
    fn empty_proxy_is_pass_through() {
        let proxy = RequestProxy::new();
        assert!(proxy.is_empty());
        let request = RequestEnvelope::new(Method::Get, "/z");
        assert_eq!(proxy.proxy_request(request.clone()), request);
    }
}
