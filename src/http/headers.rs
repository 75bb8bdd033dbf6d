//! Header map carried by [`RequestInfo`](super::RequestInfo) and [`Response`](super::Response).

/// Header entries in arrival order. Lookups ignore ASCII case and return the
/// first entry with a matching name.
///
/// # Examples
///
/// ```
/// use icehawk::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("Host", "shop.example");
/// headers.insert("host", "ignored.example");
///
/// assert_eq!(headers.get("HOST"), Some("shop.example"));
/// assert_eq!(headers.get("accept"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends an entry; an earlier entry with the same name still wins on lookup.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find_map(|(entry, value)| entry.eq_ignore_ascii_case(name).then_some(value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
