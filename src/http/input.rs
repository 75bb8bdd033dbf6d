//! Opaque request input: query data, body data and uploaded files.
//!
//! The host reads these from wherever its transport keeps them and passes them in
//! explicitly; nothing in the pipeline reads ambient process state.

use std::path::PathBuf;

use smallvec::SmallVec;
use url::form_urlencoded;

use super::ProvidesRequestInfo;

/// Parameter entries stored inline before spilling to the heap.
/// A request rarely carries more than a handful of routing/query values.
const INLINE_PARAMS: usize = 8;

/// Ordered string mapping with unique keys.
///
/// Order is insertion order; re-inserting an existing key replaces its value in place.
/// The two merge operations differ only in who wins on a key collision:
///
/// - [`with_overrides`](Self::with_overrides): the incoming values win (route captures).
/// - [`with_defaults`](Self::with_defaults): the existing values win (redirect captures).
///
/// # Examples
///
/// ```
/// use icehawk::http::Parameters;
///
/// let query = Parameters::parse_query("stock=1&storeId=9");
/// let captured: Parameters = [("companyId", "1"), ("storeId", "2")].into_iter().collect();
///
/// assert_eq!(
///     query.with_defaults(&captured).to_query_string(),
///     "stock=1&storeId=9&companyId=1"
/// );
/// assert_eq!(
///     query.with_overrides(&captured).to_query_string(),
///     "stock=1&storeId=2&companyId=1"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` query. A leading `?` is ignored,
    /// `+` and percent escapes are decoded, and a repeated key keeps its last value.
    pub fn parse_query(query: &str) -> Self {
        form_urlencoded::parse(query.trim_start_matches('?').as_bytes()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Inserts or replaces `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of `self` with every entry of `incoming` applied on top.
    pub fn with_overrides(&self, incoming: &Parameters) -> Parameters {
        let mut merged = self.clone();
        for (key, value) in incoming.iter() {
            merged.insert(key, value);
        }
        merged
    }

    /// Copy of `self` with the keys of `incoming` it does not already carry.
    pub fn with_defaults(&self, incoming: &Parameters) -> Parameters {
        let mut merged = self.clone();
        for (key, value) in incoming.iter() {
            if !merged.contains_key(key) {
                merged.insert(key, value);
            }
        }
        merged
    }

    /// Renders the entries back into a form-encoded query string, in order.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// A file the transport already received and stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// File name as sent by the client.
    pub client_name: String,
    pub content_type: String,
    pub size: u64,
    /// Where the host stored the upload.
    pub path: PathBuf,
}

/// Uploaded files keyed by form field name, in upload order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedFiles {
    files: Vec<(String, UploadedFile)>,
}

impl UploadedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, file: UploadedFile) {
        self.files.push((field.into(), file));
    }

    /// First file uploaded under `field`.
    pub fn get(&self, field: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|(f, _)| f == field).map(|(_, file)| file)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UploadedFile)> {
        self.files.iter().map(|(f, file)| (f.as_str(), file))
    }
}

/// Everything the caller supplies besides method and URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInput {
    pub query: Parameters,
    pub body: Parameters,
    pub files: UploadedFiles,
}

impl RequestInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input whose query data is parsed from the provider's query string.
    pub fn from_request_info(info: &dyn ProvidesRequestInfo) -> Self {
        Self {
            query: info
                .query_string()
                .map(Parameters::parse_query)
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: Parameters) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Parameters) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_files(mut self, files: UploadedFiles) -> Self {
        self.files = files;
        self
    }
}
