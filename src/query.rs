//! Query string decoding.
use std::collections::HashMap;

/// Decoded query parameters. A key given without `=` is present but has
/// no value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(HashMap<String, Option<String>>);

impl QueryParams {
    pub fn new() -> Self {
        Self(HashMap::new())
    }
    /// Value of `name`, if the key is present and has a value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_deref())
    }
    /// Whether the key appeared at all, with or without a value.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn insert(&mut self, name: &str, value: Option<&str>) {
        self.0
            .insert(name.to_string(), value.map(|v| v.to_string()));
    }
}

/// Decode a query fragment (the part after `?`, without the `?`).
///
/// No percent-decoding is done, repeated keys keep the last value and
/// malformed pairs never fail.
///
/// # Example
/// ```
/// use barehttp::query::parse_query;
///
/// let query = parse_query("search=ann&page");
/// assert_eq!(query.get("search"), Some("ann"));
/// assert!(query.contains("page"));
/// assert_eq!(query.get("page"), None);
/// ```
pub fn parse_query(query: &str) -> QueryParams {
    let mut params = QueryParams::new();
    if query.is_empty() {
        return params;
    }
    for pair in query.split('&') {
        let mut parts = pair.splitn(2, '=');
        let name = parts.next().unwrap_or("");
        params.insert(name, parts.next());
    }
    params
}
