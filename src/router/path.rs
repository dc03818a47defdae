//! Route path templates.
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Exact(String),
    Param(String),
}

impl Segment {
    fn from_str(s: &str) -> Self {
        match s.strip_prefix(':') {
            Some(name) if !name.is_empty() => Self::Param(name.to_string()),
            _ => Self::Exact(s.to_string()),
        }
    }
}

/// Result of a successful match: named segment values and the query
/// fragment that followed the path, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub params: HashMap<String, String>,
    pub query: Option<String>,
}

/// A compiled path template such as `/users/:id`.
///
/// Each `:name` segment matches exactly one non-empty path segment. Any
/// `?query` suffix on the matched URL is split off and returned as is.
///
/// # Example
/// ```
/// use barehttp::router::RoutePath;
///
/// let path = RoutePath::compile("/users/:id");
/// let m = path.matches("/users/42?search=x").unwrap();
/// assert_eq!(m.params.get("id").map(String::as_str), Some("42"));
/// assert_eq!(m.query.as_deref(), Some("search=x"));
/// assert!(path.matches("/users").is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    template: String,
    segments: Vec<Segment>,
}

impl RoutePath {
    pub fn compile(template: &str) -> Self {
        Self {
            template: template.to_string(),
            segments: template.split('/').map(Segment::from_str).collect(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Names of the parameter segments, in template order.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some(&name[..]),
                Segment::Exact(_) => None,
            })
            .collect()
    }

    pub fn is_match(&self, url: &str) -> bool {
        self.matches(url).is_some()
    }

    /// Match a request URL (path plus optional `?query`).
    pub fn matches(&self, url: &str) -> Option<RouteMatch> {
        let (path, query) = match url.find('?') {
            Some(i) => (&url[..i], Some(url[i + 1..].to_string())),
            None => (url, None),
        };
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = HashMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Exact(s) if s == part => (),
                Segment::Exact(_) => return None,
                Segment::Param(_) if part.is_empty() => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(RouteMatch { params, query })
    }
}
