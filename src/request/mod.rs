//! HTTP request and parser.
use std::collections::HashMap;

use serde_json::Value;

use crate::query::QueryParams;

pub use header::*;

pub mod header;
pub mod parser;

/// An HTTP Request, as seen by handlers.
///
/// `body` holds the decoded JSON payload, or `Value::Null` when the payload
/// was absent or not valid JSON. `params` and `query` are filled in by the
/// router once a route matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: HashMap<Header, String>,
    pub content_length: usize,
    pub body: Value,
    pub params: HashMap<String, String>,
    pub query: QueryParams,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: Method::GET,
            url: "/".to_string(),
            headers: vec![(Header::new("Host"), "localhost".to_string())]
                .into_iter()
                .collect(),
            content_length: 0,
            body: Value::Null,
            params: HashMap::new(),
            query: QueryParams::new(),
        }
    }
}

impl Request {
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(Header::new(name), value.to_string());
        self
    }
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&Header::new(name)).map(|v| &v[..])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    GET,
    HEAD,
    POST,
    PUT,
    PATCH,
    DELETE,
    CONNECT,
    OPTIONS,
    TRACE,
}
