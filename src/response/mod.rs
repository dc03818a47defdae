//! HTTP response and status codes.
use std::collections::HashMap;

pub mod status;

/// An HTTP response.
///
/// # Example
/// ```
/// # use barehttp::response::Response;
///
/// let response = Response::new(200)
///     .with_header("Content-Type", "text/plain")
///     .with_payload(b"Hello!".to_vec());
///
/// # assert_eq!(response.content_length(), 6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status_code: u16,
    pub status: String,
    headers: Vec<(String, String)>,
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create a new Response. Status is automatically set to the default
    /// status for the given code (200 -> "OK", etc.)
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            status: status::default(status_code),
            headers: vec![],
            payload: None,
        }
    }
    pub fn headers(&self) -> HashMap<String, String> {
        self.headers.iter().cloned().collect()
    }
    /// Value of a header, matched without regard to case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(h, _)| h.eq_ignore_ascii_case(name))
            .map(|(_, v)| &v[..])
    }
    /// Change status code, and the status to its default text.
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self.status = status::default(status_code);
        self
    }
    /// Set a header, replacing any previous value under the same name.
    pub fn set_header(&mut self, header: &str, value: &str) {
        self.headers.retain(|(h, _)| !h.eq_ignore_ascii_case(header));
        self.headers.push((header.to_string(), value.to_string()));
    }
    pub fn with_header(mut self, header: &str, value: &str) -> Self {
        self.set_header(header, value);
        self
    }
    /// Sets response payload.
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }
    pub fn without_payload(mut self) -> Self {
        self.payload = None;
        self
    }
    /// Get content length.
    pub fn content_length(&self) -> usize {
        match &self.payload {
            Some(body) => body.len(),
            None => 0,
        }
    }
    /// Write HTTP response bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut bytes: Vec<u8> = vec![];

        let status_line = format!("HTTP/1.1 {} {}\r\n", self.status_code, self.status);
        bytes.extend(status_line.into_bytes());

        for (header, value) in &self.headers {
            let header_line = format!("{}: {}\r\n", header, value);
            bytes.extend(header_line.into_bytes());
        }
        // 1xx and 204 responses never carry a body.
        if self.status_code >= 200 && self.status_code != 204 {
            let content_length = format!("Content-Length: {}\r\n", self.content_length());
            bytes.extend(content_length.into_bytes());
        }

        bytes.extend(b"\r\n");
        if let Some(body) = &self.payload {
            bytes.extend(body);
        }
        bytes
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(200)
    }
}
