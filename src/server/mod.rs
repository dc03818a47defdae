//! HTTP Server components.
//!
//! Every connection carries one exchange: the request head is parsed, the
//! body is read to the end and decoded as JSON, the handler runs, and the
//! response is written before the connection is closed.
use std::fmt;
use std::io;
use std::io::prelude::*;

use log::{debug, error, trace};

use crate::handler::Handler;
use crate::json::read_json;
use crate::request::parser::{RequestParser, RequestParserError};
use crate::request::Request;
use crate::response::Response;
use crate::VERSION;

pub mod stream;
pub mod tcp;

pub use stream::StreamServer;
pub use tcp::TcpServer;

#[derive(Debug)]
pub struct ServerError {
    message: String,
}

impl ServerError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "server error: {}", &self.message)
    }
}

impl std::error::Error for ServerError {}

impl From<io::Error> for ServerError {
    fn from(err: io::Error) -> Self {
        ServerError::new(&format!("IOError({})", err))
    }
}

pub trait Server {
    /// Serve one request, must be implemented.
    fn serve_one(&mut self) -> Result<(), ServerError>;
    /// Serve requests forever (default implementation).
    fn serve_forever(&mut self) {
        loop {
            match self.serve_one() {
                Ok(()) => (),
                Err(e) => error!("{}", e),
            }
        }
    }
}

/// What happened during one exchange, for the access log.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub method: String,
    pub url: String,
    pub content_length: usize,
    pub variant: &'static str,
    pub status_code: u16,
    pub status: String,
    pub response_length: usize,
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} bytes) -> {} {} {} ({} bytes)",
            self.method,
            self.url,
            self.content_length,
            self.variant,
            self.status_code,
            &self.status,
            self.response_length,
        )
    }
}

/// Parse the request head, then read and decode the whole body.
fn read_request<R: Read>(stream: R, response: &mut Response) -> Result<Request, RequestParserError> {
    let mut parser = RequestParser::new(stream);
    let mut request = parser.parse()?;
    debug!("parsed {:?} {}, reading body", request.method, request.url);
    let body = parser.body()?;
    read_json(body, &mut request, response)?;
    Ok(request)
}

/// Serve a single exchange over `stream`.
pub(crate) fn exchange<S, H>(stream: &mut S, handler: &H, server: &str) -> Result<Exchange, ServerError>
where
    S: Read + Write,
    H: Handler + ?Sized,
{
    let mut response = Response::new(200);
    let (method, url, content_length, result) = match read_request(&mut *stream, &mut response) {
        Ok(request) => {
            trace!("REQUEST {:?}", &request);
            let method = format!("{:?}", request.method);
            let url = request.url.clone();
            let content_length = request.content_length;
            debug!("running request handler");
            (method, url, content_length, handler.handle(request, response))
        }
        Err(e) => {
            error!("{}", e);
            let response = response.with_status_code(400).without_payload();
            ("<none>".to_string(), "<none>".to_string(), 0, Err(response))
        }
    };
    let (variant, response) = match result {
        Ok(response) => ("Ok", response),
        Err(response) => ("Err", response),
    };
    let response = response
        .with_header("Server", &format!("{}/{}", server, VERSION))
        .with_header("Connection", "close");
    trace!("RESPONSE {:?}", &response);
    let summary = Exchange {
        method,
        url,
        content_length,
        variant,
        status_code: response.status_code,
        status: response.status.clone(),
        response_length: response.content_length(),
    };
    debug!("writing response");
    stream.write_all(&response.into_bytes())?;
    stream.flush()?;
    Ok(summary)
}
