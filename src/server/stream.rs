//! Generic IO Stream HTTP server.
use std::io::prelude::*;

use log::info;

use crate::handler::Handler;
use crate::server::{exchange, Exchange, Server, ServerError};

/// Serve HTTP requests over a generic stream, one exchange per call to
/// `serve_one`.
///
/// # Example
/// ```
/// use barehttp::prelude::*;
/// use barehttp::io::ReadWriteAdapter;
/// use barehttp::server::StreamServer;
///
/// fn handle_hello(_req: Request, res: Response) -> Res {
///     Ok(res.with_payload(b"\"Hello!\"".to_vec()))
/// }
///
/// let read_buf = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let mut write_buf = vec![];
/// let stream = ReadWriteAdapter::new(&read_buf[..], &mut write_buf);
/// let mut server = StreamServer::new(stream, handle_hello);
/// server.serve_one().unwrap();
///
/// assert_eq!(
///     std::str::from_utf8(&write_buf[..]).unwrap(),
///     &format!(
///       "HTTP/1.1 200 OK\r\n\
///        Content-Type: application/json\r\n\
///        Server: barehttp::StreamServer/{}\r\n\
///        Connection: close\r\n\
///        Content-Length: 8\r\n\
///        \r\n\
///        \"Hello!\"", barehttp::VERSION
///     )
/// );
/// ```
pub struct StreamServer<H, S> {
    handler: H,
    stream: S,
    last: Option<Exchange>,
}

impl<H, S> StreamServer<H, S> {
    pub fn new(stream: S, handler: H) -> Self {
        Self {
            handler,
            stream,
            last: None,
        }
    }
    /// The most recently served exchange.
    pub fn last_exchange(&self) -> Option<&Exchange> {
        self.last.as_ref()
    }
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<H, S> Server for StreamServer<H, S>
where
    H: Handler,
    S: Read + Write,
{
    fn serve_one(&mut self) -> Result<(), ServerError> {
        let summary = exchange(&mut self.stream, &self.handler, "barehttp::StreamServer")?;
        info!("{}", summary);
        self.last = Some(summary);
        Ok(())
    }
}
