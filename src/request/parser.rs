use std::collections::HashMap;
use std::fmt;
use std::io::prelude::*;
use std::str::FromStr;
use std::str::Utf8Error;

use serde_json::Value;

use crate::query::QueryParams;
use crate::request::{Header, Method, Request};

impl FromStr for Method {
    type Err = RequestParserError;
    fn from_str(s: &str) -> Result<Method> {
        match s {
            "GET" => Ok(Method::GET),
            "HEAD" => Ok(Method::HEAD),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "PATCH" => Ok(Method::PATCH),
            "DELETE" => Ok(Method::DELETE),
            "CONNECT" => Ok(Method::CONNECT),
            "OPTIONS" => Ok(Method::OPTIONS),
            "TRACE" => Ok(Method::TRACE),
            _ => Err(RequestParserError::new(0, "invalid HTTP method")),
        }
    }
}

const REQUEST_PARSER_BUFFER_SIZE: usize = 1024;
const BODY_CHUNK_SIZE: usize = 1024;

/// How the request body is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Framing {
    Length(usize),
    Chunked,
}

impl Framing {
    fn of(headers: &HashMap<Header, String>) -> std::result::Result<Self, &'static str> {
        if let Some(te) = headers.get(&Header::new("transfer-encoding")) {
            if te
                .split(',')
                .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
            {
                return Ok(Self::Chunked);
            }
        }
        match headers.get(&Header::new("content-length")) {
            Some(cl) => match str::parse::<usize>(cl.trim()) {
                Ok(cl) => Ok(Self::Length(cl)),
                Err(_) => Err("invalid content-length"),
            },
            None => Ok(Self::Length(0)),
        }
    }
}

/// A small HTTP/1.x request parser.
///
/// [`parse`](RequestParser::parse) reads the request line and headers;
/// the body is then pulled incrementally through
/// [`body`](RequestParser::body).
pub struct RequestParser<T: Read> {
    buffer: [u8; REQUEST_PARSER_BUFFER_SIZE],
    buffer_position: usize,
    buffer_read_size: usize,
    peek: Option<u8>,
    stream_position: usize,
    eof: bool,
    framing: Option<Framing>,
    stream: T,
}

const WHITESPACE: [u8; 2] = *b" \t";

fn one_of(chars: &'static [u8]) -> impl Fn(u8) -> bool {
    move |c: u8| chars.contains(&c)
}

fn whitespace() -> impl Fn(u8) -> bool {
    one_of(&WHITESPACE[..])
}

fn in_range(min: u8, max: u8) -> impl Fn(u8) -> bool {
    move |c: u8| c >= min && c <= max
}

impl<R: Read> RequestParser<R> {
    pub fn new(stream: R) -> Self {
        Self {
            peek: None,
            buffer: [0; REQUEST_PARSER_BUFFER_SIZE],
            stream,
            buffer_position: 0,
            buffer_read_size: 0,
            stream_position: 0,
            eof: false,
            framing: None,
        }
    }
    fn error(&self, reason: &str) -> RequestParserError {
        RequestParserError::new(self.stream_position, reason)
    }
    /// Read next chunk from the input stream.
    fn read(&mut self) -> Result<()> {
        self.buffer_read_size = self.stream.read(&mut self.buffer)?;
        self.buffer_position = 0;
        Ok(())
    }
    /// Get next byte from the stream and advance peek. Calls `read` as
    /// needed when end of buffer is reached. Caller is responsible
    /// for setting `eof` to true before calling `next` if the end of stream
    /// is expected, otherwise it will hang on `read`.
    fn next(&mut self) -> Result<Option<u8>> {
        let curr = self.peek;
        if self.eof {
            self.peek = None;
            return Ok(curr);
        }
        if self.buffer_position == self.buffer_read_size {
            self.read()?;
        }
        if self.buffer_position == self.buffer_read_size {
            self.peek = None;
        } else {
            self.peek = Some(self.buffer[self.buffer_position]);
            self.buffer_position += 1;
            self.stream_position += 1;
        }
        Ok(curr)
    }
    fn expect(&mut self, b: u8) -> Result<()> {
        let next = self.next()?;
        if next == Some(b) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", b as char)))
        }
    }
    fn expects(&mut self, bs: &[u8]) -> Result<()> {
        for b in bs {
            self.expect(*b)?;
        }
        Ok(())
    }
    fn one<F>(&mut self, predicate: &F) -> Result<Vec<u8>>
    where
        F: Fn(u8) -> bool,
    {
        match self.peek {
            Some(peek) if predicate(peek) => {
                self.next()?;
                Ok(vec![peek])
            }
            _ => Err(self.error("unexpected character")),
        }
    }
    fn star<F>(&mut self, predicate: &F) -> Result<Vec<u8>>
    where
        F: Fn(u8) -> bool,
    {
        let mut out = vec![];
        while let Some(peek) = self.peek {
            if !predicate(peek) {
                break;
            }
            self.next()?;
            out.push(peek);
        }
        Ok(out)
    }
    fn plus<F>(&mut self, predicate: &F) -> Result<Vec<u8>>
    where
        F: Fn(u8) -> bool,
    {
        let mut out = self.one(predicate)?;
        out.append(&mut self.star(predicate)?);
        Ok(out)
    }
    fn crlf(&mut self) -> Result<()> {
        self.expects(b"\r\n")
    }
    fn until(&mut self, b: u8) -> Result<Vec<u8>> {
        let mut word: Vec<u8> = vec![];
        while self.peek != Some(b) {
            word.push(
                self.next()?
                    .ok_or_else(|| self.error("unexpected end of input"))?,
            )
        }
        Ok(word)
    }
    fn method(&mut self) -> Result<Method> {
        let method = self.plus(&in_range(b'A', b'Z'))?;
        let method = std::str::from_utf8(&method)?;
        Ok(Method::from_str(method)?)
    }
    /// Origin-form request target: path plus optional query, kept verbatim.
    fn target(&mut self) -> Result<String> {
        if self.peek != Some(b'/') {
            return Err(self.error("expected path starting with /"));
        }
        let target = self.plus(&in_range(b'!', b'~'))?;
        Ok(std::str::from_utf8(&target)?.to_string())
    }
    fn header(&mut self) -> Result<(Header, String)> {
        let header = self.until(b':')?;
        self.expect(b':')?;
        self.star(&whitespace())?;
        let value = self.until(b'\r')?;
        self.crlf()?;
        Ok((
            Header::new(std::str::from_utf8(&header)?.trim()),
            std::str::from_utf8(&value)?.trim_end().to_string(),
        ))
    }
    fn headers(&mut self) -> Result<Vec<(Header, String)>> {
        let mut headers = vec![];
        while self.peek != Some(b'\r') {
            headers.push(self.header()?);
        }
        Ok(headers)
    }
    /// Parse the request line and headers of the next request in the
    /// stream. The returned request has a null body; read the payload
    /// with [`body`](RequestParser::body).
    pub fn parse(&mut self) -> Result<Request> {
        self.next()?;
        let method = self.method()?;
        self.plus(&whitespace())?;
        let url = self.target()?;
        self.plus(&whitespace())?;
        self.expects(b"HTTP/1.")?;
        self.one(&one_of(&b"01"[..]))?;
        self.crlf()?;
        let headers: HashMap<Header, String> = self.headers()?.into_iter().collect();
        let framing = Framing::of(&headers).map_err(|reason| self.error(reason))?;
        self.framing = Some(framing);
        Ok(Request {
            method,
            url,
            headers,
            content_length: 0,
            body: Value::Null,
            params: HashMap::new(),
            query: QueryParams::new(),
        })
    }
    /// Iterate over the body of the request whose head was just parsed.
    pub fn body(&mut self) -> Result<Body<'_, R>> {
        let framing = self
            .framing
            .take()
            .ok_or_else(|| self.error("request head not parsed"))?;
        Ok(Body {
            parser: self,
            framing,
            remaining: 0,
            state: BodyState::Start,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BodyState {
    Start,
    Reading,
    Done,
}

/// The payload of one request, yielded chunk by chunk as it arrives.
///
/// `Content-Length` bodies come in pieces of at most 1 KiB, chunked bodies
/// one item per transfer chunk. The iterator ends after the last byte of
/// the body; framing errors are yielded once and end the iteration.
pub struct Body<'a, R: Read> {
    parser: &'a mut RequestParser<R>,
    framing: Framing,
    remaining: usize,
    state: BodyState,
}

impl<'a, R: Read> Body<'a, R> {
    fn start(&mut self) -> Result<Option<Vec<u8>>> {
        match self.framing {
            Framing::Length(0) => {
                self.parser.expect(b'\r')?;
                self.parser.eof = true;
                self.parser.expect(b'\n')?;
                Ok(None)
            }
            Framing::Length(n) => {
                self.parser.crlf()?;
                self.remaining = n;
                self.fixed()
            }
            Framing::Chunked => {
                self.parser.crlf()?;
                self.chunk()
            }
        }
    }
    fn fixed(&mut self) -> Result<Option<Vec<u8>>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let n = self.remaining.min(BODY_CHUNK_SIZE);
        let mut buf = Vec::with_capacity(n);
        for i in 0..n {
            if i == self.remaining - 1 {
                self.parser.eof = true;
            }
            match self.parser.next()? {
                Some(b) => buf.push(b),
                None => {
                    return Err(self
                        .parser
                        .error(&format!("expected {} more bytes", self.remaining - i)))
                }
            }
        }
        self.remaining -= n;
        Ok(Some(buf))
    }
    fn chunk_size(&mut self) -> Result<usize> {
        let line = self.parser.until(b'\r')?;
        let line = std::str::from_utf8(&line)?;
        let size = line.split(';').next().unwrap_or("").trim();
        usize::from_str_radix(size, 16).map_err(|_| self.parser.error("invalid chunk size"))
    }
    fn chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let size = self.chunk_size()?;
        self.parser.crlf()?;
        if size == 0 {
            // Trailer fields are read and dropped.
            while self.parser.peek != Some(b'\r') {
                self.parser.until(b'\r')?;
                self.parser.crlf()?;
            }
            self.parser.expect(b'\r')?;
            self.parser.eof = true;
            self.parser.expect(b'\n')?;
            return Ok(None);
        }
        let mut buf = Vec::with_capacity(size);
        for i in 0..size {
            match self.parser.next()? {
                Some(b) => buf.push(b),
                None => {
                    return Err(self
                        .parser
                        .error(&format!("expected {} more bytes", size - i)))
                }
            }
        }
        self.parser.crlf()?;
        Ok(Some(buf))
    }
}

impl<'a, R: Read> Iterator for Body<'a, R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match (self.state, self.framing) {
            (BodyState::Done, _) => return None,
            (BodyState::Start, _) => self.start(),
            (BodyState::Reading, Framing::Length(_)) => self.fixed(),
            (BodyState::Reading, Framing::Chunked) => self.chunk(),
        };
        match result {
            Ok(Some(chunk)) => {
                self.state = BodyState::Reading;
                Some(Ok(chunk))
            }
            Ok(None) => {
                self.state = BodyState::Done;
                None
            }
            Err(e) => {
                self.state = BodyState::Done;
                Some(Err(e))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestParserError {
    position: usize,
    reason: String,
}

impl RequestParserError {
    pub fn new(position: usize, reason: &str) -> Self {
        Self {
            position,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for RequestParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Error parsing request at position {}: {}",
            self.position, self.reason
        )
    }
}

impl std::error::Error for RequestParserError {}

impl From<std::io::Error> for RequestParserError {
    fn from(err: std::io::Error) -> Self {
        RequestParserError::new(0, &err.to_string())
    }
}

impl From<Utf8Error> for RequestParserError {
    fn from(err: Utf8Error) -> Self {
        RequestParserError::new(0, &err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RequestParserError>;
