//! A small HTTP/1.x server put together by hand: no framework, just a
//! request parser, a router and a JSON file store.
//! * Multi-threaded [TCP server](crate::server::tcp::TcpServer)
//! * Incremental [request body](crate::request::parser::Body) reading,
//!   with `Content-Length` or chunked framing
//! * [JSON bodies](crate::json::read_json) with [`serde_json`](serde_json)
//! * Method and path based [request routing](crate::router::Router) with
//!   `:name` parameters and [query strings](crate::query::parse_query)
//! * A table-oriented [record store](crate::store::Store) mirrored to a
//!   JSON file on every write
//! * A [users resource](crate::users) built from all of the above
//!
//! # Example
//! ```
//! use std::sync::Arc;
//!
//! use barehttp::io::ReadWriteAdapter;
//! use barehttp::prelude::*;
//! use barehttp::server::StreamServer;
//! use barehttp::users;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = Arc::new(Store::open(dir.path().join("db.json")).unwrap());
//!
//! let request = b"POST /users HTTP/1.1\r\n\
//!                 Content-Length: 40\r\n\
//!                 \r\n\
//!                 {\"name\":\"Ann\",\"email\":\"ann@example.com\"}";
//! let mut write_buf = vec![];
//! let stream = ReadWriteAdapter::new(&request[..], &mut write_buf);
//! let mut server = StreamServer::new(stream, users::routes(store.clone()));
//! server.serve_one().unwrap();
//!
//! assert!(write_buf.starts_with(b"HTTP/1.1 201 Created\r\n"));
//! assert_eq!(store.select("users", None).len(), 1);
//! ```
pub mod handler;
pub mod id;
pub mod io;
pub mod json;
pub mod prelude;
pub mod query;
pub mod request;
pub mod response;
pub mod router;
pub mod runner;
pub mod server;
pub mod store;
pub mod users;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
