pub use crate::handler::{Handler, Res};
pub use crate::request::{Header, Method, Request};
pub use crate::response::Response;
pub use crate::router::Router;
pub use crate::server::Server;
pub use crate::store::{Filter, Record, Store};
