//! Base for all request handlers.
use crate::request::Request;
use crate::response::Response;

/// Either side is written back to the client; `Err` marks a failed request.
pub type Res = std::result::Result<Response, Response>;

/// A Handler implements an HTTP endpoint. It receives the parsed Request
/// and the Response prepared so far by the server (status 200 with any
/// headers set by earlier pipeline steps) and returns the Response to send.
pub trait Handler: Sync + Send {
    fn handle(&self, request: Request, response: Response) -> Res;
}

impl<F> Handler for F
where
    F: Fn(Request, Response) -> Res + Send + Sync,
{
    fn handle(&self, request: Request, response: Response) -> Res {
        (self)(request, response)
    }
}
