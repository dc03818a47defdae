//! Method and path based request routing.
use log::{debug, trace};

use crate::handler::{Handler, Res};
use crate::query::parse_query;
use crate::request::{Method, Request};
use crate::response::Response;

pub use path::{RouteMatch, RoutePath};

pub mod path;

struct Route {
    method: Method,
    path: RoutePath,
    // Boxed because the routes hold heterogenous handler types.
    handler: Box<dyn Handler>,
}

/// Router is a Handler which dispatches requests to other Handlers based
/// on the request method and path.
///
/// Routes are tried in registration order and the first one whose method
/// and path both match wins. When nothing matches the response is a 404
/// with an empty body.
///
/// # Usage - route patterns
/// * `/users`: matches exactly /users, with or without a query string
/// * `/users/:id`: matches /users/42, adds id="42" to `request.params`
///
/// # Example
/// ```
/// use barehttp::prelude::*;
/// use barehttp::router::Router;
///
/// fn get_user(req: Request, res: Response) -> Res {
///     let id = req.params.get("id").cloned().unwrap_or_default();
///     Ok(res.with_payload(id.into_bytes()))
/// }
///
/// let router = Router::new().get("/users/:id", get_user);
///
/// let mut request = Request::default();
/// request.url = "/users/42".to_string();
/// let response = router.handle(request, Response::new(200)).unwrap();
/// # assert_eq!(response.payload, Some(b"42".to_vec()));
///
/// let mut request = Request::default();
/// request.method = Method::DELETE;
/// request.url = "/users/42".to_string();
/// let response = router.handle(request, Response::new(200)).unwrap_err();
/// # assert_eq!(response.status_code, 404);
/// ```
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: vec![] }
    }
    pub fn route<H>(mut self, method: Method, path: &str, handler: H) -> Self
    where
        H: 'static + Handler,
    {
        self.routes.push(Route {
            method,
            path: RoutePath::compile(path),
            handler: Box::new(handler),
        });
        self
    }
    pub fn get<H: 'static + Handler>(self, path: &str, handler: H) -> Self {
        self.route(Method::GET, path, handler)
    }
    pub fn post<H: 'static + Handler>(self, path: &str, handler: H) -> Self {
        self.route(Method::POST, path, handler)
    }
    pub fn put<H: 'static + Handler>(self, path: &str, handler: H) -> Self {
        self.route(Method::PUT, path, handler)
    }
    pub fn delete<H: 'static + Handler>(self, path: &str, handler: H) -> Self {
        self.route(Method::DELETE, path, handler)
    }
    pub fn len(&self) -> usize {
        self.routes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for Router {
    fn handle(&self, mut request: Request, response: Response) -> Res {
        for route in &self.routes {
            if route.method != request.method {
                continue;
            }
            if let Some(m) = route.path.matches(&request.url) {
                debug!(
                    "{:?} {} matched route {}",
                    request.method,
                    request.url,
                    route.path.template()
                );
                trace!("PARAMS {:?} QUERY {:?}", &m.params, &m.query);
                request.params = m.params;
                request.query = parse_query(m.query.as_deref().unwrap_or(""));
                return route.handler.handle(request, response);
            }
        }
        debug!("no route for {:?} {}", request.method, request.url);
        Err(response.with_status_code(404).without_payload())
    }
}
