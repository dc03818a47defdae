//! The `users` resource.
//!
//! | Method | Path         | Success                     |
//! |--------|--------------|-----------------------------|
//! | GET    | `/users`     | 200, JSON array of users    |
//! | POST   | `/users`     | 201, empty body             |
//! | PUT    | `/users/:id` | 204, empty body             |
//! | DELETE | `/users/:id` | 204, empty body             |
//!
//! `GET /users?search=text` keeps users whose name or email contains
//! `text`, ignoring case. Updating or deleting an unknown id still answers
//! 204. A POST or PUT body that is not a JSON object is rejected with 400.
use std::sync::Arc;

use log::{debug, error, info};
use serde_json::Value;

use crate::handler::Res;
use crate::id::new_id;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::store::{Filter, Record, Store};

pub const TABLE: &str = "users";

const FIELDS: [&str; 2] = ["name", "email"];

/// `name` and `email` from a JSON object body. Absent fields are left out;
/// anything but an object yields None.
fn user_fields(body: &Value) -> Option<Record> {
    let body = body.as_object()?;
    let mut record = Record::new();
    for field in FIELDS.iter() {
        if let Some(value) = body.get(*field) {
            record.insert(field, value.clone());
        }
    }
    Some(record)
}

fn search_filter(request: &Request) -> Option<Filter> {
    let search = request.query.get("search").filter(|s| !s.is_empty())?;
    Some(
        FIELDS
            .iter()
            .map(|field| (field.to_string(), search.to_string()))
            .collect(),
    )
}

pub struct Users {
    store: Arc<Store>,
}

impl Users {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn list(&self, request: Request, response: Response) -> Res {
        let filter = search_filter(&request);
        let users = self.store.select(TABLE, filter.as_ref());
        match serde_json::to_vec(&users) {
            Ok(payload) => Ok(response.with_payload(payload)),
            Err(e) => {
                error!("failed to serialize users: {}", e);
                Err(response.with_status_code(500))
            }
        }
    }

    pub fn create(&self, request: Request, response: Response) -> Res {
        let mut user = match user_fields(&request.body) {
            Some(user) => user,
            None => return Err(response.with_status_code(400)),
        };
        let id = new_id();
        user.insert("id", id.clone());
        self.store.insert(TABLE, user);
        info!("created user {}", id);
        Ok(response.with_status_code(201))
    }

    pub fn update(&self, request: Request, response: Response) -> Res {
        let id = match request.params.get("id") {
            Some(id) => id,
            None => return Err(response.with_status_code(404)),
        };
        let fields = match user_fields(&request.body) {
            Some(fields) => fields,
            None => return Err(response.with_status_code(400)),
        };
        if self.store.update(TABLE, id, fields) {
            info!("updated user {}", id);
        } else {
            debug!("update of unknown user {} ignored", id);
        }
        Ok(response.with_status_code(204))
    }

    pub fn delete(&self, request: Request, response: Response) -> Res {
        let id = match request.params.get("id") {
            Some(id) => id,
            None => return Err(response.with_status_code(404)),
        };
        if self.store.delete(TABLE, id) {
            info!("deleted user {}", id);
        } else {
            debug!("delete of unknown user {} ignored", id);
        }
        Ok(response.with_status_code(204))
    }
}

/// Router serving the users resource from `store`.
pub fn routes(store: Arc<Store>) -> Router {
    let users = Arc::new(Users::new(store));
    let list = users.clone();
    let create = users.clone();
    let update = users.clone();
    let delete = users;
    Router::new()
        .get("/users", move |req: Request, res: Response| list.list(req, res))
        .post("/users", move |req: Request, res: Response| create.create(req, res))
        .put("/users/:id", move |req: Request, res: Response| update.update(req, res))
        .delete("/users/:id", move |req: Request, res: Response| {
            delete.delete(req, res)
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::handler::Handler;
    use crate::request::Method;
    use serde_json::json;

    fn setup() -> (tempfile::TempDir, Arc<Store>, Router) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path().join("db.json")).unwrap());
        let router = routes(store.clone());
        (dir, store, router)
    }

    fn call(router: &Router, method: Method, url: &str, body: Value) -> Res {
        let mut request = Request::default();
        request.method = method;
        request.url = url.to_string();
        request.body = body;
        router.handle(request, Response::new(200))
    }

    fn list(router: &Router, url: &str) -> Value {
        let response = call(router, Method::GET, url, Value::Null).unwrap();
        assert_eq!(response.status_code, 200);
        serde_json::from_slice(&response.payload.unwrap()).unwrap()
    }

    #[test]
    fn test_create_assigns_id() {
        let (_dir, store, router) = setup();
        let body = json!({"name": "Ann", "email": "ann@example.com", "id": "mine", "admin": true});
        let response = call(&router, Method::POST, "/users", body).unwrap();
        assert_eq!(response.status_code, 201);
        assert_eq!(response.payload, None);

        let users = store.select(TABLE, None);
        assert_eq!(users.len(), 1);
        let user = &users[0];
        assert_eq!(user.len(), 3);
        assert_eq!(user.get("name"), Some(&json!("Ann")));
        assert_eq!(user.get("email"), Some(&json!("ann@example.com")));
        assert_ne!(user.id(), Some("mine"));
        assert_eq!(user.id().map(str::len), Some(36));
    }

    #[test]
    fn test_create_omits_missing_fields() {
        let (_dir, store, router) = setup();
        call(&router, Method::POST, "/users", json!({"name": "Ann"})).unwrap();
        let user = &store.select(TABLE, None)[0];
        assert_eq!(user.get("email"), None);
        assert_eq!(user.len(), 2);
    }

    #[test]
    fn test_create_rejects_null_body() {
        let (_dir, store, router) = setup();
        let response = call(&router, Method::POST, "/users", Value::Null).unwrap_err();
        assert_eq!(response.status_code, 400);
        assert!(store.select(TABLE, None).is_empty());
    }

    #[test]
    fn test_list_and_search() {
        let (_dir, _store, router) = setup();
        assert_eq!(list(&router, "/users"), json!([]));
        call(&router, Method::POST, "/users", json!({"name": "Ann", "email": "ann@a.com"})).unwrap();
        call(&router, Method::POST, "/users", json!({"name": "Bob", "email": "bob@b.org"})).unwrap();

        assert_eq!(list(&router, "/users").as_array().unwrap().len(), 2);
        assert_eq!(list(&router, "/users?search=").as_array().unwrap().len(), 2);

        let found = list(&router, "/users?search=ANN");
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["name"], "Ann");

        let found = list(&router, "/users?search=b.org");
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["name"], "Bob");

        assert_eq!(list(&router, "/users?search=zed"), json!([]));
    }

    #[test]
    fn test_update_replaces_user() {
        let (_dir, store, router) = setup();
        call(&router, Method::POST, "/users", json!({"name": "Old", "email": "e"})).unwrap();
        let id = store.select(TABLE, None)[0].id().unwrap().to_string();

        let url = format!("/users/{}", id);
        let response = call(&router, Method::PUT, &url, json!({"name": "A"})).unwrap();
        assert_eq!(response.status_code, 204);
        assert_eq!(
            store.select(TABLE, None),
            vec![Record::new().with("id", id.as_str()).with("name", "A")]
        );
    }

    #[test]
    fn test_update_unknown_user() {
        let (_dir, store, router) = setup();
        let response = call(&router, Method::PUT, "/users/nobody", json!({"name": "A"})).unwrap();
        assert_eq!(response.status_code, 204);
        assert!(store.select(TABLE, None).is_empty());

        let response = call(&router, Method::PUT, "/users/nobody", json!("A")).unwrap_err();
        assert_eq!(response.status_code, 400);
    }

    #[test]
    fn test_delete_user() {
        let (_dir, store, router) = setup();
        call(&router, Method::POST, "/users", json!({"name": "Ann"})).unwrap();
        let id = store.select(TABLE, None)[0].id().unwrap().to_string();

        let url = format!("/users/{}", id);
        let response = call(&router, Method::DELETE, &url, Value::Null).unwrap();
        assert_eq!(response.status_code, 204);
        assert!(store.select(TABLE, None).is_empty());

        let response = call(&router, Method::DELETE, &url, Value::Null).unwrap();
        assert_eq!(response.status_code, 204);
    }

    #[test]
    fn test_unmatched_routes() {
        let (_dir, _store, router) = setup();
        for (method, url) in &[
            (Method::GET, "/users/1"),
            (Method::POST, "/users/1"),
            (Method::PUT, "/users"),
            (Method::DELETE, "/users"),
            (Method::PATCH, "/users/1"),
            (Method::GET, "/"),
        ] {
            let response = call(&router, *method, url, Value::Null).unwrap_err();
            assert_eq!(response.status_code, 404);
            assert_eq!(response.payload, None);
        }
    }
}
