//! JSON request bodies.
use log::{debug, trace};
use serde_json::Value;

use crate::request::Request;
use crate::response::Response;

pub const APPLICATION_JSON: &str = "application/json";

/// Decode a complete payload. Anything that is not UTF-8 JSON, including
/// an empty payload, decodes to `Value::Null`.
pub fn decode(bytes: &[u8]) -> Value {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("request body is not UTF-8: {}", e);
            return Value::Null;
        }
    };
    match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            debug!("request body is not JSON: {}", e);
            Value::Null
        }
    }
}

/// Read a request body to the end and decode it as JSON into
/// `request.body`.
///
/// Every chunk is consumed before decoding starts. The response is marked
/// as JSON whatever the outcome. Only errors from the chunk source are
/// returned; a payload that fails to decode leaves `Value::Null`.
///
/// # Example
/// ```
/// use barehttp::json::read_json;
/// use barehttp::request::Request;
/// use barehttp::response::Response;
///
/// let chunks = vec![b"{\"name\":".to_vec(), b"\"Ann\"}".to_vec()];
/// let mut request = Request::default();
/// let mut response = Response::new(200);
/// read_json(chunks.into_iter().map(Ok::<_, ()>), &mut request, &mut response).unwrap();
///
/// assert_eq!(request.body["name"], "Ann");
/// assert_eq!(response.header("content-type"), Some("application/json"));
/// ```
pub fn read_json<I, E>(chunks: I, request: &mut Request, response: &mut Response) -> Result<(), E>
where
    I: IntoIterator<Item = Result<Vec<u8>, E>>,
{
    response.set_header("Content-Type", APPLICATION_JSON);
    let mut buffer = vec![];
    for chunk in chunks {
        buffer.extend(chunk?);
    }
    trace!("BODY {} bytes", buffer.len());
    request.content_length = buffer.len();
    request.body = decode(&buffer);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn read(chunks: &[&[u8]]) -> (Request, Response) {
        let mut request = Request::default();
        let mut response = Response::new(200);
        let chunks: Vec<Result<Vec<u8>, ()>> = chunks.iter().map(|c| Ok(c.to_vec())).collect();
        read_json(chunks, &mut request, &mut response).unwrap();
        (request, response)
    }

    #[test]
    fn test_chunks_are_joined() {
        let (request, response) = read(&[
            &b"{\"name\": \"A"[..],
            &b"nn\", \"email\""[..],
            &b": \"a@b.c\"}"[..],
        ]);
        assert_eq!(request.body, json!({"name": "Ann", "email": "a@b.c"}));
        assert_eq!(request.content_length, 33);
        assert_eq!(response.header("Content-Type"), Some(APPLICATION_JSON));
    }

    #[test]
    fn test_empty_body_is_null() {
        let (request, response) = read(&[]);
        assert_eq!(request.body, Value::Null);
        assert_eq!(response.header("Content-Type"), Some(APPLICATION_JSON));
    }

    #[test]
    fn test_invalid_json_is_null() {
        let (request, _) = read(&[&b"{\"name\": "[..]]);
        assert_eq!(request.body, Value::Null);
    }

    #[test]
    fn test_invalid_utf8_is_null() {
        let (request, _) = read(&[&[0x22u8, 0xff, 0xfe, 0x22][..]]);
        assert_eq!(request.body, Value::Null);
    }

    #[test]
    fn test_non_object_json_is_kept() {
        let (request, _) = read(&[&b"[1, 2]"[..]]);
        assert_eq!(request.body, json!([1, 2]));
    }

    #[test]
    fn test_source_error_is_returned() {
        let mut request = Request::default();
        let mut response = Response::new(200);
        let chunks = vec![Ok(b"{".to_vec()), Err("connection reset")];
        let result = read_json(chunks, &mut request, &mut response);
        assert_eq!(result, Err("connection reset"));
        assert_eq!(response.header("Content-Type"), Some(APPLICATION_JSON));
    }
}
