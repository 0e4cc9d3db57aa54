//! Middleware for logging requests and responses.
//!
//! Passwords, tokens and the `Authorization` header are masked before anything is logged.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    middleware::Next,
};
use serde_json::Value;

/// Bodies longer than this many characters are truncated in `info` logs.
///
/// The full (redacted) body is still logged at the `debug` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The largest body the middleware will buffer.
const MAX_BODY_BYTES: usize = 1024 * 1024;

const REDACTED: &str = "********";

/// JSON fields whose values are never logged.
const SECRET_FIELDS: [&str; 2] = ["password", "token"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    log_body(
        &format!(
            "Received request: {} {}\nheaders: {:?}",
            parts.method,
            parts.uri,
            redact_headers(&parts.headers)
        ),
        &body_bytes,
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_body(&format!("Sending response: {}", parts.status), &body_bytes);

    Response::from_parts(parts, Body::from(body_bytes))
}

fn log_body(summary: &str, body: &Bytes) {
    let body = redact_body(body);

    if body.chars().count() > LOG_BODY_LENGTH_LIMIT {
        let truncated: String = body.chars().take(LOG_BODY_LENGTH_LIMIT).collect();
        tracing::info!("{summary}\nbody: {truncated}...");
        tracing::debug!("Full body: {body}");
    } else {
        tracing::info!("{summary}\nbody: {body}");
    }
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static(REDACTED));
    }

    headers
}

/// Return the body as text with the values of any secret JSON fields masked.
///
/// Bodies that are not JSON are returned as lossy UTF-8.
fn redact_body(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(mut json) => {
            redact_json(&mut json);
            json.to_string()
        }
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

fn redact_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if SECRET_FIELDS.contains(&key.as_str()) {
                    *value = Value::String(REDACTED.to_owned());
                } else {
                    redact_json(value);
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(redact_json),
        _ => {}
    }
}

#[cfg(test)]
mod logging_tests {
    use axum::{
        Json, Router,
        http::{HeaderMap, HeaderValue, header::AUTHORIZATION},
        middleware,
        routing::post,
    };
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use super::{logging_middleware, redact_body, redact_headers};

    #[test]
    fn redacts_password_field() {
        let body = json!({"email": "alice@example.com", "password": "hunter2"}).to_string();

        let redacted = redact_body(body.as_bytes());

        assert!(!redacted.contains("hunter2"));
        assert!(redacted.contains("alice@example.com"));
    }

    #[test]
    fn redacts_nested_token() {
        let body = json!({"data": [{"token": "abc.def.ghi", "name": "Alice"}]}).to_string();

        let redacted = redact_body(body.as_bytes());

        assert!(!redacted.contains("abc.def.ghi"));
        assert!(redacted.contains("Alice"));
    }

    #[test]
    fn passes_through_non_json() {
        assert_eq!(redact_body(b"hello"), "hello");
    }

    #[test]
    fn masks_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));

        let redacted = redact_headers(&headers);

        assert_eq!(redacted.get(AUTHORIZATION).unwrap(), "********");
    }

    #[tokio::test]
    async fn middleware_preserves_request_and_response_bodies() {
        async fn echo(Json(body): Json<Value>) -> Json<Value> {
            Json(body)
        }
        let app = Router::new()
            .route("/echo", post(echo))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");
        let body = json!({"password": "hunter2", "note": "x".repeat(200)});

        let response = server.post("/echo").json(&body).await;

        response.assert_status_ok();
        response.assert_json(&body);
    }
}
