//! Request handlers for the test endpoint

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use http_body_util::BodyExt;
use serde::Deserialize;

use crate::body::{self, CharCounter, Charset};
use crate::error::{FixtureError, FixtureResult};
use crate::server::AppState;
use crate::session;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Query string of the test endpoint
#[derive(Debug, Default, Deserialize)]
pub struct TestQuery {
    /// Number of filler characters, validated by the handler
    pub size: Option<String>,
}

/// `GET {context}/test[?size=N]`
pub async fn get_test(
    State(state): State<AppState>,
    Query(query): Query<TestQuery>,
    headers: HeaderMap,
) -> FixtureResult<Response> {
    let size = parse_size(query.size.as_deref(), state.config.max_size)?;

    let session = state.sessions.touch(session::session_id(&headers)).await;
    let request_number = session.next_request_number();
    tracing::debug!(session = %session.id, request_number, size, "GET");

    let mut response = (
        [(CONTENT_TYPE, TEXT_PLAIN)],
        body::greeting(request_number, size),
    )
        .into_response();

    if session.is_new {
        if let Ok(cookie) = HeaderValue::from_str(&session.cookie(&state.config.context_path)) {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
    }

    Ok(response)
}

/// `POST {context}/test`
pub async fn post_test(headers: HeaderMap, body: Body) -> FixtureResult<Response> {
    count_body("POST", &headers, body).await
}

/// `PUT {context}/test`
pub async fn put_test(headers: HeaderMap, body: Body) -> FixtureResult<Response> {
    count_body("PUT", &headers, body).await
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok\n"
}

async fn count_body(method: &str, headers: &HeaderMap, mut body: Body) -> FixtureResult<Response> {
    let mut counter = CharCounter::new(Charset::from_headers(headers));
    while let Some(frame) = body.frame().await {
        if let Some(data) = frame?.data_ref() {
            counter.feed(data);
        }
    }

    let characters = counter.count();
    tracing::debug!(method, characters, "Body drained");
    Ok(([(CONTENT_TYPE, TEXT_PLAIN)], body::received(characters)).into_response())
}

/// Absent or empty `size` means no filler; negative values are accepted
/// and behave like zero.
fn parse_size(raw: Option<&str>, max: u64) -> FixtureResult<i64> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(0),
        Some(raw) => raw,
    };

    let size: i64 = raw
        .parse()
        .map_err(|_| FixtureError::InvalidSize(raw.to_string()))?;
    if size > 0 && size as u64 > max {
        return Err(FixtureError::SizeTooLarge { size, max });
    }
    Ok(size)
}
