use crate::error::AppError;
use axum::{
    extract::Request,
    http::{header::CONTENT_TYPE, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Rejects POST and PUT requests whose body is not declared as JSON.
///
/// Runs before routing reaches a handler, so the body is never read.
pub async fn require_json(request: Request, next: Next) -> Response {
    let writes = matches!(*request.method(), Method::POST | Method::PUT);
    if writes && !declares_json(request.headers()) {
        tracing::debug!(method = %request.method(), uri = %request.uri(), "Rejected non-JSON body");
        return AppError::UnsupportedMediaType.into_response();
    }
    next.run(request).await
}

/// The media type must be `application/json`; parameters such as `charset` are ignored.
fn declares_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case("application/json"))
}
