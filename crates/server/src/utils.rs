use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use library::{Artwork, LibraryError, NotFound};

use crate::state::ErrorResponse;

pub fn json_error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

pub fn not_found_response(err: NotFound) -> Response {
    json_error_response(StatusCode::NOT_FOUND, err.to_string())
}

pub fn library_error_response(err: LibraryError) -> Response {
    match err {
        LibraryError::NotFound(err) => not_found_response(err),
        other => json_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("library error: {}", other),
        ),
    }
}

pub fn artwork_response(artwork: Artwork) -> Response {
    let mut response = Response::new(Body::from(artwork.data));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&artwork.mime)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=86400"),
    );
    response
}
