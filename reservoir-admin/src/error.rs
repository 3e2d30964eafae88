//! Translates [`reservoir_core::CoreError`] into HTTP status codes and
//! JSON/text bodies. Handlers never hold a reservoir lock across the wire —
//! everything here is pure data, no locking.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reservoir_core::{CoreError, StateError};
use thiserror::Error;

/// Wraps a [`CoreError`] with the HTTP framing the admin surface needs.
/// Every handler in this crate returns `Result<T, AdminError>`.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let AdminError::Core(err) = self;
        match err {
            CoreError::NotFound(name) => (StatusCode::NOT_FOUND, format!("reservoir '{name}' not found")).into_response(),
            CoreError::State(state_err) => state_error_response(state_err),
            CoreError::Instantiation { .. } => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
            CoreError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
        }
    }
}

/// State-machine violations surface as 404, the same status used for an
/// unknown reservoir name, carrying a text body naming the reservoir and
/// the violated precondition (`"already started"`, `"running"`, ...).
fn state_error_response(err: StateError) -> Response {
    (StatusCode::NOT_FOUND, err.to_string()).into_response()
}
