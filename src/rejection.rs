//! User-facing request failures.
//!
//! A [`Rejection`] is what a guard handler returns when it refuses to let a
//! request continue down the chain. It converts into a plain-text response
//! with the matching status, so handlers can return
//! `Result<Response, Rejection>` and use `?`.

use http::StatusCode;
use thiserror::Error;

use crate::response::{IntoResponse, Response};

/// A request refused by a handler.
#[derive(Debug, Error)]
pub enum Rejection {
    /// A required field or parameter is missing or malformed. `400`.
    #[error("{0}")]
    Validation(String),

    /// A required credential is missing. `401`.
    #[error("{0}")]
    Unauthorized(String),

    /// The method or client is not allowed. `403`.
    #[error("{0}")]
    Forbidden(String),

    /// Nothing in the chain answered. `404`.
    #[error("Not Found")]
    NotFound,

    /// The request body exceeds the configured limit. `413`.
    #[error("Payload Too Large")]
    PayloadTooLarge,

    /// A handler failed unexpectedly. `500`.
    #[error("Internal Server Error")]
    Internal,
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)   => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_)    => StatusCode::FORBIDDEN,
            Self::NotFound        => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal        => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        Response::builder().status(self.status()).text(self.to_string())
    }
}
