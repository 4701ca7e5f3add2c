//! `IntoResponse` implementations.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::{AuthError, OAuthError, OAuthErrorCode};
use crate::oauth::TokenResponse;
use crate::token::IntrospectionResponse;

/// JSON body of a direct (non-redirect) error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub error_description: String,
}

impl From<&OAuthError> for ErrorBody {
    fn from(e: &OAuthError) -> Self {
        Self {
            error: e.code.as_str().to_string(),
            error_description: e.description.clone(),
        }
    }
}

/// Redirects the user-agent back to the client after a grant.
pub fn grant_redirect_response(redirect_url: &str) -> Response {
    Redirect::to(redirect_url).into_response()
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        if let Some(location) = self.redirect_url() {
            return (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();
        }

        let status = StatusCode::from_u16(self.code.http_status())
            .unwrap_or(StatusCode::BAD_REQUEST);
        no_store(status, ErrorBody::from(&self))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::OAuth(e) => e.into_response(),
            other => {
                // Details stay in the log.
                error!(category = %other.category(), error = %other, "Request failed");
                no_store(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: OAuthErrorCode::ServerError.as_str().to_string(),
                        error_description: "The server encountered an unexpected condition"
                            .to_string(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for TokenResponse {
    fn into_response(self) -> Response {
        no_store(StatusCode::OK, self)
    }
}

impl IntoResponse for IntrospectionResponse {
    fn into_response(self) -> Response {
        no_store(StatusCode::OK, self)
    }
}

fn no_store<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::PRAGMA, "no-cache"),
        ],
        Json(body),
    )
        .into_response()
}
