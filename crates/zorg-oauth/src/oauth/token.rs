//! Token endpoint types.
//!
//! Only the `authorization_code` grant is supported. The token endpoint is a
//! backend-to-backend call, so errors are returned directly and never
//! redirected.

use serde::{Deserialize, Serialize};

/// Grant type accepted by the token endpoint.
pub const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

/// Token type issued for access tokens.
pub const BEARER: &str = "bearer";

/// Code exchange request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenRequest {
    /// Must be `authorization_code` when present.
    #[serde(default)]
    pub grant_type: Option<String>,

    /// Authorization code received on the redirect.
    #[serde(default)]
    pub code: Option<String>,

    /// Redirect URI used in the authorization request.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Client identifier; checked against the session when present.
    #[serde(default)]
    pub client_id: Option<String>,
}

impl TokenRequest {
    /// Creates an `authorization_code` exchange request.
    #[must_use]
    pub fn authorization_code(code: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            grant_type: Some(AUTHORIZATION_CODE_GRANT.to_string()),
            code: Some(code.into()),
            redirect_uri: Some(redirect_uri.into()),
            client_id: None,
        }
    }

    /// Sets the client id.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

/// Successful token response.
///
/// ```json
/// {"access_token": "...", "token_type": "bearer", "expires_in": 3600, "scope": "..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,

    /// Always `bearer`.
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: i64,

    /// Scope carried over from the session.
    pub scope: String,
}

impl TokenResponse {
    /// Creates a bearer token response.
    #[must_use]
    pub fn new(access_token: String, expires_in: i64, scope: String) -> Self {
        Self {
            access_token,
            token_type: BEARER.to_string(),
            expires_in,
            scope,
        }
    }
}
