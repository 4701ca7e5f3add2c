//! Access token introspection (RFC 7662).
//!
//! Lets a resource server check an access token against the session it was
//! issued for. An inactive response never reveals why the token is
//! inactive (unknown vs expired).

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::oauth::session::OAuthSession;
use crate::oauth::token::BEARER;

/// Introspection request.
#[derive(Debug, Clone, Deserialize)]
pub struct IntrospectionRequest {
    /// The token to introspect.
    pub token: String,
}

/// Introspection response.
///
/// Only `active` is present for inactive tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionResponse {
    /// Whether the token is currently active.
    pub active: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Subject identifier (BSN) bound to the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Expiration time (Unix timestamp).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl IntrospectionResponse {
    /// Creates an inactive response.
    #[must_use]
    pub fn inactive() -> Self {
        Self::default()
    }

    /// Describes the access token held by `session` as seen at `now`.
    #[must_use]
    pub fn from_session(session: &OAuthSession, now: OffsetDateTime) -> Self {
        if session.is_access_token_expired(now) {
            return Self::inactive();
        }

        Self {
            active: true,
            scope: Some(session.scope.clone()),
            client_id: Some(session.client_id.clone()),
            sub: session.zorggebruiker_bsn.clone(),
            token_type: Some(BEARER.to_string()),
            exp: session
                .access_token_expiration
                .map(OffsetDateTime::unix_timestamp),
        }
    }
}
