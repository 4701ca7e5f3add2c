//! Authorization endpoint types.
//!
//! The authorization request starts the flow; the grant redirect ends the
//! user-agent part of it by handing the authorization code to the client.
//!
//! # Example
//!
//! ```ignore
//! GET /authorize?
//!   response_type=code
//!   &client_id=medmij-app
//!   &redirect_uri=https://client.example/cb
//!   &scope=eenmalig_gegevens
//!   &state=xyz
//! ```

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Authorization request parameters.
///
/// Every field is optional at the parsing level so that a missing parameter
/// is reported through the protocol error channel instead of failing
/// deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthorizationRequest {
    /// Must be `code`.
    #[serde(default)]
    pub response_type: Option<String>,

    /// Client identifier as listed in the capability descriptor.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Redirect URI. Must exactly match a registered URI of the client.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Requested scopes (space-separated).
    #[serde(default)]
    pub scope: Option<String>,

    /// CSRF protection state, echoed on every redirect.
    #[serde(default)]
    pub state: Option<String>,
}

/// Successful authorization response sent to the client's redirect URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationResponse {
    /// Authorization code to exchange at the token endpoint.
    pub code: String,

    /// Echoed state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Seconds until the code expires.
    pub expires_in: i64,

    /// Always `bearer`.
    pub token_type: &'static str,
}

impl AuthorizationResponse {
    /// Creates the response for a code expiring at `expiration`.
    ///
    /// `expires_in` is computed against `now`, not taken from a constant,
    /// and never goes negative.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        state: Option<String>,
        expiration: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            code: code.into(),
            state,
            expires_in: (expiration - now).whole_seconds().max(0),
            token_type: "bearer",
        }
    }

    /// Builds the redirect URL.
    ///
    /// Produces `{redirect_uri}?code=..&state=..&expires_in=..&token_type=bearer`
    /// with form-urlencoded values. The redirect URI is used verbatim, so it
    /// is not normalized by URL parsing.
    #[must_use]
    pub fn to_redirect_url(&self, redirect_uri: &str) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("code", &self.code);
        if let Some(state) = &self.state {
            query.append_pair("state", state);
        }
        query
            .append_pair("expires_in", &self.expires_in.to_string())
            .append_pair("token_type", self.token_type);

        append_query(redirect_uri, &query.finish())
    }
}

/// Builds the grant redirect URL for a code expiring at `expiration`.
#[must_use]
pub fn build_grant_redirect_url(
    redirect_uri: &str,
    code: &str,
    state: Option<&str>,
    expiration: OffsetDateTime,
    now: OffsetDateTime,
) -> String {
    AuthorizationResponse::new(code, state.map(str::to_owned), expiration, now)
        .to_redirect_url(redirect_uri)
}

/// Appends an encoded query string to `base`, keeping any query already
/// present on it.
pub(crate) fn append_query(base: &str, query: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{query}")
}
