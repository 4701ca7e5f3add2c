//! Error types for the authorization-code flow.
//!
//! Two channels are kept apart:
//!
//! - [`OAuthError`] is the protocol channel. It is rendered for the client,
//!   either as a redirect back to a validated `redirect_uri` or as a direct
//!   JSON error body (token endpoint).
//! - The remaining [`AuthError`] variants signal misuse by the calling layer
//!   (unknown session id, grant decided twice) or infrastructure failures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// OAuth 2.0 error codes used by the authorization and token endpoints.
///
/// Defined in RFC 6749 Sections 4.1.2.1 and 5.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthErrorCode {
    /// Missing, unregistered or malformed request parameter.
    InvalidRequest,
    /// The client may not request an authorization code this way.
    UnauthorizedClient,
    /// The resource owner or the resource check denied the request.
    AccessDenied,
    /// The response type is not supported.
    UnsupportedResponseType,
    /// The requested scope is invalid or unknown.
    InvalidScope,
    /// Unexpected condition on the authorization server.
    ServerError,
    /// The authorization code is invalid, expired, used or mismatched.
    InvalidGrant,
    /// Client identification failed.
    InvalidClient,
    /// The grant type is not supported.
    UnsupportedGrantType,
}

impl OAuthErrorCode {
    /// Returns the wire representation of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::AccessDenied => "access_denied",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::InvalidScope => "invalid_scope",
            Self::ServerError => "server_error",
            Self::InvalidGrant => "invalid_grant",
            Self::InvalidClient => "invalid_client",
            Self::UnsupportedGrantType => "unsupported_grant_type",
        }
    }

    /// Returns the HTTP status used when the error is rendered directly.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidClient => 401,
            Self::AccessDenied => 403,
            Self::ServerError => 500,
            Self::InvalidRequest
            | Self::UnauthorizedClient
            | Self::UnsupportedResponseType
            | Self::InvalidScope
            | Self::InvalidGrant
            | Self::UnsupportedGrantType => 400,
        }
    }
}

impl fmt::Display for OAuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol-facing error.
///
/// Carries everything the HTTP layer needs to decide between a redirect and a
/// JSON error body. `base_redirect_url` is only ever populated with a
/// redirect URI that has already been checked against the capability
/// descriptor, so rendering the redirect cannot become an open redirect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {description}")]
pub struct OAuthError {
    /// OAuth error code.
    pub code: OAuthErrorCode,
    /// Human-readable description.
    pub description: String,
    /// Validated redirect target, if any.
    pub base_redirect_url: Option<String>,
    /// `state` of the originating request, echoed on redirect.
    pub state: Option<String>,
    /// Whether the caller should redirect the user agent.
    pub redirect: bool,
}

impl OAuthError {
    /// Creates an error that must be returned directly, never redirected.
    #[must_use]
    pub fn new(code: OAuthErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            base_redirect_url: None,
            state: None,
            redirect: false,
        }
    }

    /// Creates an error that redirects the user agent to `redirect_uri`.
    #[must_use]
    pub fn with_redirect(
        code: OAuthErrorCode,
        description: impl Into<String>,
        redirect_uri: impl Into<String>,
        state: Option<String>,
    ) -> Self {
        Self {
            code,
            description: description.into(),
            base_redirect_url: Some(redirect_uri.into()),
            state,
            redirect: true,
        }
    }

    /// `invalid_request` without redirect.
    #[must_use]
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new(OAuthErrorCode::InvalidRequest, description)
    }

    /// `access_denied` redirecting to the session's redirect URI.
    #[must_use]
    pub fn access_denied(
        description: impl Into<String>,
        redirect_uri: impl Into<String>,
        state: Option<String>,
    ) -> Self {
        Self::with_redirect(OAuthErrorCode::AccessDenied, description, redirect_uri, state)
    }

    /// `invalid_grant` without redirect.
    #[must_use]
    pub fn invalid_grant(description: impl Into<String>) -> Self {
        Self::new(OAuthErrorCode::InvalidGrant, description)
    }

    /// `unsupported_grant_type` without redirect.
    #[must_use]
    pub fn unsupported_grant_type(grant_type: &str) -> Self {
        Self::new(
            OAuthErrorCode::UnsupportedGrantType,
            format!("Grant type '{grant_type}' is not supported"),
        )
    }

    /// Builds the redirect URL carrying the error parameters.
    ///
    /// Returns `None` when the error must not be redirected.
    #[must_use]
    pub fn redirect_url(&self) -> Option<String> {
        if !self.redirect {
            return None;
        }
        let base = self.base_redirect_url.as_deref()?;

        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("error", self.code.as_str())
            .append_pair("error_description", &self.description);
        if let Some(state) = &self.state {
            query.append_pair("state", state);
        }

        Some(crate::oauth::authorize::append_query(base, &query.finish()))
    }
}

/// Errors returned by the authorization-code flow.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Protocol error to be rendered for the client.
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// The session id does not resolve. Indicates a bug in the calling layer.
    #[error("Unknown OAuth session: {id}")]
    UnknownSession {
        /// The id that was looked up.
        id: String,
    },

    /// The grant decision was already recorded for this session.
    #[error("Authorization already decided for session {id} ({state})")]
    GrantAlreadyDecided {
        /// Session id.
        id: String,
        /// Lifecycle state the session is in.
        state: String,
    },

    /// The subject cannot be (re)bound at this stage of the session.
    #[error("Cannot bind subject to session {id}: {message}")]
    SubjectBinding {
        /// Session id.
        id: String,
        /// Why binding was refused.
        message: String,
    },

    /// A concurrent writer updated the session first.
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflict.
        message: String,
    },

    /// The DataStore failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `UnknownSession` error.
    #[must_use]
    pub fn unknown_session(id: impl fmt::Display) -> Self {
        Self::UnknownSession { id: id.to_string() }
    }

    /// Creates a new `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the protocol error, if this is one.
    #[must_use]
    pub fn as_oauth(&self) -> Option<&OAuthError> {
        match self {
            Self::OAuth(e) => Some(e),
            _ => None,
        }
    }

    /// Returns `true` for errors on the protocol channel.
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::OAuth(_))
    }

    /// Returns `true` for errors caused by the calling layer.
    #[must_use]
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Self::UnknownSession { .. }
                | Self::GrantAlreadyDecided { .. }
                | Self::SubjectBinding { .. }
        )
    }

    /// Returns `true` if the user agent should be redirected.
    #[must_use]
    pub fn should_redirect(&self) -> bool {
        self.as_oauth().is_some_and(|e| e.redirect)
    }

    /// Returns the error category for logging.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::OAuth(e) => match e.code {
                OAuthErrorCode::AccessDenied => ErrorCategory::Authorization,
                OAuthErrorCode::InvalidGrant | OAuthErrorCode::InvalidClient => {
                    ErrorCategory::Exchange
                }
                OAuthErrorCode::ServerError => ErrorCategory::Internal,
                _ => ErrorCategory::Validation,
            },
            Self::UnknownSession { .. }
            | Self::GrantAlreadyDecided { .. }
            | Self::SubjectBinding { .. } => ErrorCategory::Misuse,
            Self::Conflict { .. } | Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the OAuth error code exposed to clients.
    #[must_use]
    pub fn oauth_error_code(&self) -> OAuthErrorCode {
        match self {
            Self::OAuth(e) => e.code,
            _ => OAuthErrorCode::ServerError,
        }
    }
}

/// Error categories used as a log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Request parameter validation.
    Validation,
    /// Consent or resource availability.
    Authorization,
    /// Code exchange.
    Exchange,
    /// Calling-layer misuse.
    Misuse,
    /// Storage and concurrency.
    Infrastructure,
    /// Configuration.
    Configuration,
    /// Internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Authorization => write!(f, "authorization"),
            Self::Exchange => write!(f, "exchange"),
            Self::Misuse => write!(f, "misuse"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(OAuthErrorCode::InvalidRequest.as_str(), "invalid_request");
        assert_eq!(OAuthErrorCode::AccessDenied.as_str(), "access_denied");
        assert_eq!(OAuthErrorCode::InvalidGrant.as_str(), "invalid_grant");
        assert_eq!(
            OAuthErrorCode::UnsupportedGrantType.as_str(),
            "unsupported_grant_type"
        );
    }

    #[test]
    fn test_error_code_serializes_snake_case() {
        let json = serde_json::to_string(&OAuthErrorCode::UnsupportedResponseType).unwrap();
        assert_eq!(json, r#""unsupported_response_type""#);
    }

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(OAuthErrorCode::InvalidRequest.http_status(), 400);
        assert_eq!(OAuthErrorCode::InvalidClient.http_status(), 401);
        assert_eq!(OAuthErrorCode::AccessDenied.http_status(), 403);
        assert_eq!(OAuthErrorCode::ServerError.http_status(), 500);
    }

    #[test]
    fn test_direct_error_has_no_redirect_url() {
        let err = OAuthError::invalid_request("Unknown redirect_uri");
        assert!(!err.redirect);
        assert!(err.redirect_url().is_none());
    }

    #[test]
    fn test_redirect_error_url() {
        let err = OAuthError::access_denied(
            "Resource not available",
            "https://client.example/cb",
            Some("xyz".to_string()),
        );

        let url = err.redirect_url().unwrap();
        assert_eq!(
            url,
            "https://client.example/cb?error=access_denied&error_description=Resource+not+available&state=xyz"
        );
    }

    #[test]
    fn test_redirect_error_url_without_state() {
        let err = OAuthError::access_denied("denied", "https://client.example/cb?x=1", None);
        assert_eq!(
            err.redirect_url().unwrap(),
            "https://client.example/cb?x=1&error=access_denied&error_description=denied"
        );
    }

    #[test]
    fn test_display() {
        let err = AuthError::from(OAuthError::invalid_grant("Authorization code expired"));
        assert_eq!(err.to_string(), "invalid_grant: Authorization code expired");

        let err = AuthError::unknown_session("abc");
        assert_eq!(err.to_string(), "Unknown OAuth session: abc");
    }

    #[test]
    fn test_predicates() {
        let err = AuthError::from(OAuthError::access_denied(
            "no",
            "https://client.example/cb",
            None,
        ));
        assert!(err.is_protocol_error());
        assert!(err.should_redirect());
        assert!(!err.is_misuse());

        let err = AuthError::from(OAuthError::invalid_grant("expired"));
        assert!(err.is_protocol_error());
        assert!(!err.should_redirect());

        let err = AuthError::unknown_session("abc");
        assert!(err.is_misuse());
        assert!(!err.is_protocol_error());
        assert_eq!(err.oauth_error_code(), OAuthErrorCode::ServerError);
    }

    #[test]
    fn test_category() {
        assert_eq!(
            AuthError::from(OAuthError::invalid_request("x")).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            AuthError::from(OAuthError::invalid_grant("x")).category(),
            ErrorCategory::Exchange
        );
        assert_eq!(
            AuthError::unknown_session("x").category(),
            ErrorCategory::Misuse
        );
        assert_eq!(
            AuthError::conflict("x").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(ErrorCategory::Exchange.to_string(), "exchange");
    }
}
