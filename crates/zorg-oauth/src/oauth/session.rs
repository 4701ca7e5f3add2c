//! OAuth session record.
//!
//! One [`OAuthSession`] exists per authorization attempt. It is created when
//! the authorization request has been validated, mutated once by the grant
//! decision and once more by the code exchange, and never deleted here.
//!
//! # Lifecycle
//!
//! ```text
//! CREATED ──grant──► GRANTED ──exchange──► EXCHANGED
//!    │
//!    └────deny────► DENIED
//! ```
//!
//! `DENIED` and `EXCHANGED` are terminal.
//!
//! # Security
//!
//! - The authorization code is held only between grant and exchange
//! - The access token is set exactly once, at exchange
//! - `redirect_uri` never changes after creation

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Outcome of the consent step.
///
/// Keeps "not yet decided" apart from "denied" at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationGrant {
    /// No decision recorded yet.
    #[default]
    Pending,
    /// The end-user authorized the client.
    Granted,
    /// The end-user (or the resource check) refused.
    Denied,
}

impl AuthorizationGrant {
    /// Returns `true` once a decision has been recorded.
    #[must_use]
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Lifecycle state derived from the session fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created from a validated authorization request.
    Created,
    /// Authorized, authorization code outstanding.
    Granted,
    /// Refused. Terminal.
    Denied,
    /// Code exchanged for an access token. Terminal.
    Exchanged,
}

impl SessionState {
    /// Returns the state name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Exchanged => "exchanged",
        }
    }

    /// Returns `true` if no further transition is permitted.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Denied | Self::Exchanged)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields captured from a validated authorization request.
///
/// The DataStore turns this into an [`OAuthSession`] by assigning the id,
/// creation timestamp and initial version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOAuthSession {
    pub response_type: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub state: Option<String>,
}

/// Authorization session persisted by the DataStore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthSession {
    /// Opaque session identifier.
    pub id: Uuid,

    /// Response type from the authorization request (always `code`).
    pub response_type: String,

    /// Client that initiated the request.
    pub client_id: String,

    /// Redirect URI from the authorization request.
    /// The only valid redirect target for the whole session.
    pub redirect_uri: String,

    /// Requested scopes (space-separated), echoed in the token response.
    pub scope: String,

    /// CSRF state from the authorization request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Subject identifier (BSN) of the authenticated end-user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zorggebruiker_bsn: Option<String>,

    /// Consent decision.
    #[serde(default)]
    pub authorization_granted: AuthorizationGrant,

    /// Authorization code, held only between grant and exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub authorization_code_expiration: Option<OffsetDateTime>,

    /// Access token issued at exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub access_token_expiration: Option<OffsetDateTime>,

    /// Timestamp when the session was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// Revision used for optimistic concurrency control.
    /// Maintained by the DataStore; starts at 1.
    pub version: u64,
}

impl OAuthSession {
    /// Builds the initial record for a new session.
    #[must_use]
    pub fn from_new(id: Uuid, new: NewOAuthSession, created_at: OffsetDateTime) -> Self {
        Self {
            id,
            response_type: new.response_type,
            client_id: new.client_id,
            redirect_uri: new.redirect_uri,
            scope: new.scope,
            state: new.state,
            zorggebruiker_bsn: None,
            authorization_granted: AuthorizationGrant::Pending,
            authorization_code: None,
            authorization_code_expiration: None,
            access_token: None,
            access_token_expiration: None,
            created_at,
            version: 1,
        }
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.access_token.is_some() {
            return SessionState::Exchanged;
        }
        match self.authorization_granted {
            AuthorizationGrant::Pending => SessionState::Created,
            AuthorizationGrant::Granted => SessionState::Granted,
            AuthorizationGrant::Denied => SessionState::Denied,
        }
    }

    /// Returns `true` if the session is bound to an end-user.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.zorggebruiker_bsn.is_some()
    }

    /// Returns `true` unless an authorization code is held that is still
    /// valid at `now`. A missing expiration counts as expired.
    #[must_use]
    pub fn is_authorization_code_expired(&self, now: OffsetDateTime) -> bool {
        match (
            self.authorization_code.as_ref(),
            self.authorization_code_expiration,
        ) {
            (Some(_), Some(expiration)) => now >= expiration,
            _ => true,
        }
    }

    /// Returns `true` unless an access token is held that is still valid at
    /// `now`. A missing expiration counts as expired.
    #[must_use]
    pub fn is_access_token_expired(&self, now: OffsetDateTime) -> bool {
        match (self.access_token.as_ref(), self.access_token_expiration) {
            (Some(_), Some(expiration)) => now >= expiration,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn create_test_session() -> OAuthSession {
        OAuthSession::from_new(
            Uuid::new_v4(),
            NewOAuthSession {
                response_type: "code".to_string(),
                client_id: "test-client".to_string(),
                redirect_uri: "https://client.example/cb".to_string(),
                scope: "eenmalig_gegevens".to_string(),
                state: Some("xyz".to_string()),
            },
            OffsetDateTime::now_utc(),
        )
    }

    #[test]
    fn test_new_session_is_created() {
        let session = create_test_session();
        assert_eq!(session.state(), SessionState::Created);
        assert_eq!(session.authorization_granted, AuthorizationGrant::Pending);
        assert_eq!(session.version, 1);
        assert!(session.authorization_code.is_none());
        assert!(session.access_token.is_none());
        assert!(!session.is_bound());
    }

    #[test]
    fn test_state_transitions() {
        let mut session = create_test_session();

        session.authorization_granted = AuthorizationGrant::Granted;
        session.authorization_code = Some("code".to_string());
        assert_eq!(session.state(), SessionState::Granted);
        assert!(!session.state().is_terminal());

        session.authorization_code = None;
        session.access_token = Some("token".to_string());
        assert_eq!(session.state(), SessionState::Exchanged);
        assert!(session.state().is_terminal());

        let mut denied = create_test_session();
        denied.authorization_granted = AuthorizationGrant::Denied;
        assert_eq!(denied.state(), SessionState::Denied);
        assert!(denied.state().is_terminal());
    }

    #[test]
    fn test_authorization_code_expiry() {
        let now = OffsetDateTime::now_utc();
        let mut session = create_test_session();

        // No code at all
        assert!(session.is_authorization_code_expired(now));

        session.authorization_code = Some("code".to_string());
        session.authorization_code_expiration = Some(now + Duration::minutes(10));
        assert!(!session.is_authorization_code_expired(now));

        session.authorization_code_expiration = Some(now - Duration::seconds(1));
        assert!(session.is_authorization_code_expired(now));

        // Code without expiration is never valid
        session.authorization_code_expiration = None;
        assert!(session.is_authorization_code_expired(now));
    }

    #[test]
    fn test_access_token_expiry() {
        let now = OffsetDateTime::now_utc();
        let mut session = create_test_session();
        assert!(session.is_access_token_expired(now));

        session.access_token = Some("token".to_string());
        session.access_token_expiration = Some(now + Duration::hours(1));
        assert!(!session.is_access_token_expired(now));
        assert!(session.is_access_token_expired(now + Duration::hours(1)));
    }

    #[test]
    fn test_grant_is_decided() {
        assert!(!AuthorizationGrant::Pending.is_decided());
        assert!(AuthorizationGrant::Granted.is_decided());
        assert!(AuthorizationGrant::Denied.is_decided());
    }

    #[test]
    fn test_session_serialization() {
        let mut session = create_test_session();
        session.zorggebruiker_bsn = Some("999993653".to_string());

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["clientId"], "test-client");
        assert_eq!(json["authorizationGranted"], "pending");
        assert_eq!(json["zorggebruikerBsn"], "999993653");
        assert!(json.get("authorizationCode").is_none());

        let deserialized: OAuthSession = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized.id, session.id);
        assert_eq!(deserialized.state, session.state);
    }
}
