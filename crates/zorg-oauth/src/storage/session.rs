//! OAuth session storage trait.
//!
//! The DataStore is the single source of truth for the flow. The flow spans
//! several independent requests, so every step re-loads the session from
//! here instead of keeping it in memory.
//!
//! # Implementation Notes
//!
//! Implementations should:
//!
//! - Support lookup by id, authorization code and access token
//! - Reject stale writes in [`DataStore::save_oauth_session`] so that the same
//!   authorization code cannot be exchanged twice concurrently
//! - Never log authorization codes or access tokens
//!
//! A SQL backend typically implements the version check as a conditional
//! update:
//!
//! ```sql
//! UPDATE oauth_session
//! SET resource = $2, version = version + 1
//! WHERE id = $1 AND version = $3
//! RETURNING *
//! ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::oauth::session::{NewOAuthSession, OAuthSession};

/// Storage for [`OAuthSession`] records.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Persists a new session in the `CREATED` state.
    ///
    /// The store assigns the id, the creation timestamp and version 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be stored.
    async fn create_oauth_session(&self, session: NewOAuthSession) -> AuthResult<OAuthSession>;

    /// Finds a session by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_oauth_session_by_id(&self, id: Uuid) -> AuthResult<Option<OAuthSession>>;

    /// Finds the session currently holding `code`.
    ///
    /// Codes cleared by an exchange no longer resolve. Expiry is not checked
    /// here; callers validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_oauth_session_by_authorization_code(
        &self,
        code: &str,
    ) -> AuthResult<Option<OAuthSession>>;

    /// Finds the session holding access token `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_oauth_session_by_access_token(
        &self,
        token: &str,
    ) -> AuthResult<Option<OAuthSession>>;

    /// Writes `session` back and returns the stored copy.
    ///
    /// The write only succeeds if the stored version still equals
    /// `session.version`; the returned copy carries the next version. The
    /// `redirect_uri` of a stored session is immutable.
    ///
    /// # Errors
    ///
    /// - `Conflict` if another writer saved the session first, or the write
    ///   would change `redirect_uri`
    /// - `UnknownSession` if the session does not exist
    /// - `Storage` if the storage operation fails
    async fn save_oauth_session(&self, session: &OAuthSession) -> AuthResult<OAuthSession>;
}
