use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;
use uuid::Uuid;
use zorg_oauth::oauth::{NewOAuthSession, OAuthSession};
use zorg_oauth::{AuthError, AuthResult, DataStore};

/// In-memory session store backed by sharded concurrent maps.
///
/// This store provides:
/// - Lookup by id, authorization code and access token via secondary indices
/// - Optimistic concurrency: a save with a stale version fails with `Conflict`
/// - Writers to the same session are serialized by the shard lock
#[derive(Debug, Default)]
pub struct InMemoryDataStore {
    /// Sessions by id
    sessions: DashMap<Uuid, OAuthSession>,
    /// Authorization code -> session id
    codes: DashMap<String, Uuid>,
    /// Access token -> session id
    access_tokens: DashMap<String, Uuid>,
}

impl InMemoryDataStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no session is stored.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Resolves a secondary index entry, ignoring stale ones.
    ///
    /// The index guard is released before the session map is touched.
    fn resolve(
        &self,
        index: &DashMap<String, Uuid>,
        key: &str,
        holds: impl Fn(&OAuthSession) -> bool,
    ) -> Option<OAuthSession> {
        let id = index.get(key).map(|entry| *entry.value())?;
        self.sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .filter(|session| holds(session))
    }
}

#[async_trait]
impl DataStore for InMemoryDataStore {
    async fn create_oauth_session(&self, session: NewOAuthSession) -> AuthResult<OAuthSession> {
        let session = OAuthSession::from_new(Uuid::new_v4(), session, OffsetDateTime::now_utc());
        self.sessions.insert(session.id, session.clone());

        tracing::debug!(session_id = %session.id, "Session stored");
        Ok(session)
    }

    async fn get_oauth_session_by_id(&self, id: Uuid) -> AuthResult<Option<OAuthSession>> {
        Ok(self.sessions.get(&id).map(|entry| entry.value().clone()))
    }

    async fn get_oauth_session_by_authorization_code(
        &self,
        code: &str,
    ) -> AuthResult<Option<OAuthSession>> {
        Ok(self.resolve(&self.codes, code, |s| {
            s.authorization_code.as_deref() == Some(code)
        }))
    }

    async fn get_oauth_session_by_access_token(
        &self,
        token: &str,
    ) -> AuthResult<Option<OAuthSession>> {
        Ok(self.resolve(&self.access_tokens, token, |s| {
            s.access_token.as_deref() == Some(token)
        }))
    }

    async fn save_oauth_session(&self, session: &OAuthSession) -> AuthResult<OAuthSession> {
        // Shard write lock held until the end of this block
        let mut entry = self
            .sessions
            .get_mut(&session.id)
            .ok_or_else(|| AuthError::unknown_session(session.id))?;
        let stored = entry.value_mut();

        if stored.version != session.version {
            tracing::debug!(
                session_id = %session.id,
                stored_version = stored.version,
                given_version = session.version,
                "Stale session write rejected"
            );
            return Err(AuthError::conflict(format!(
                "session {} was modified concurrently",
                session.id
            )));
        }
        if stored.redirect_uri != session.redirect_uri {
            return Err(AuthError::conflict("redirect_uri cannot be changed"));
        }

        if stored.authorization_code != session.authorization_code {
            if let Some(old) = &stored.authorization_code {
                self.codes.remove(old);
            }
            if let Some(new) = &session.authorization_code {
                self.codes.insert(new.clone(), session.id);
            }
        }
        if stored.access_token != session.access_token {
            if let Some(old) = &stored.access_token {
                self.access_tokens.remove(old);
            }
            if let Some(new) = &session.access_token {
                self.access_tokens.insert(new.clone(), session.id);
            }
        }

        let mut updated = session.clone();
        updated.version = stored.version + 1;
        *stored = updated.clone();

        Ok(updated)
    }
}
