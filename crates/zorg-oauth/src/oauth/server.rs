//! Authorization-code flow orchestration.
//!
//! [`Server`] drives each session through its lifecycle:
//!
//! 1. [`create_oauth_session`](Server::create_oauth_session) validates the
//!    request against the live capability descriptor and persists the session
//! 2. [`bind_subject`](Server::bind_subject) attaches the authenticated end-user
//! 3. [`zg_resource_available`](Server::zg_resource_available) asks the external
//!    predicate whether there is anything to authorize
//! 4. [`handle_auth_grant`](Server::handle_auth_grant) records the consent
//!    decision and issues the authorization code
//! 5. [`exchange_authorization_code`](Server::exchange_authorization_code)
//!    trades the code for an access token
//!
//! The server holds no session state of its own; every step re-loads the
//! session from the [`DataStore`], and concurrent writers are resolved by the
//! store's version check.
//!
//! # Usage
//!
//! ```ignore
//! use zorg_oauth::oauth::Server;
//!
//! let server = Server::new(data_store, descriptor_source, availability, &config.oauth)?;
//!
//! let session = server.create_oauth_session(&request).await?;
//! server.bind_subject(session.id, "999993653").await?;
//! server.zg_resource_available(session.id, client_data).await?;
//! let (session, redirect_url) = server.handle_auth_grant(session.id, true).await?;
//! ```

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AuthResult;
use crate::config::OAuthConfig;
use crate::error::{AuthError, OAuthError};
use crate::oauth::authorize::{AuthorizationRequest, build_grant_redirect_url};
use crate::oauth::session::{AuthorizationGrant, NewOAuthSession, OAuthSession};
use crate::oauth::token::{TokenRequest, TokenResponse};
use crate::ocl::source::CapabilityDescriptorSource;
use crate::resource::{ClientData, ResourceAvailability, merge_subject};
use crate::storage::DataStore;
use crate::token::{IntrospectionResponse, TokenGenerator};
use crate::validation::{validate_exchange_request, validate_request_parameters};

/// A session given either loaded or by id.
#[derive(Debug, Clone, Copy)]
pub enum SessionRef<'a> {
    /// Already loaded by the caller.
    Session(&'a OAuthSession),
    /// To be loaded from the DataStore.
    Id(Uuid),
}

impl<'a> From<&'a OAuthSession> for SessionRef<'a> {
    fn from(session: &'a OAuthSession) -> Self {
        Self::Session(session)
    }
}

impl From<Uuid> for SessionRef<'_> {
    fn from(id: Uuid) -> Self {
        Self::Id(id)
    }
}

/// Authorization-code flow server.
pub struct Server {
    /// Session persistence.
    data_store: Arc<dyn DataStore>,

    /// Accessor for the capability descriptor (OCL).
    descriptor_source: Arc<dyn CapabilityDescriptorSource>,

    /// External resource availability predicate.
    resource_availability: Arc<dyn ResourceAvailability>,

    /// Generator for authorization codes.
    code_generator: TokenGenerator,

    /// Generator for access tokens.
    access_token_generator: TokenGenerator,
}

impl Server {
    /// Creates a server.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token settings are invalid.
    pub fn new(
        data_store: Arc<dyn DataStore>,
        descriptor_source: Arc<dyn CapabilityDescriptorSource>,
        resource_availability: Arc<dyn ResourceAvailability>,
        config: &OAuthConfig,
    ) -> AuthResult<Self> {
        config
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        let code_generator = TokenGenerator::with_byte_length(
            to_time_duration(config.authorization_code_lifetime)?,
            config.token_bytes,
        )?;
        let access_token_generator = TokenGenerator::with_byte_length(
            to_time_duration(config.access_token_lifetime)?,
            config.token_bytes,
        )?;

        Ok(Self {
            data_store,
            descriptor_source,
            resource_availability,
            code_generator,
            access_token_generator,
        })
    }

    /// Validates an authorization request and persists a new session.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` if the request does not match the capability
    /// descriptor. The error only carries a redirect target once the client's
    /// redirect URI has been verified, and nothing is persisted.
    pub async fn create_oauth_session(
        &self,
        request: &AuthorizationRequest,
    ) -> AuthResult<OAuthSession> {
        let descriptor = self.descriptor_source.get_ocl().await?;

        if let Err(e) = validate_request_parameters(request, &descriptor) {
            warn!(
                client_id = ?request.client_id,
                error = %e,
                redirect = e.redirect,
                "Authorization request rejected"
            );
            return Err(e.into());
        }

        let session = self
            .data_store
            .create_oauth_session(NewOAuthSession {
                response_type: request.response_type.clone().unwrap_or_default(),
                client_id: request.client_id.clone().unwrap_or_default(),
                redirect_uri: request.redirect_uri.clone().unwrap_or_default(),
                scope: request.scope.clone().unwrap_or_default(),
                state: request.state.clone(),
            })
            .await?;

        info!(
            session_id = %session.id,
            client_id = %session.client_id,
            "OAuth session created"
        );
        Ok(session)
    }

    /// Binds the authenticated end-user to the session.
    ///
    /// Binding the same subject again is a no-op.
    ///
    /// # Errors
    ///
    /// - `UnknownSession` if the id does not resolve
    /// - `SubjectBinding` if the grant is already decided or a different
    ///   subject is bound
    pub async fn bind_subject(&self, id: Uuid, bsn: &str) -> AuthResult<OAuthSession> {
        let mut session = self.load_session(id).await?;

        if session.authorization_granted.is_decided() {
            return Err(AuthError::SubjectBinding {
                id: id.to_string(),
                message: format!("session is {}", session.state()),
            });
        }

        let already_bound = match session.zorggebruiker_bsn.as_deref() {
            Some(bound) if bound == bsn => true,
            Some(_) => {
                return Err(AuthError::SubjectBinding {
                    id: id.to_string(),
                    message: "a different subject is already bound".to_string(),
                });
            }
            None => false,
        };
        if already_bound {
            return Ok(session);
        }

        session.zorggebruiker_bsn = Some(bsn.to_string());
        let session = self.data_store.save_oauth_session(&session).await?;

        info!(session_id = %session.id, "Subject bound to OAuth session");
        Ok(session)
    }

    /// Asks the availability predicate whether resources exist for the
    /// session's subject.
    ///
    /// The subject identifier is merged into `client_data` under `bsn`. The
    /// session is not modified.
    ///
    /// # Errors
    ///
    /// - `access_denied`, redirecting to the session's redirect URI, if the
    ///   predicate returns `false`
    /// - `UnknownSession` if an id is given that does not resolve
    pub async fn zg_resource_available<'a>(
        &self,
        session: impl Into<SessionRef<'a>>,
        client_data: ClientData,
    ) -> AuthResult<bool> {
        let loaded;
        let session = match session.into() {
            SessionRef::Session(session) => session,
            SessionRef::Id(id) => {
                loaded = self.load_session(id).await?;
                &loaded
            }
        };

        let client_data = merge_subject(client_data, session.zorggebruiker_bsn.as_deref());

        if self
            .resource_availability
            .zg_resource_available(&client_data)
            .await?
        {
            debug!(session_id = %session.id, "Resources available");
            return Ok(true);
        }

        info!(session_id = %session.id, "No resources available for subject");
        Err(OAuthError::access_denied(
            "No resources available",
            session.redirect_uri.clone(),
            session.state.clone(),
        )
        .into())
    }

    /// Records the consent decision.
    ///
    /// On approval an authorization code is issued and the redirect URL
    /// `{redirect_uri}?code=..&state=..&expires_in=..&token_type=bearer`
    /// is returned together with the updated session.
    ///
    /// # Errors
    ///
    /// - `access_denied`, redirecting to the session's redirect URI, when
    ///   `authorized` is `false` (the denial is persisted first)
    /// - `UnknownSession` if the id does not resolve
    /// - `GrantAlreadyDecided` if a decision was recorded before; a second
    ///   call never reissues a code
    pub async fn handle_auth_grant(
        &self,
        id: Uuid,
        authorized: bool,
    ) -> AuthResult<(OAuthSession, String)> {
        let mut session = self.load_session(id).await?;

        if session.authorization_granted.is_decided() {
            warn!(
                session_id = %id,
                state = %session.state(),
                "Repeated grant decision rejected"
            );
            return Err(already_decided(&session));
        }

        if !authorized {
            session.authorization_granted = AuthorizationGrant::Denied;
            let session = self.save_decision(&session).await?;

            info!(session_id = %session.id, "Authorization denied");
            return Err(OAuthError::access_denied(
                "The user denied the authorization request",
                session.redirect_uri,
                session.state,
            )
            .into());
        }

        let now = OffsetDateTime::now_utc();
        let code = self.code_generator.create_token_at(now)?;

        session.authorization_granted = AuthorizationGrant::Granted;
        session.authorization_code = Some(code.value.clone());
        session.authorization_code_expiration = Some(code.expiration);
        let session = self.save_decision(&session).await?;

        let redirect_url = build_grant_redirect_url(
            &session.redirect_uri,
            &code.value,
            session.state.as_deref(),
            code.expiration,
            now,
        );

        info!(
            session_id = %session.id,
            client_id = %session.client_id,
            "Authorization granted, code issued"
        );
        Ok((session, redirect_url))
    }

    /// Exchanges an authorization code for an access token.
    ///
    /// The code is cleared in the same write that stores the access token, so
    /// it can be used once only.
    ///
    /// # Errors
    ///
    /// Returns a direct (non-redirect) protocol error if validation fails or
    /// the code was exchanged concurrently.
    pub async fn exchange_authorization_code(
        &self,
        request: &TokenRequest,
    ) -> AuthResult<TokenResponse> {
        let now = OffsetDateTime::now_utc();

        let found = match request.code.as_deref().filter(|c| !c.is_empty()) {
            Some(code) => {
                self.data_store
                    .get_oauth_session_by_authorization_code(code)
                    .await?
            }
            None => None,
        };

        let mut session = match validate_exchange_request(request, found.as_ref(), now) {
            Ok(session) => session.clone(),
            Err(e) => {
                warn!(
                    client_id = ?request.client_id,
                    error = %e,
                    "Code exchange rejected"
                );
                return Err(e.into());
            }
        };

        let token = self.access_token_generator.create_token_at(now)?;
        session.authorization_code = None;
        session.access_token = Some(token.value.clone());
        session.access_token_expiration = Some(token.expiration);

        let session = match self.data_store.save_oauth_session(&session).await {
            Ok(saved) => saved,
            Err(AuthError::Conflict { .. }) => {
                warn!(session_id = %session.id, "Concurrent code exchange rejected");
                return Err(OAuthError::invalid_grant("Invalid authorization code").into());
            }
            Err(e) => return Err(e),
        };

        info!(
            session_id = %session.id,
            client_id = %session.client_id,
            "Authorization code exchanged"
        );
        Ok(TokenResponse::new(
            token.value,
            token.lifetime.whole_seconds(),
            session.scope,
        ))
    }

    /// Describes an access token for a resource server.
    ///
    /// Unknown and expired tokens are reported as inactive.
    ///
    /// # Errors
    ///
    /// Returns an error only if the DataStore fails.
    pub async fn introspect_access_token(&self, token: &str) -> AuthResult<IntrospectionResponse> {
        let session = self
            .data_store
            .get_oauth_session_by_access_token(token)
            .await?;

        Ok(session.map_or_else(IntrospectionResponse::inactive, |s| {
            IntrospectionResponse::from_session(&s, OffsetDateTime::now_utc())
        }))
    }

    /// Returns the DataStore.
    #[must_use]
    pub fn data_store(&self) -> &Arc<dyn DataStore> {
        &self.data_store
    }

    async fn load_session(&self, id: Uuid) -> AuthResult<OAuthSession> {
        self.data_store
            .get_oauth_session_by_id(id)
            .await?
            .ok_or_else(|| AuthError::unknown_session(id))
    }

    /// Saves a grant decision; losing a race to another decision counts as
    /// a repeated decision.
    async fn save_decision(&self, session: &OAuthSession) -> AuthResult<OAuthSession> {
        match self.data_store.save_oauth_session(session).await {
            Err(AuthError::Conflict { .. }) => {
                let current = self.load_session(session.id).await?;
                Err(already_decided(&current))
            }
            other => other,
        }
    }
}

fn already_decided(session: &OAuthSession) -> AuthError {
    AuthError::GrantAlreadyDecided {
        id: session.id.to_string(),
        state: session.state().to_string(),
    }
}

fn to_time_duration(duration: std::time::Duration) -> AuthResult<time::Duration> {
    time::Duration::try_from(duration)
        .map_err(|e| AuthError::configuration(format!("token lifetime out of range: {e}")))
}
