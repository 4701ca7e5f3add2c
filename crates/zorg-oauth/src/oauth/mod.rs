//! OAuth 2.0 authorization-code flow.
//!
//! - Session model and lifecycle ([`session`])
//! - Authorization request and grant redirect ([`authorize`])
//! - Token request and response ([`token`])
//! - Flow orchestration ([`server`])

pub mod authorize;
pub mod server;
pub mod session;
pub mod token;

pub use authorize::{AuthorizationRequest, AuthorizationResponse, build_grant_redirect_url};
pub use server::{Server, SessionRef};
pub use session::{AuthorizationGrant, NewOAuthSession, OAuthSession, SessionState};
pub use token::{AUTHORIZATION_CODE_GRANT, BEARER, TokenRequest, TokenResponse};
