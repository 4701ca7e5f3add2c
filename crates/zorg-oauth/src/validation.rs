//! Request validation.
//!
//! Pure checks of incoming parameters against the capability descriptor
//! (authorization request) and against the stored session (code exchange).
//! Nothing here touches storage.

use time::OffsetDateTime;

use crate::error::{OAuthError, OAuthErrorCode};
use crate::oauth::authorize::AuthorizationRequest;
use crate::oauth::session::{AuthorizationGrant, OAuthSession};
use crate::oauth::token::{AUTHORIZATION_CODE_GRANT, TokenRequest};
use crate::ocl::descriptor::CapabilityDescriptor;

/// Response type of the authorization code flow.
pub const CODE_RESPONSE_TYPE: &str = "code";

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

/// Validates an authorization request against the capability descriptor.
///
/// Until the client and its redirect URI are known to be registered, errors
/// are returned without redirect information. Once the redirect URI is
/// trusted, later failures redirect back to it with the request's `state`.
///
/// # Errors
///
/// Returns an `invalid_request` error describing the first mismatch.
pub fn validate_request_parameters(
    params: &AuthorizationRequest,
    descriptor: &CapabilityDescriptor,
) -> Result<(), OAuthError> {
    let client_id = non_empty(params.client_id.as_ref())
        .ok_or_else(|| OAuthError::invalid_request("Missing required parameter: client_id"))?;

    let client = descriptor.client(client_id).ok_or_else(|| {
        OAuthError::invalid_request(format!("Client '{client_id}' is not registered"))
    })?;

    let redirect_uri = non_empty(params.redirect_uri.as_ref())
        .ok_or_else(|| OAuthError::invalid_request("Missing required parameter: redirect_uri"))?;

    if !client.is_redirect_uri_allowed(redirect_uri) {
        return Err(OAuthError::invalid_request(
            "redirect_uri is not registered for this client",
        ));
    }

    // From here on the redirect URI is trusted.
    let redirect_error = |description: String| {
        OAuthError::with_redirect(
            OAuthErrorCode::InvalidRequest,
            description,
            redirect_uri,
            params.state.clone(),
        )
    };

    let response_type = non_empty(params.response_type.as_ref())
        .ok_or_else(|| redirect_error("Missing required parameter: response_type".to_string()))?;

    if response_type != CODE_RESPONSE_TYPE || !client.is_response_type_allowed(response_type) {
        return Err(redirect_error(format!(
            "Unsupported response_type '{response_type}'"
        )));
    }

    let scope = non_empty(params.scope.as_ref())
        .ok_or_else(|| redirect_error("Missing required parameter: scope".to_string()))?;

    if let Some(rejected) = scope
        .split_whitespace()
        .find(|requested| !client.is_scope_allowed(requested))
    {
        return Err(redirect_error(format!(
            "Scope '{rejected}' is not allowed for this client"
        )));
    }

    Ok(())
}

/// Validates a code exchange request against the session the code maps to.
///
/// `session` is the result of looking up the presented code; `None` means
/// the code is unknown (never issued, or already exchanged). Errors are
/// always direct, never redirects.
///
/// # Errors
///
/// - `unsupported_grant_type` for any grant other than `authorization_code`
/// - `invalid_request` when `code` or `redirect_uri` is missing
/// - `invalid_grant` for unknown, undecided, expired or mismatched codes
pub fn validate_exchange_request<'a>(
    params: &TokenRequest,
    session: Option<&'a OAuthSession>,
    now: OffsetDateTime,
) -> Result<&'a OAuthSession, OAuthError> {
    if let Some(grant_type) = params.grant_type.as_deref()
        && grant_type != AUTHORIZATION_CODE_GRANT
    {
        return Err(OAuthError::unsupported_grant_type(grant_type));
    }

    let code = non_empty(params.code.as_ref())
        .ok_or_else(|| OAuthError::invalid_request("Missing required parameter: code"))?;

    let redirect_uri = non_empty(params.redirect_uri.as_ref())
        .ok_or_else(|| OAuthError::invalid_request("Missing required parameter: redirect_uri"))?;

    let session = session.ok_or_else(|| OAuthError::invalid_grant("Invalid authorization code"))?;

    if session.authorization_granted != AuthorizationGrant::Granted
        || session.authorization_code.as_deref() != Some(code)
    {
        return Err(OAuthError::invalid_grant("Invalid authorization code"));
    }

    if session.is_authorization_code_expired(now) {
        return Err(OAuthError::invalid_grant("Authorization code expired"));
    }

    if session.redirect_uri != redirect_uri {
        return Err(OAuthError::invalid_grant(
            "redirect_uri does not match the authorization request",
        ));
    }

    if let Some(client_id) = params.client_id.as_deref()
        && client_id != session.client_id
    {
        return Err(OAuthError::invalid_grant(
            "Authorization code was issued to a different client",
        ));
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::session::NewOAuthSession;
    use crate::ocl::descriptor::RegisteredClient;
    use time::Duration;
    use uuid::Uuid;

    const REDIRECT_URI: &str = "https://client.example/cb";

    fn descriptor() -> CapabilityDescriptor {
        CapabilityDescriptor::new(vec![
            RegisteredClient::new("medmij-app")
                .with_redirect_uri(REDIRECT_URI)
                .with_scope("eenmalig_gegevens")
                .with_scope("profiel"),
        ])
    }

    fn request() -> AuthorizationRequest {
        AuthorizationRequest {
            response_type: Some("code".to_string()),
            client_id: Some("medmij-app".to_string()),
            redirect_uri: Some(REDIRECT_URI.to_string()),
            scope: Some("eenmalig_gegevens profiel".to_string()),
            state: Some("xyz".to_string()),
        }
    }

    fn granted_session(now: OffsetDateTime, expiration: OffsetDateTime) -> OAuthSession {
        let mut session = OAuthSession::from_new(
            Uuid::new_v4(),
            NewOAuthSession {
                response_type: "code".to_string(),
                client_id: "medmij-app".to_string(),
                redirect_uri: REDIRECT_URI.to_string(),
                scope: "eenmalig_gegevens".to_string(),
                state: Some("xyz".to_string()),
            },
            now,
        );
        session.authorization_granted = AuthorizationGrant::Granted;
        session.authorization_code = Some("abc123".to_string());
        session.authorization_code_expiration = Some(expiration);
        session
    }

    fn exchange() -> TokenRequest {
        TokenRequest::authorization_code("abc123", REDIRECT_URI)
    }

    // -------------------------------------------------------------------------
    // Authorization request
    // -------------------------------------------------------------------------

    #[test]
    fn test_valid_request() {
        assert!(validate_request_parameters(&request(), &descriptor()).is_ok());
    }

    #[test]
    fn test_unknown_client_does_not_redirect() {
        let mut params = request();
        params.client_id = Some("unknown".to_string());

        let err = validate_request_parameters(&params, &descriptor()).unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::InvalidRequest);
        assert!(!err.redirect);
        assert!(err.base_redirect_url.is_none());
    }

    #[test]
    fn test_unregistered_redirect_uri_does_not_redirect() {
        let mut params = request();
        params.redirect_uri = Some("https://evil.example/cb".to_string());

        let err = validate_request_parameters(&params, &descriptor()).unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::InvalidRequest);
        assert!(!err.redirect);
        assert!(err.redirect_url().is_none());
    }

    #[test]
    fn test_missing_redirect_uri_does_not_redirect() {
        let mut params = request();
        params.redirect_uri = None;

        let err = validate_request_parameters(&params, &descriptor()).unwrap_err();
        assert!(!err.redirect);
    }

    #[test]
    fn test_blank_client_id_is_missing() {
        let mut params = request();
        params.client_id = Some("  ".to_string());

        let err = validate_request_parameters(&params, &descriptor()).unwrap_err();
        assert!(err.description.contains("client_id"));
    }

    #[test]
    fn test_unsupported_response_type_redirects() {
        let mut params = request();
        params.response_type = Some("token".to_string());

        let err = validate_request_parameters(&params, &descriptor()).unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::InvalidRequest);
        assert!(err.redirect);
        assert_eq!(err.base_redirect_url.as_deref(), Some(REDIRECT_URI));
        assert_eq!(err.state.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_unsupported_scope_redirects() {
        let mut params = request();
        params.scope = Some("eenmalig_gegevens everything".to_string());

        let err = validate_request_parameters(&params, &descriptor()).unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::InvalidRequest);
        assert!(err.redirect);
        assert!(err.description.contains("everything"));
    }

    #[test]
    fn test_missing_scope_redirects() {
        let mut params = request();
        params.scope = None;

        let err = validate_request_parameters(&params, &descriptor()).unwrap_err();
        assert!(err.redirect);
        assert!(err.description.contains("scope"));
    }

    // -------------------------------------------------------------------------
    // Code exchange
    // -------------------------------------------------------------------------

    #[test]
    fn test_valid_exchange() {
        let now = OffsetDateTime::now_utc();
        let session = granted_session(now, now + Duration::minutes(10));

        let validated = validate_exchange_request(&exchange(), Some(&session), now).unwrap();
        assert_eq!(validated.id, session.id);
    }

    #[test]
    fn test_unknown_code() {
        let now = OffsetDateTime::now_utc();
        let err = validate_exchange_request(&exchange(), None, now).unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::InvalidGrant);
        assert!(!err.redirect);
    }

    #[test]
    fn test_expired_code_fails_even_if_everything_matches() {
        let now = OffsetDateTime::now_utc();
        let session = granted_session(now, now - Duration::seconds(1));

        let err = validate_exchange_request(&exchange(), Some(&session), now).unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::InvalidGrant);
        assert!(err.description.contains("expired"));
    }

    #[test]
    fn test_code_expiring_now_is_expired() {
        let now = OffsetDateTime::now_utc();
        let session = granted_session(now, now);
        assert!(validate_exchange_request(&exchange(), Some(&session), now).is_err());
    }

    #[test]
    fn test_redirect_uri_mismatch() {
        let now = OffsetDateTime::now_utc();
        let session = granted_session(now, now + Duration::minutes(10));
        let params = TokenRequest::authorization_code("abc123", "https://evil.example/cb");

        let err = validate_exchange_request(&params, Some(&session), now).unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::InvalidGrant);
        assert!(!err.redirect);
    }

    #[test]
    fn test_missing_redirect_uri() {
        let now = OffsetDateTime::now_utc();
        let session = granted_session(now, now + Duration::minutes(10));
        let mut params = exchange();
        params.redirect_uri = None;

        let err = validate_exchange_request(&params, Some(&session), now).unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::InvalidRequest);
    }

    #[test]
    fn test_missing_code() {
        let now = OffsetDateTime::now_utc();
        let mut params = exchange();
        params.code = None;

        let err = validate_exchange_request(&params, None, now).unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::InvalidRequest);
    }

    #[test]
    fn test_client_id_mismatch() {
        let now = OffsetDateTime::now_utc();
        let session = granted_session(now, now + Duration::minutes(10));
        let params = exchange().with_client_id("other-app");

        let err = validate_exchange_request(&params, Some(&session), now).unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::InvalidGrant);
    }

    #[test]
    fn test_unsupported_grant_type() {
        let now = OffsetDateTime::now_utc();
        let mut params = exchange();
        params.grant_type = Some("refresh_token".to_string());

        let err = validate_exchange_request(&params, None, now).unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::UnsupportedGrantType);
    }

    #[test]
    fn test_grant_type_may_be_omitted() {
        let now = OffsetDateTime::now_utc();
        let session = granted_session(now, now + Duration::minutes(10));
        let mut params = exchange();
        params.grant_type = None;

        assert!(validate_exchange_request(&params, Some(&session), now).is_ok());
    }

    #[test]
    fn test_cleared_code_fails() {
        let now = OffsetDateTime::now_utc();
        let mut session = granted_session(now, now + Duration::minutes(10));
        session.authorization_code = None;
        session.access_token = Some("token".to_string());

        let err = validate_exchange_request(&exchange(), Some(&session), now).unwrap_err();
        assert_eq!(err.code, OAuthErrorCode::InvalidGrant);
    }

    #[test]
    fn test_denied_session_fails() {
        let now = OffsetDateTime::now_utc();
        let mut session = granted_session(now, now + Duration::minutes(10));
        session.authorization_granted = AuthorizationGrant::Denied;

        assert!(validate_exchange_request(&exchange(), Some(&session), now).is_err());
    }
}
