//! Capability descriptor (OCL) types.
//!
//! The descriptor is an externally published document that lists which
//! clients are currently registered, with their redirect URIs, scopes and
//! response types. Authorization requests are validated against it.
//!
//! # Example (JSON)
//!
//! ```json
//! {
//!   "clients": [{
//!     "client_id": "medmij-app",
//!     "name": "Example PGO",
//!     "redirect_uris": ["https://client.example/cb"],
//!     "scopes": ["eenmalig_gegevens"]
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::AuthResult;
use crate::error::AuthError;

fn default_response_types() -> Vec<String> {
    vec!["code".to_string()]
}

fn default_active() -> bool {
    true
}

/// A client entry of the capability descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredClient {
    /// Client identifier.
    pub client_id: String,

    /// Display name shown on the consent screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Registered redirect URIs. Matched exactly.
    #[serde(default)]
    pub redirect_uris: Vec<String>,

    /// Scopes the client may request. An empty list allows none.
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Response types the client may use.
    #[serde(default = "default_response_types")]
    pub response_types: Vec<String>,

    /// Inactive clients are treated as unregistered.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl RegisteredClient {
    /// Creates an active client accepting the `code` response type.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            name: None,
            redirect_uris: Vec::new(),
            scopes: Vec::new(),
            response_types: default_response_types(),
            active: true,
        }
    }

    /// Adds a redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uris.push(uri.into());
        self
    }

    /// Adds a scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Checks if the redirect URI is registered for this client.
    ///
    /// Only exact matches count; no prefix or query relaxation.
    #[must_use]
    pub fn is_redirect_uri_allowed(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|allowed| allowed == uri)
    }

    /// Checks if a single scope is allowed for this client.
    #[must_use]
    pub fn is_scope_allowed(&self, scope: &str) -> bool {
        self.scopes.iter().any(|allowed| allowed == scope)
    }

    /// Checks if the response type is allowed for this client.
    #[must_use]
    pub fn is_response_type_allowed(&self, response_type: &str) -> bool {
        self.response_types.iter().any(|allowed| allowed == response_type)
    }
}

/// The currently valid set of client registrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Registered clients.
    #[serde(default)]
    pub clients: Vec<RegisteredClient>,
}

impl CapabilityDescriptor {
    /// Creates a descriptor from a list of clients.
    #[must_use]
    pub fn new(clients: Vec<RegisteredClient>) -> Self {
        Self { clients }
    }

    /// Parses a descriptor from its JSON representation.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the document is malformed.
    pub fn from_json(json: &str) -> AuthResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AuthError::configuration(format!("invalid capability descriptor: {e}")))
    }

    /// Finds an active client by id.
    #[must_use]
    pub fn client(&self, client_id: &str) -> Option<&RegisteredClient> {
        self.clients
            .iter()
            .find(|c| c.active && c.client_id == client_id)
    }
}
