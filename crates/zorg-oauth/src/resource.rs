//! Resource availability check.
//!
//! Whether the requested resources exist for the end-user is a business
//! question answered outside the protocol logic. The server only merges the
//! subject identifier into the client data and asks the injected predicate.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::AuthResult;

/// Key under which the subject identifier is merged into [`ClientData`].
pub const SUBJECT_KEY: &str = "bsn";

/// Free-form data passed to the availability predicate.
pub type ClientData = Map<String, Value>;

/// External predicate deciding whether resources are available.
#[async_trait]
pub trait ResourceAvailability: Send + Sync {
    /// Returns `true` if resources are available for `client_data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the check itself could not be performed.
    async fn zg_resource_available(&self, client_data: &ClientData) -> AuthResult<bool>;
}

/// Adapts a synchronous closure into a [`ResourceAvailability`].
pub struct FnResourceAvailability<F> {
    predicate: F,
}

impl<F> FnResourceAvailability<F>
where
    F: Fn(&ClientData) -> bool + Send + Sync,
{
    /// Wraps `predicate`.
    #[must_use]
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

#[async_trait]
impl<F> ResourceAvailability for FnResourceAvailability<F>
where
    F: Fn(&ClientData) -> bool + Send + Sync,
{
    async fn zg_resource_available(&self, client_data: &ClientData) -> AuthResult<bool> {
        Ok((self.predicate)(client_data))
    }
}

/// Returns `client_data` with the subject identifier merged in.
///
/// An unbound session contributes `null`, so the predicate can tell an
/// anonymous check apart from a missing key.
#[must_use]
pub fn merge_subject(mut client_data: ClientData, subject: Option<&str>) -> ClientData {
    let value = subject.map_or(Value::Null, |bsn| Value::String(bsn.to_string()));
    client_data.insert(SUBJECT_KEY.to_string(), value);
    client_data
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_subject_overrides_caller_value() {
        let mut data = ClientData::new();
        data.insert("bsn".to_string(), json!("spoofed"));
        data.insert("resource".to_string(), json!("medication"));

        let merged = merge_subject(data, Some("999993653"));
        assert_eq!(merged["bsn"], json!("999993653"));
        assert_eq!(merged["resource"], json!("medication"));
    }

    #[test]
    fn test_merge_unbound_subject_is_null() {
        let merged = merge_subject(ClientData::new(), None);
        assert_eq!(merged["bsn"], Value::Null);
    }

    #[tokio::test]
    async fn test_fn_adapter() {
        let check = FnResourceAvailability::new(|data: &ClientData| {
            data.get(SUBJECT_KEY).and_then(Value::as_str) == Some("999993653")
        });

        let yes = merge_subject(ClientData::new(), Some("999993653"));
        let no = merge_subject(ClientData::new(), Some("123"));
        assert!(check.zg_resource_available(&yes).await.unwrap());
        assert!(!check.zg_resource_available(&no).await.unwrap());
    }
}
