//! Response envelope types of the Vault logical API.

use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Response envelope returned by every logical operation that has a body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secret {
    /// Server-assigned request id
    #[serde(default)]
    pub request_id: String,
    /// Lease id, empty for non-leased data
    #[serde(default)]
    pub lease_id: String,
    /// Lease duration in seconds
    #[serde(default)]
    pub lease_duration: u64,
    /// Whether the lease can be renewed
    #[serde(default)]
    pub renewable: bool,
    /// Payload
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    /// Non-fatal warnings attached by the server
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
    /// Token information for login and token-create responses
    #[serde(default)]
    pub auth: Option<SecretAuth>,
}

/// Token information of an auth response.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretAuth {
    /// Newly issued token
    pub client_token: SecretString,
    /// Token accessor
    #[serde(default)]
    pub accessor: String,
    /// Attached policies
    #[serde(default)]
    pub policies: Vec<String>,
    /// Token TTL in seconds
    #[serde(default)]
    pub lease_duration: u64,
    /// Whether the token is renewable
    #[serde(default)]
    pub renewable: bool,
}

/// Lease metadata of a secret read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    /// Lease id, empty for non-leased data
    pub id: String,
    /// Lease duration in seconds
    pub duration: u64,
    /// Whether the lease can be renewed
    pub renewable: bool,
}

/// Error envelope of a failed request.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

impl Secret {
    /// Build a response carrying only `data`.
    #[must_use]
    pub fn from_data(data: Map<String, Value>) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// Payload map, empty when the response carried no data.
    #[must_use]
    pub fn data(&self) -> Map<String, Value> {
        self.data.clone().unwrap_or_default()
    }

    /// Consume the response and return its payload.
    #[must_use]
    pub fn into_data(self) -> Map<String, Value> {
        self.data.unwrap_or_default()
    }

    /// Lease metadata of this response.
    #[must_use]
    pub fn lease(&self) -> Lease {
        Lease {
            id: self.lease_id.clone(),
            duration: self.lease_duration,
            renewable: self.renewable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serde_json::json;

    #[test]
    fn test_parse_leased_secret() {
        let secret: Secret = serde_json::from_value(json!({
            "request_id": "5e2b",
            "lease_id": "database/creds/readonly/abc",
            "lease_duration": 3600,
            "renewable": true,
            "data": {"username": "v-token-readonly", "password": "p"},
            "warnings": null,
            "auth": null
        }))
        .unwrap();

        assert_eq!(
            secret.lease(),
            Lease {
                id: "database/creds/readonly/abc".to_string(),
                duration: 3600,
                renewable: true,
            }
        );
        assert_eq!(secret.data()["username"], "v-token-readonly");
        assert!(secret.auth.is_none());
    }

    #[test]
    fn test_parse_auth_response() {
        let secret: Secret = serde_json::from_value(json!({
            "auth": {
                "client_token": "hvs.child",
                "accessor": "acc",
                "policies": ["default"],
                "lease_duration": 1200,
                "renewable": false
            }
        }))
        .unwrap();

        let auth = secret.auth.unwrap();
        assert_eq!(auth.client_token.expose_secret(), "hvs.child");
        assert_eq!(auth.lease_duration, 1200);
        assert!(!format!("{auth:?}").contains("hvs.child"));
    }

    #[test]
    fn test_missing_data_is_empty() {
        let secret: Secret = serde_json::from_value(json!({"data": null})).unwrap();
        assert!(secret.data().is_empty());
        assert!(secret.into_data().is_empty());
    }
}
