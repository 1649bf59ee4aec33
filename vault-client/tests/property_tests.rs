//! Property-based tests for Vault client.
//!
//! Tests validate:
//! - Tokens never appear in debug output of configuration or auth responses
//! - Logical paths map onto `/v1/<path>` regardless of leading slashes

use proptest::prelude::*;
use secrecy::ExposeSecret;
use serde_json::json;
use vault_client::{Logical, Secret, VaultClient, VaultConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Strategy for generating token values
fn token_strategy() -> impl Strategy<Value = String> {
    "hvs\\.[A-Za-z0-9]{24}"
}

// Strategy for generating logical paths without consecutive slashes
fn logical_path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z][a-z0-9_-]{1,10}", 1..5).prop_map(|segments| segments.join("/"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_token_not_exposed_in_config_debug(token in token_strategy()) {
        let config = VaultConfig::new("http://127.0.0.1:8200", token.clone());

        let debug_output = format!("{config:?}");
        prop_assert!(!debug_output.contains(&token), "Debug output should not contain token");

        let exposed = config.token.as_ref().map(|t| t.expose_secret().to_string());
        prop_assert_eq!(exposed, Some(token));
    }

    #[test]
    fn prop_client_token_not_exposed_in_auth_debug(token in token_strategy()) {
        let secret: Secret = serde_json::from_value(json!({
            "auth": {"client_token": token.clone(), "lease_duration": 60}
        })).unwrap();

        let debug_output = format!("{secret:?}");
        prop_assert!(!debug_output.contains(&token));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_leading_slash_is_ignored(logical in logical_path_strategy(), slash in any::<bool>()) {
        tokio_test::block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path(format!("/v1/{logical}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"ok": true}})))
                .mount(&server)
                .await;

            let client = VaultClient::new(VaultConfig::new(server.uri(), "t")).unwrap();
            let requested = if slash { format!("/{logical}") } else { logical.clone() };
            let secret = client.read(&requested).await.unwrap().unwrap();
            assert_eq!(secret.data()["ok"], true);
        });
    }
}
