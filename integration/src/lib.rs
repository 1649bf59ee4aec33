//! Harness shared by the cross-resource property tests.
//!
//! A [`Harness`] wires a [`Provider`] to an in-memory [`MockVault`] through a
//! [`ProviderContext`], the same way a configured provider talks to a server.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use provider_common::{TracingConfig, init_tracing};
use serde_json::{Map, Value};
use std::sync::Arc;
use test_utils::MockVault;
use vault_provider::state::values_equal;
use vault_provider::{DynamicResource, Provider, ProviderContext, ProviderResult, Schema};

/// Provider, context and backing store of one test.
#[derive(Debug)]
pub struct Harness {
    /// In-memory server
    pub vault: MockVault,
    /// Context handed to every operation
    pub ctx: ProviderContext,
    /// Registry of every kind
    pub provider: Provider,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// Harness over a fresh store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_vault(MockVault::new())
    }

    /// Harness over a prepared store.
    #[must_use]
    pub fn with_vault(vault: MockVault) -> Self {
        init_tracing(&TracingConfig::default().with_service_name("vault-provider-tests").with_log_level("warn"));
        Self {
            ctx: ProviderContext::new(Arc::new(vault.clone())),
            vault,
            provider: Provider::new(),
        }
    }

    /// Resource kind by type name.
    ///
    /// # Errors
    ///
    /// Returns an error for unregistered names.
    pub fn resource(&self, type_name: &str) -> ProviderResult<&dyn DynamicResource> {
        self.provider.resource(type_name)
    }
}

/// Configured attributes whose value in `state` differs from `config`.
///
/// Write-only attributes are skipped since they are never stored.
#[must_use]
pub fn mismatched_attributes(
    schema: &Schema,
    config: &Map<String, Value>,
    state: &Map<String, Value>,
) -> Vec<String> {
    config
        .iter()
        .filter_map(|(name, value)| {
            let attribute = schema.get(name)?;
            if attribute.write_only || values_equal(attribute.ty, Some(value), state.get(name)) {
                return None;
            }
            Some(name.clone())
        })
        .collect()
}

/// `state` without the listed attributes.
#[must_use]
pub fn without(state: &Map<String, Value>, ignore: &[&str]) -> Map<String, Value> {
    state
        .iter()
        .filter(|(name, _)| !ignore.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
