//! Shared proptest generators for the provider crates.
//!
//! Values are shaped the way the server accepts them: path segments without
//! slashes, policy names, TTLs in seconds, and string sets.

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Generate a single path segment.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}"
}

/// Generate mount paths of one to three segments.
pub fn mount_path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(segment_strategy(), 1..=3).prop_map(|segments| segments.join("/"))
}

/// Generate secret names, possibly nested.
pub fn secret_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,20}(/[a-z][a-z0-9-]{0,20}){0,3}"
}

/// Generate valid policy names.
pub fn policy_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{2,20}"
}

/// Generate sets of policy names.
pub fn policy_set_strategy() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(policy_name_strategy(), 0..5)
}

/// Generate CIDR blocks.
pub fn cidr_strategy() -> impl Strategy<Value = String> {
    (1u8..=223, 0u8..=255, 0u8..=255, prop_oneof![Just(8u8), Just(16u8), Just(24u8), Just(32u8)])
        .prop_map(|(a, b, c, bits)| format!("{a}.{b}.{c}.0/{bits}"))
}

/// Generate TTL values in seconds (1 minute to 24 hours).
pub fn ttl_seconds_strategy() -> impl Strategy<Value = i64> {
    60i64..86_400
}

/// Generate flat secret payloads with string values.
pub fn secret_data_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z][a-z0-9_]{0,10}", "[ -~]{0,24}", 0..6)
}

/// Generate token types accepted by auth roles.
pub fn token_type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("default".to_string()),
        Just("service".to_string()),
        Just("batch".to_string()),
        Just("default-service".to_string()),
        Just("default-batch".to_string()),
    ]
}

/// Generate secrets engine types that can be mounted.
pub fn mount_type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("kv".to_string()),
        Just("kv-v2".to_string()),
        Just("transit".to_string()),
        Just("pki".to_string()),
        Just("database".to_string()),
    ]
}
