//! HashiCorp Vault logical API client.
//!
//! Provides read/write/delete/list access to Vault logical paths with lease
//! metadata on every response. The [`Logical`] trait is the seam the provider
//! adapters are written against.

pub mod client;
pub mod config;
pub mod error;
pub mod logical;
pub mod secrets;

pub use client::VaultClient;
pub use config::VaultConfig;
pub use error::{VaultError, VaultResult};
pub use logical::Logical;
pub use secrets::{Lease, Secret, SecretAuth};
