//! Read-only data source kinds.
//!
//! Unlike resources, a data source whose object does not exist fails with
//! [`crate::ProviderError::NotFound`].

pub mod approle_auth_backend_role_id;
pub mod auth_backend;
pub mod generic_secret;
pub mod kv_secret_v2;

pub use approle_auth_backend_role_id::{AppRoleAuthBackendRoleId, AppRoleAuthBackendRoleIdDataSource};
pub use auth_backend::AuthBackendDataSource;
pub use generic_secret::{GenericSecretData, GenericSecretDataSource};
pub use kv_secret_v2::{KvSecretV2Data, KvSecretV2DataSource};
