//! Managed resource kinds.

pub mod approle_auth_backend_role;
pub mod auth_backend;
pub mod aws_auth_backend_role;
pub mod generic_secret;
pub mod identity_group;
pub mod identity_group_policies;
pub mod kv_secret_v2;
pub mod ldap_auth_backend_group;
pub mod mount;
pub mod policy;
pub mod transit_secret_backend_key;

pub use approle_auth_backend_role::{AppRoleAuthBackendRole, AppRoleAuthBackendRoleResource};
pub use auth_backend::{AuthBackend, AuthBackendResource};
pub use aws_auth_backend_role::{AwsAuthBackendRole, AwsAuthBackendRoleResource};
pub use generic_secret::{GenericSecret, GenericSecretResource};
pub use identity_group::{IdentityGroup, IdentityGroupResource};
pub use identity_group_policies::{IdentityGroupPolicies, IdentityGroupPoliciesResource};
pub use kv_secret_v2::{KvSecretV2, KvSecretV2Resource};
pub use ldap_auth_backend_group::{LdapAuthBackendGroup, LdapAuthBackendGroupResource};
pub use mount::{Mount, MountResource};
pub use policy::{Policy, PolicyResource};
pub use transit_secret_backend_key::{TransitSecretBackendKey, TransitSecretBackendKeyResource};
