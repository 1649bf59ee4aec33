//! Vault resource and data-source adapters.
//!
//! Every resource kind declares a static [`Schema`] and implements
//! [`Resource`] (or [`DataSource`]) over one typed model struct. The
//! [`Provider`] registry wraps each kind in a dynamic adapter that validates
//! configuration, maps models to and from [`InstanceState`], and computes
//! plans.
//!
//! All remote calls go through the [`ProviderContext`] passed into every
//! operation; adapters keep no state of their own.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod body;
pub mod context;
pub mod data_sources;
pub mod error;
pub mod path;
pub mod provider;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod shim;
pub mod state;
pub mod token_fields;

pub use context::{ProviderConfig, ProviderContext};
pub use error::{Operation, ProviderError, ProviderResult};
pub use provider::{Provider, ProviderSchema};
pub use resource::{DataSource, DynamicDataSource, DynamicResource, Resource};
pub use schema::{AttrType, Attribute, Diagnostic, Diagnostics, Mode, Schema, Severity};
pub use state::{InstanceState, Plan};
