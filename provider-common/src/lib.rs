//! Shared library for cross-cutting concerns of the Vault provider crates.
//!
//! This crate provides centralized implementations for:
//! - Error types shared by configuration and transport layers
//! - HTTP client configuration and building
//! - Typed environment variable parsing
//! - Tracing subscriber initialisation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod error;
pub mod http;
pub mod tracing_config;

pub use env::{parse_env, parse_env_opt};
pub use error::PlatformError;
pub use http::{HttpConfig, build_http_client};
pub use tracing_config::{TracingConfig, init_tracing};
