//! Shared test utilities for the Vault provider crates.
//!
//! This crate provides:
//! - [`MockVault`], an in-memory implementation of the logical API
//! - Proptest generators for paths, names, and attribute values
//! - Configuration fixtures for every resource kind

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use generators::*;
pub use mocks::{MockVault, RecordedRequest, RequestKind, WriteRule};
