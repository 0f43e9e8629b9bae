//! Test infrastructure for process authorization.
//!
//! Fixtures for organizations, identities and affiliations, and loaders for
//! the JSON resources under `tests/data`.

#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::*;
