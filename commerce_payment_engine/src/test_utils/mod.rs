//! Helpers for tests in this crate and in crates that depend on it (enable the `test_utils` feature).
pub mod fixtures;
pub mod prepare_env;
pub mod stub_providers;
