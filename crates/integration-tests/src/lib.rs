//! Shared helpers for the end-to-end test suite.

pub mod common;

pub use common::*;
