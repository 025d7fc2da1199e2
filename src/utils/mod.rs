//! Shared utilities for error handling, security primitives, and validation.

pub mod error;
pub mod security;
pub mod validation;
