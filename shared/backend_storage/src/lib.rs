//! Storage services for the gallery backend
//!
//! This crate holds the `DynamoDB`-backed user repository consumed by the
//! signup and signin handlers.

pub mod user;
