//! Photo gallery backend service

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

/// Session authentication middleware
pub mod middleware;

/// Object storage abstraction over S3
pub mod object_store;

/// Recent-photo retrieval, presigning and caching
pub mod photos;

/// HTTP routes
pub mod routes;

/// Server setup and lifecycle
pub mod server;

/// Session tokens
pub mod session;

/// Configuration and API error types
pub mod types;

/// User accounts and password hashing
pub mod users;
