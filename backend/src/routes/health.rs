use aide::axum::IntoApiResponse;
use axum::{Extension, Json};
use schemars::JsonSchema;
use serde::Serialize;

use crate::types::Environment;

#[derive(Debug, Serialize, JsonSchema)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests
    status: &'static str,
    /// Deployment stage the service was started in
    environment: &'static str,
    /// Crate version of the running binary
    version: &'static str,
    /// Commit the binary was built from, when `GIT_REV` was set at build time
    rev: Option<&'static str>,
}

/// Liveness probe
pub async fn handler(Extension(environment): Extension<Environment>) -> impl IntoApiResponse {
    Json(HealthResponse {
        status: "ok",
        environment: environment.as_str(),
        version: env!("CARGO_PKG_VERSION"),
        rev: option_env!("GIT_REV"),
    })
}
