mod config;
mod environment;
mod error;

pub use config::{ConfigError, PhotoConfig, SessionConfig, StorageConfig};
pub use environment::Environment;
pub use error::{ApiErrorResponse, AppError};
