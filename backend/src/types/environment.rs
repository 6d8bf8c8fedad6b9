//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};

use super::config::ConfigError;

/// Default port the HTTP server binds to
const DEFAULT_PORT: u16 = 8080;

/// Application environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable.
    /// Defaults to development when unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `APP_ENV` contains an unknown value
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            _ => Err(ConfigError::Invalid {
                name: "APP_ENV",
                reason: format!("unknown environment {env}"),
            }),
        }
    }

    /// Lowercase name as accepted in `APP_ENV`
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Development => "development",
        }
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development | Self::Staging)
    }

    /// Whether logs are emitted as JSON
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// Name of the `DynamoDB` table holding users
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` outside development when `USERS_TABLE_NAME` is unset
    pub fn users_table_name(&self) -> Result<String, ConfigError> {
        match self {
            Self::Production | Self::Staging => {
                env::var("USERS_TABLE_NAME").map_err(|_| ConfigError::Missing("USERS_TABLE_NAME"))
            }
            Self::Development => {
                Ok(env::var("USERS_TABLE_NAME").unwrap_or_else(|_| "gallery-users".to_string()))
            }
        }
    }

    /// Name of the users table index keyed by user id
    #[must_use]
    pub fn users_id_index_name(&self) -> String {
        env::var("USERS_ID_INDEX_NAME").unwrap_or_else(|_| "id-index".to_string())
    }

    /// Port the HTTP server listens on
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `PORT` is not a valid port number
    pub fn port(&self) -> Result<u16, ConfigError> {
        env::var("PORT").map_or(Ok(DEFAULT_PORT), |port| {
            port.trim().parse().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: format!("{e}"),
            })
        })
    }
}
