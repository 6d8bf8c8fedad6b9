//! Startup configuration read once from the process environment

use std::env;
use std::fmt;
use std::time::Duration;

use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use thiserror::Error;

use super::Environment;

/// Errors raised while reading configuration. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but its value is unusable
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// What is wrong with the value
        reason: String,
    },
}

/// Reads an optional variable, treating blank values as unset
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    optional_var(name).ok_or(ConfigError::Missing(name))
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    optional_var(name).map_or(Ok(default), |value| {
        match value.to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid {
                name,
                reason: format!("expected a boolean, got {value}"),
            }),
        }
    })
}

fn parse_secs(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    let secs = optional_var(name).map_or(Ok(default), |value| {
        value.parse::<u64>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
    })?;

    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }

    Ok(Duration::from_secs(secs))
}

/// Object storage settings
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Bucket holding every user namespace
    pub bucket_name: String,
    /// Region override; the AWS default chain is used when unset
    pub region: Option<String>,
    /// Custom endpoint, e.g. `LocalStack` or another S3 compatible store
    pub endpoint_url: Option<String>,
    /// Static access key id and secret
    pub credentials: Option<(String, String)>,
    /// Use path style addressing (`endpoint/bucket/key`)
    pub force_path_style: bool,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("static_credentials", &self.credentials.is_some())
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

impl StorageConfig {
    /// Reads the storage configuration.
    ///
    /// Development defaults to the `LocalStack` endpoint with path style
    /// addressing and a local bucket name.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Missing` - bucket name unset outside development, or only one
    ///   half of the static credentials is set
    /// - `ConfigError::Invalid` - `S3_FORCE_PATH_STYLE` is not a boolean
    pub fn from_env(environment: Environment) -> Result<Self, ConfigError> {
        let development = environment == Environment::Development;

        let bucket_name = if development {
            optional_var("S3_BUCKET_NAME").unwrap_or_else(|| "gallery-photos".to_string())
        } else {
            required_var("S3_BUCKET_NAME")?
        };

        let endpoint_url = optional_var("S3_ENDPOINT_URL").or_else(|| {
            environment
                .override_aws_endpoint_url()
                .map(ToString::to_string)
        });

        let credentials = match (
            optional_var("S3_ACCESS_KEY_ID"),
            optional_var("S3_SECRET_ACCESS_KEY"),
        ) {
            (Some(key_id), Some(secret)) => Some((key_id, secret)),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("S3_SECRET_ACCESS_KEY")),
            (None, Some(_)) => return Err(ConfigError::Missing("S3_ACCESS_KEY_ID")),
        };

        Ok(Self {
            bucket_name,
            region: optional_var("S3_REGION"),
            endpoint_url,
            credentials,
            force_path_style: parse_bool("S3_FORCE_PATH_STYLE", development)?,
        })
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self, environment: &Environment) -> aws_sdk_s3::Config {
        let aws_config = environment.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        if let Some(region) = &self.region {
            builder.set_region(Some(Region::new(region.clone())));
        }

        if let Some(endpoint_url) = &self.endpoint_url {
            builder.set_endpoint_url(Some(endpoint_url.clone()));
        }

        if let Some((key_id, secret)) = &self.credentials {
            builder = builder.credentials_provider(Credentials::from_keys(
                key_id.clone(),
                secret.clone(),
                None,
            ));
        }

        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        builder.set_force_path_style(Some(self.force_path_style));

        builder.build()
    }
}

/// Photo cache and presigning lifetimes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoConfig {
    /// How long a fetched result is served from the cache
    pub cache_ttl: Duration,
    /// How often expired cache entries are purged
    pub sweep_interval: Duration,
    /// Lifetime of presigned URLs
    pub presign_ttl: Duration,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
            presign_ttl: Duration::from_secs(60 * 60),
        }
    }
}

impl PhotoConfig {
    /// Reads the photo configuration, falling back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for non numeric or zero durations, or when
    /// the durations are inconsistent (see [`PhotoConfig::validated`]).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Self {
            cache_ttl: parse_secs("PHOTO_CACHE_TTL_SECS", defaults.cache_ttl.as_secs())?,
            sweep_interval: parse_secs(
                "PHOTO_CACHE_SWEEP_SECS",
                defaults.sweep_interval.as_secs(),
            )?,
            presign_ttl: parse_secs("PHOTO_PRESIGN_TTL_SECS", defaults.presign_ttl.as_secs())?,
        }
        .validated()
    }

    /// Checks that a cached URL can never outlive its signature and that the
    /// sweep runs less often than entries expire
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `presign_ttl <= cache_ttl` or
    /// `sweep_interval <= cache_ttl`
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.sweep_interval <= self.cache_ttl {
            return Err(ConfigError::Invalid {
                name: "PHOTO_CACHE_SWEEP_SECS",
                reason: format!(
                    "sweep interval ({}s) must be longer than the photo cache TTL ({}s)",
                    self.sweep_interval.as_secs(),
                    self.cache_ttl.as_secs()
                ),
            });
        }

        if self.presign_ttl <= self.cache_ttl {
            return Err(ConfigError::Invalid {
                name: "PHOTO_PRESIGN_TTL_SECS",
                reason: format!(
                    "presigned URLs ({}s) must outlive the photo cache ({}s)",
                    self.presign_ttl.as_secs(),
                    self.cache_ttl.as_secs()
                ),
            });
        }

        Ok(self)
    }
}

/// Key material for signing session tokens
#[derive(Clone, PartialEq, Eq)]
pub enum SessionConfig {
    /// HMAC SHA-256 with a shared secret
    Hs256 {
        /// Shared secret
        secret: String,
    },
    /// RSA SHA-256 with a PEM encoded key pair
    Rs256 {
        /// PKCS#1 or PKCS#8 private key
        private_key_pem: String,
        /// Matching public key
        public_key_pem: String,
    },
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hs256 { .. } => f.write_str("SessionConfig::Hs256"),
            Self::Rs256 { .. } => f.write_str("SessionConfig::Rs256"),
        }
    }
}

impl SessionConfig {
    /// Reads the session key material selected by `JWT_ALGORITHM` (HS256 by default).
    ///
    /// PEM values may use literal `\n` sequences in place of newlines.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Missing` - key material for the selected algorithm is unset
    /// - `ConfigError::Invalid` - unknown algorithm
    pub fn from_env() -> Result<Self, ConfigError> {
        let algorithm = optional_var("JWT_ALGORITHM").unwrap_or_else(|| "HS256".to_string());

        match algorithm.to_uppercase().as_str() {
            "HS256" => Ok(Self::Hs256 {
                secret: required_var("JWT_SECRET")?,
            }),
            "RS256" => Ok(Self::Rs256 {
                private_key_pem: required_var("JWT_PRIVATE_KEY_PEM")?.replace("\\n", "\n"),
                public_key_pem: required_var("JWT_PUBLIC_KEY_PEM")?.replace("\\n", "\n"),
            }),
            _ => Err(ConfigError::Invalid {
                name: "JWT_ALGORITHM",
                reason: format!("unsupported algorithm {algorithm}"),
            }),
        }
    }
}
