use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use gallery_backend::{
    object_store::S3ObjectStore,
    photos::{PhotoService, ResultCache},
    server::{self, AppContext},
    session::SessionManager,
    types::{Environment, PhotoConfig, SessionConfig, StorageConfig},
    users::PasswordHasher,
};
use gallery_storage::user::UserStorage;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env()?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // JSON logs for staging/production, plain text for development
    if environment.json_logs() {
        fmt().json().with_env_filter(env_filter).init();
    } else {
        fmt().with_env_filter(env_filter).init();
    }

    let storage_config = StorageConfig::from_env(environment)?;
    let photo_config = PhotoConfig::from_env()?;
    let session_manager = Arc::new(SessionManager::from_config(&SessionConfig::from_env()?)?);

    tracing::info!(?storage_config, ?photo_config, "Configuration loaded");

    let s3_client = Arc::new(S3Client::from_conf(
        storage_config.s3_client_config(&environment).await,
    ));
    let object_store = Arc::new(S3ObjectStore::new(
        s3_client,
        storage_config.bucket_name.clone(),
    ));
    let cache = ResultCache::with_sweeper(photo_config.cache_ttl, photo_config.sweep_interval);
    let photo_service = PhotoService::new(object_store, cache, photo_config.presign_ttl);

    let dynamodb_client = Arc::new(DynamoDbClient::new(&environment.aws_config().await));
    let users = Arc::new(UserStorage::new(
        dynamodb_client,
        environment.users_table_name()?,
        environment.users_id_index_name(),
    ));

    server::start(AppContext {
        environment,
        photo_service,
        users,
        session_manager,
        password_hasher: PasswordHasher::default(),
    })
    .await
}
