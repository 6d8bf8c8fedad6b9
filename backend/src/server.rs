use std::{sync::Arc, time::Duration};

use aide::openapi::OpenApi;
use axum::{http::StatusCode, Extension, Router};
use tokio::net::TcpListener;
use tower_cookies::CookieManagerLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    photos::PhotoService,
    routes,
    session::SessionManager,
    types::Environment,
    users::{PasswordHasher, UserRepository},
};

/// Requests taking longer than this are answered with 408
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything the handlers receive as extensions
#[derive(Clone)]
pub struct AppContext {
    /// Deployment stage
    pub environment: Environment,
    /// Photo fetch service
    pub photo_service: PhotoService,
    /// User accounts
    pub users: Arc<dyn UserRepository>,
    /// Session token issuer and verifier
    pub session_manager: Arc<SessionManager>,
    /// Password hashing policy
    pub password_hasher: PasswordHasher,
}

/// Builds the application router with every layer attached
#[must_use]
pub fn app(context: AppContext) -> Router {
    let mut openapi = OpenApi::default();

    routes::handler()
        .finish_api(&mut openapi)
        .layer(Extension(openapi))
        .layer(Extension(context.environment))
        .layer(Extension(context.photo_service))
        .layer(Extension(context.users))
        .layer(Extension(context.session_manager))
        .layer(Extension(context.password_hasher))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
}

/// Starts the server with the given dependencies
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(context: AppContext) -> anyhow::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], context.environment.port()?));
    let router = app(context);

    let listener = TcpListener::bind(&addr).await?;
    info!("Gallery backend started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
