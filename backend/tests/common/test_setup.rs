use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use gallery_backend::{
    object_store::InMemoryObjectStore,
    photos::{PhotoService, ResultCache},
    server::{app, AppContext},
    session::SessionManager,
    types::{Environment, SessionConfig},
    users::{InMemoryUserRepository, PasswordHasher},
};
use serde_json::json;
use tower::ServiceExt;

use super::parse_response_body;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const CACHE_TTL: Duration = Duration::from_secs(300);
pub const PRESIGN_TTL: Duration = Duration::from_secs(3600);

/// Setup test environment variables and logging
pub fn setup_test_env() {
    dotenvy::from_path(".env.example").ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Router wired to in-memory storage
pub struct TestSetup {
    pub router: Router,
    pub store: Arc<InMemoryObjectStore>,
    pub users: Arc<InMemoryUserRepository>,
    pub cache: Arc<ResultCache>,
    pub session_manager: Arc<SessionManager>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self::with_environment(Environment::Development)
    }

    pub fn with_environment(environment: Environment) -> Self {
        setup_test_env();

        let store = Arc::new(InMemoryObjectStore::default());
        let users = Arc::new(InMemoryUserRepository::new());
        let cache = Arc::new(ResultCache::new(CACHE_TTL));
        let session_manager = Arc::new(
            SessionManager::from_config(&SessionConfig::Hs256 {
                secret: TEST_JWT_SECRET.to_string(),
            })
            .expect("Failed to create session manager"),
        );

        let router = app(AppContext {
            environment,
            photo_service: PhotoService::new(store.clone(), cache.clone(), PRESIGN_TTL),
            users: users.clone(),
            session_manager: session_manager.clone(),
            // Lowest bcrypt cost keeps the tests fast
            password_hasher: PasswordHasher::with_cost(4),
        });

        Self {
            router,
            store,
            users,
            cache,
            session_manager,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible")
    }

    pub async fn send_post_request(&self, route: &str, payload: serde_json::Value) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .expect("Failed to build request");

        self.send(request).await
    }

    pub async fn send_get_request(&self, route: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(route).method("GET");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        self.send(builder.body(Body::empty()).expect("Failed to build request"))
            .await
    }

    pub async fn send_get_request_with_cookie(&self, route: &str, cookie: &str) -> Response {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Signs up and signs in, returning the access token
    pub async fn sign_up_and_in(&self, email: &str, password: &str) -> String {
        let response = self
            .send_post_request("/signup", json!({ "email": email, "password": password }))
            .await;
        assert_eq!(response.status(), http::StatusCode::CREATED);

        let response = self
            .send_post_request("/signin", json!({ "email": email, "password": password }))
            .await;
        assert_eq!(response.status(), http::StatusCode::OK);

        parse_response_body(response).await["access_token"]
            .as_str()
            .expect("access_token missing")
            .to_string()
    }

    /// Token for an arbitrary subject, without a stored user
    pub fn token_for(&self, user_id: &str) -> String {
        self.session_manager
            .issue_token(user_id)
            .expect("Failed to issue token")
            .token
    }
}
