/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use kanmind_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::postgres(pool, config);
/// let app = kanmind_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use kanmind_shared::{
    auth::{middleware::create_token_middleware, password::HashParams},
    services::accounts::AccountSettings,
    store::{postgres::PgStore, KanbanStore, TokenIssuer},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Persistence for users, boards, tasks and comments
    pub store: Arc<dyn KanbanStore>,

    /// Token issuance and resolution
    pub tokens: Arc<dyn TokenIssuer>,

    /// Hashing cost and password policy for registration
    pub accounts: Arc<AccountSettings>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn KanbanStore>, tokens: Arc<dyn TokenIssuer>, config: Config) -> Self {
        let accounts = AccountSettings {
            hash_params: HashParams::default(),
            password_policy: config.password.policy(),
        };

        Self {
            store,
            tokens,
            accounts: Arc::new(accounts),
            config: Arc::new(config),
        }
    }

    /// Creates state backed by PostgreSQL
    pub fn postgres(pool: PgPool, config: Config) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self::new(store.clone(), store, config)
    }

    /// Overrides the Argon2 cost parameters
    pub fn with_hash_params(mut self, hash_params: HashParams) -> Self {
        let mut accounts = (*self.accounts).clone();
        accounts.hash_params = hash_params;
        self.accounts = Arc::new(accounts);
        self
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                  # Health check (public)
/// └── /api/
///     ├── POST /registration/                  # public
///     ├── POST /login/                         # public
///     ├── GET|POST /boards/                    # token required from here on
///     ├── GET|PUT|PATCH|DELETE /boards/:id/
///     ├── GET /email-check/?email=
///     ├── POST /tasks/
///     ├── GET /tasks/assigned-to-me/
///     ├── GET /tasks/reviewing/
///     ├── GET|PUT|PATCH|DELETE /tasks/:id/
///     ├── GET|POST /tasks/:id/comments/
///     └── DELETE /tasks/:task_id/comments/:comment_id/
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Token authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/registration/", post(routes::auth::registration))
        .route("/login/", post(routes::auth::login));

    // Everything else requires a token
    let protected_routes = Router::new()
        .route(
            "/boards/",
            get(routes::boards::list_boards).post(routes::boards::create_board),
        )
        .route(
            "/boards/:board_id/",
            get(routes::boards::get_board)
                .put(routes::boards::replace_board)
                .patch(routes::boards::patch_board)
                .delete(routes::boards::delete_board),
        )
        .route("/email-check/", get(routes::users::email_check))
        .route("/tasks/", post(routes::tasks::create_task))
        .route("/tasks/assigned-to-me/", get(routes::tasks::assigned_to_me))
        .route("/tasks/reviewing/", get(routes::tasks::reviewing))
        .route(
            "/tasks/:task_id/",
            get(routes::tasks::get_task)
                .put(routes::tasks::replace_task)
                .patch(routes::tasks::patch_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/tasks/:task_id/comments/",
            get(routes::comments::list_comments).post(routes::comments::create_comment),
        )
        .route(
            "/tasks/:task_id/comments/:comment_id/",
            delete(routes::comments::delete_comment),
        )
        .layer(axum::middleware::from_fn(create_token_middleware(
            state.tokens.clone(),
        )));

    let api_routes = Router::new().merge(auth_routes).merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
