mod error;
mod products;
mod users;

pub use error::{ApiError, ErrorCode, ErrorResponse};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Public user routes (registration and login hand out tokens)
    let public_user_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login));

    let protected_user_routes = Router::new()
        .route("/update", put(users::update))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_token,
        ));

    // Product routes (all protected)
    let product_routes = Router::new()
        .route("/", get(products::list))
        .route("/register", post(products::register))
        .route("/by-category", get(products::by_category))
        .route("/update", put(products::update))
        .route("/delete", delete(products::remove))
        .route("/top-by-category", get(products::top_by_category))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_token,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/users", public_user_routes.merge(protected_user_routes))
        .nest("/api/products", product_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Middleware guarding protected routes: the bearer token must carry a
/// valid signature and an unexpired `exp` before the handler runs.
async fn require_token(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match header {
        Some(header) => header.strip_prefix("Bearer ").unwrap_or(header),
        None => return Err(ApiError::unauthorized("Missing bearer token.")),
    };

    state.tokens.verify(token)?;
    Ok(next.run(request).await)
}
