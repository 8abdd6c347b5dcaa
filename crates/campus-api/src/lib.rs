pub mod classes;
pub mod error;
pub mod middleware;
pub mod students;
pub mod teachers;
pub mod token;
pub mod users;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use tower_http::services::ServeDir;

use campus_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// Symmetric token-signing secret, loaded once at startup.
    pub jwt_secret: String,
    pub upload_dir: PathBuf,
}

/// Assembles the versioned API plus the static avatar file service.
/// CORS and request tracing are layered on by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/users", post(users::register))
        .route("/sessions", post(users::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/me", get(users::me))
        .route(
            "/me/avatar",
            patch(users::update_avatar).layer(DefaultBodyLimit::max(users::AVATAR_BODY_LIMIT)),
        )
        .route("/teachers", get(teachers::list).post(teachers::create))
        .route(
            "/teachers/{id}",
            get(teachers::fetch).put(teachers::update).delete(teachers::remove),
        )
        .route("/students", get(students::list).post(students::create))
        .route(
            "/students/{id}",
            get(students::fetch).put(students::update).delete(students::remove),
        )
        .route("/classes", get(classes::list).post(classes::create))
        .route(
            "/classes/{id}",
            get(classes::fetch).put(classes::update).delete(classes::remove),
        )
        .route("/classes/{id}/students", get(classes::roster))
        .route(
            "/classes/{id}/student",
            patch(classes::add_students).delete(classes::remove_students),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", public_routes.merge(protected_routes))
        .nest_service("/files", ServeDir::new(&state.upload_dir))
}
