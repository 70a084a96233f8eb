use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::database::Database;

use super::handlers::{
    actor_by_id, actor_by_name, credits_by_id, credits_by_title, fallback, home,
    initialize_database, movie_by_decade, movie_by_id, movie_by_rating, movie_by_rating_range,
    movie_by_title, movie_by_year, random_movie,
};
use super::types::SERVER_ERROR_BODY;

#[derive(Clone)]
pub struct AppState {
    pub(crate) database: Arc<Database>,
}

impl AppState {
    pub fn new(database: Database) -> Self {
        Self {
            database: Arc::new(database),
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/database/initialize", get(initialize_database))
        .route("/movies", get(random_movie))
        .route("/movies/title/{title}", get(movie_by_title))
        .route("/movies/id/{id}", get(movie_by_id))
        .route("/movies/rating/{rating}", get(movie_by_rating))
        .route("/movies/rating/range/{range}", get(movie_by_rating_range))
        .route("/movies/year/{year}", get(movie_by_year))
        .route("/movies/decade/{year}", get(movie_by_decade))
        .route("/credits/title/{title}", get(credits_by_title))
        .route("/credits/id/{id}", get(credits_by_id))
        .route("/actors/name/{name}", get(actor_by_name))
        .route("/actors/id/{id}", get(actor_by_id))
        .method_not_allowed_fallback(fallback)
        .fallback(fallback)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = detail, "handler panicked");
    (StatusCode::OK, SERVER_ERROR_BODY).into_response()
}
