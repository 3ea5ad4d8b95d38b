use crate::config::Config;
use crate::cors::{self, AllowedOrigins};
use crate::models::Movie;
use crate::store::{load_movies, InMemoryMovies, MovieRepository};
use crate::validation::{validate_movie, validate_partial_movie, ValidationErrors};
use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

const MAX_BODY_BYTES: usize = 100 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub movies: Arc<dyn MovieRepository>,
    pub allowed_origins: AllowedOrigins,
}

impl AppState {
    pub fn new(movies: Arc<dyn MovieRepository>, config: &Config) -> Self {
        Self {
            movies,
            allowed_origins: AllowedOrigins::new(&config.allowed_origins),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationErrors),
    NotFound,
    Internal(anyhow::Error),
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        ApiError::Validation(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": errors }))).into_response()
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Movie not found" })),
            )
                .into_response(),
            ApiError::Internal(err) => {
                error!("Request failed: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let movies = load_movies(config.movies_file.as_deref()).await?;
    let repo: Arc<dyn MovieRepository> = Arc::new(InMemoryMovies::new(movies));
    let state = AppState::new(repo, &config);

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://localhost:{}", config.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let allowed = state.allowed_origins.clone();
    let router = Router::new()
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/", get(list_movies).post(create_movie))
        .route(
            "/movies/:id",
            get(get_movie).patch(update_movie).delete(delete_movie),
        )
        .route("/health", get(health))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state);
    cors::apply(router, allowed).layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "OK"
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    // A repeated `genre` key filters by its first occurrence.
    let genre = params
        .iter()
        .find(|(key, _)| key == "genre")
        .map(|(_, value)| value.as_str())
        .filter(|g| !g.is_empty());
    let movies = state.movies.list(genre).await?;
    debug!("Listing {} movies (genre={:?})", movies.len(), genre);
    Ok(Json(movies))
}

async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Movie>, ApiError> {
    state
        .movies
        .get(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn create_movie(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Movie>), ApiError> {
    let payload = parse_json_body(&headers, &body)?;
    let new_movie = validate_movie(&payload).map_err(|e| {
        warn!("Rejected movie creation: {}", e);
        e
    })?;
    let movie = state.movies.create(new_movie).await?;
    info!("Created movie '{}' ({})", movie.title, movie.id);
    Ok((StatusCode::CREATED, Json(movie)))
}

async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Movie>, ApiError> {
    let payload = parse_json_body(&headers, &body)?;
    let patch = validate_partial_movie(&payload).map_err(|e| {
        warn!("Rejected update for {}: {}", id, e);
        e
    })?;
    let movie = state
        .movies
        .update(&id, patch)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!("Updated movie '{}' ({})", movie.title, movie.id);
    Ok(Json(movie))
}

async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state.movies.delete(&id).await?.ok_or(ApiError::NotFound)?;
    info!("Deleted movie '{}' ({})", removed.title, removed.id);
    Ok(StatusCode::NO_CONTENT)
}

fn parse_json_body(headers: &HeaderMap, body: &[u8]) -> Result<Value, ValidationErrors> {
    let content_type_ok = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().starts_with("application/json"))
        == Some(true);
    if !content_type_ok {
        return Err(ValidationErrors::single(
            "body",
            "Content-Type must be application/json",
        ));
    }
    serde_json::from_slice(body)
        .map_err(|e| ValidationErrors::single("body", format!("must be valid JSON: {}", e)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
