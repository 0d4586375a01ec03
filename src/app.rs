use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tokio::{
    net::TcpListener,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::db::Db;
use crate::error::AppError;
use crate::models::{NewTodo, Todo, TodoUpdate};
use crate::repository::TodoRepository;

// === App State ===
#[derive(Debug, Clone)]
pub struct AppState {
    state: Arc<RwLock<TodoRepository>>,
    public_url: Option<Arc<str>>,
}
impl AppState {
    pub fn new(repository: TodoRepository, public_url: Option<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(repository)),
            public_url: public_url.map(|url| Arc::from(url.trim_end_matches('/'))),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let db = if config.temporary {
            Db::temporary()?
        } else {
            Db::open(&config.db_path)?
        };
        Ok(Self::new(TodoRepository::new(db), config.public_url.clone()))
    }

    // borrow immutable state
    async fn read(&self) -> RwLockReadGuard<'_, TodoRepository> {
        self.state.read().await
    }
    // borrow mutable state
    async fn write(&self) -> RwLockWriteGuard<'_, TodoRepository> {
        self.state.write().await
    }

    /// Writes pending changes to disk.
    pub async fn flush(&self) -> Result<()> {
        self.read().await.flush()
    }

    // absolute URL of a single todo
    fn location(&self, headers: &HeaderMap, id: u64) -> String {
        let base = match &self.public_url {
            Some(url) => url.to_string(),
            None => {
                let host = headers
                    .get(header::HOST)
                    .and_then(|host| host.to_str().ok())
                    .unwrap_or("localhost");
                format!("http://{host}")
            }
        };
        format!("{base}/todos/{id}")
    }
}

/// Builds the Todo API router, with CORS when enabled.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route(
            "/todos",
            get(list_todos).post(create_todo).delete(clear_todos),
        )
        .route(
            "/todos/:id",
            get(get_todo)
                .put(update_todo)
                .patch(update_todo)
                .delete(delete_todo),
        )
        .with_state(state);

    let router = if config.enable_cors {
        router.layer(cors_layer(config))
    } else {
        router
    };
    router.layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    if config.cors_origins.trim() == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = split_list(&config.cors_origins)
            .filter_map(|s| s.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    if config.cors_methods.trim() == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<Method> = split_list(&config.cors_methods)
            .filter_map(|s| s.parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    if config.cors_headers.trim() == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<HeaderName> = split_list(&config.cors_headers)
            .filter_map(|s| s.parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Binds the configured address and serves until ctrl-c, then flushes the database.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let app = router(state.clone(), &config);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "todo api listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down, flushing todos");
    state.flush().await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
    }
}

// === Routes ===
async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, AppError> {
    let repository = state.read().await;
    Ok(Json(repository.list()?))
}

async fn create_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new): Json<NewTodo>,
) -> Result<impl IntoResponse, AppError> {
    let todo = state.write().await.create(new)?;
    let location = state.location(&headers, todo.id);
    debug!(id = todo.id, %location, "created todo");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(todo),
    ))
}

async fn clear_todos(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let removed = state.write().await.clear()?;
    debug!(removed, "cleared todos");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Todo>, AppError> {
    let repository = state.read().await;
    repository
        .find(id)?
        .map(Json)
        .ok_or(AppError::NotFound(id))
}

// PUT and PATCH share merge semantics
async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(update): Json<TodoUpdate>,
) -> Result<Json<Todo>, AppError> {
    let repository = state.write().await;
    repository
        .update(id, update)?
        .map(Json)
        .ok_or(AppError::NotFound(id))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    if state.write().await.delete(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(public_url: Option<&str>) -> AppState {
        let repository = TodoRepository::new(Db::temporary().unwrap());
        AppState::new(repository, public_url.map(str::to_string))
    }

    #[test]
    fn test_location_uses_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "127.0.0.1:4000".parse().unwrap());
        assert_eq!(
            state(None).location(&headers, 5),
            "http://127.0.0.1:4000/todos/5"
        );
    }

    #[test]
    fn test_location_prefers_public_url() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "internal:8000".parse().unwrap());
        assert_eq!(
            state(Some("https://todos.example.com/")).location(&headers, 9),
            "https://todos.example.com/todos/9"
        );
    }

    #[tokio::test]
    async fn test_flush_on_temporary_state() {
        state(None).flush().await.unwrap();
    }

    #[test]
    fn test_split_list_trims_and_skips_empty() {
        let parts: Vec<_> = split_list(" GET, POST,,PATCH ").collect();
        assert_eq!(parts, ["GET", "POST", "PATCH"]);
    }
}
