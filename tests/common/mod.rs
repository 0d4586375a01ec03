//! Shared fixtures: a reference server on an ephemeral port, or the external
//! server named by `URL`.
#![allow(dead_code)]

use axum::Router;
use todo_api::{
    app::{self, AppState},
    client::TodoClient,
    config::{url_override, ServerConfig},
};
use tokio::{
    net::TcpListener,
    sync::{Mutex, MutexGuard},
    task::JoinHandle,
};

// collection-wide teardowns must not interleave on a shared external server
static EXTERNAL: Mutex<()> = Mutex::const_new(());

/// A running reference server, stopped when dropped.
pub struct TestServer {
    pub base: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(config: ServerConfig) -> Self {
        let state = AppState::from_config(&config).expect("open temporary db");
        Self::with_router(app::router(state, &config)).await
    }

    pub async fn with_router(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            handle,
        }
    }

    pub fn todos_url(&self) -> String {
        format!("{}/todos", self.base)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Where a conformance test sends its requests.
pub struct Target {
    pub url: String,
    pub client: TodoClient,
    _server: Option<TestServer>,
    _guard: Option<MutexGuard<'static, ()>>,
}

impl Target {
    /// Uses `URL` when set, otherwise starts a private reference server.
    pub async fn acquire() -> Self {
        let client = TodoClient::new(None).expect("build http client");
        match url_override() {
            Some(url) => Self {
                url,
                client,
                _server: None,
                _guard: Some(EXTERNAL.lock().await),
            },
            None => {
                let server = TestServer::start(ServerConfig::for_testing()).await;
                Self {
                    url: server.todos_url(),
                    client,
                    _server: Some(server),
                    _guard: None,
                }
            }
        }
    }

    /// Creates a todo and returns its `Location`.
    pub async fn seed(&self, title: &str) -> String {
        let created = self
            .client
            .post(&self.url, &todo_api::models::NewTodo::new(title))
            .await
            .expect("seed todo");
        created.location().expect("location header").to_string()
    }

    /// Clears the collection.
    pub async fn teardown(&self) {
        self.client.del(&self.url).await.expect("clear todos");
    }
}
