//! Configuration for the reference server and the conformance check.
//!
//! Both structs are clap argument groups with environment fallbacks, so they
//! can be filled from the command line, from the environment, or built in code.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TODO_HOST` | 127.0.0.1 | Host to bind |
//! | `TODO_PORT` | 8000 | Port to listen on |
//! | `TODO_DB_PATH` | db | sled database directory |
//! | `TODO_DB_TEMPORARY` | false | Use a throwaway in-memory database |
//! | `TODO_PUBLIC_URL` | | Base of `Location` headers (defaults to `http://<Host>`) |
//! | `TODO_ENABLE_CORS` | true | Answer CORS preflights |
//! | `TODO_CORS_ORIGINS` | * | Allowed origins |
//! | `TODO_CORS_METHODS` | GET,POST,PUT,PATCH,DELETE,OPTIONS | Allowed methods |
//! | `TODO_CORS_HEADERS` | Content-Type,Accept | Allowed headers |
//! | `URL` | http://localhost:8000/todos | Collection endpoint checked by the suite |
//! | `TODO_CHECK_TIMEOUT` | | Per-request timeout of the suite, in seconds |

use std::time::Duration;

use clap::{ArgAction, Args};

/// Environment variable naming the collection endpoint under test.
pub const URL_ENV: &str = "URL";

/// Collection endpoint used when [`URL_ENV`] is unset.
pub const DEFAULT_URL: &str = "http://localhost:8000/todos";

/// The collection endpoint named by [`URL_ENV`], if any; empty counts as unset.
pub fn url_override() -> Option<String> {
    std::env::var(URL_ENV)
        .ok()
        .filter(|url| !url.trim().is_empty())
}

/// Settings of the reference Todo server.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[arg(long, env = "TODO_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, env = "TODO_PORT", default_value = "8000")]
    pub port: u16,

    /// Directory of the sled database.
    #[arg(long, env = "TODO_DB_PATH", default_value = "db")]
    pub db_path: String,

    /// Keep todos in a temporary database that is dropped on exit.
    #[arg(long, env = "TODO_DB_TEMPORARY")]
    pub temporary: bool,

    /// Base URL used in `Location` headers.
    #[arg(long, env = "TODO_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Answer CORS preflight requests.
    #[arg(long, env = "TODO_ENABLE_CORS", default_value_t = true, action = ArgAction::Set)]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "TODO_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(
        long,
        env = "TODO_CORS_METHODS",
        default_value = "GET,POST,PUT,PATCH,DELETE,OPTIONS"
    )]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(long, env = "TODO_CORS_HEADERS", default_value = "Content-Type,Accept")]
    pub cors_headers: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            db_path: "db".to_string(),
            temporary: false,
            public_url: None,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,PUT,PATCH,DELETE,OPTIONS".to_string(),
            cors_headers: "Content-Type,Accept".to_string(),
        }
    }
}

impl ServerConfig {
    /// In-memory database on an ephemeral port.
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            temporary: true,
            ..Default::default()
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Settings of a conformance run.
#[derive(Debug, Clone, Args)]
pub struct CheckConfig {
    /// Collection endpoint of the server under test.
    #[arg(long, env = "URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Origin sent with the CORS preflight.
    #[arg(long, default_value = "http://test.com")]
    pub origin: String,

    /// Per-request timeout in seconds; requests wait indefinitely when unset.
    #[arg(long, env = "TODO_CHECK_TIMEOUT")]
    pub timeout_secs: Option<u64>,
}

impl CheckConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
