//! Conformance suite for Todo REST APIs, plus a reference server that passes it.
//!
//! [`client`] and [`suite`] talk to any server exposing a `/todos` collection.
//! [`app`] is the reference server: axum routes over a sled-backed
//! [`repository`].

pub mod app;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod suite;

/// Initializes the tracing subscriber; `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("todo_api={level},tower_http={level}"))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
