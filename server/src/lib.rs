//! HTTP and WebSocket server for the CineRate live rating system.
//!
//! Wires the domain crates into an Axum application:
//!
//! - [`config`]: environment-variable configuration with defaults
//! - [`state`]: shared [`state::AppState`] holding the store, session
//!   coordinator, admission controller, and code allocator
//! - [`error`]: [`error::AppError`], the HTTP bridge for domain errors
//! - [`routes`]: the complete route table
//! - [`api`]: request/response types and handlers, including the `/ws`
//!   fan-out endpoint
//!
//! The binary entry point (`main.rs`) connects to `PostgreSQL`, runs
//! migrations, and serves the router with graceful shutdown. Tests run the
//! same router against the in-memory store.

pub mod api;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use routes::build_router;
pub use state::AppState;
