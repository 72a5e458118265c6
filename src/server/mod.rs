//! HTTP boundary of the relay
//!
//! Exposes registration, publishing and event streams over HTTP using axum.
//! Each open `GET /events/{id}` request owns one subscription for as long as
//! the client keeps the connection.

pub mod config;
pub mod listener;
pub mod routes;
pub mod stream;

pub use config::ServerConfig;
pub use listener::RelayServer;
pub use routes::router;
