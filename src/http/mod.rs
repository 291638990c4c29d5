//! HTTP API Server Module
//!
//! REST surface over the Steam client and the local games table.

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use server::HttpServer;
