//! Agrivision Server
//!
//! HTTP API that recommends a fertilizer from soil, crop, and nutrient
//! measurements. Predictions require a bearer token issued by `/token`.

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod landing;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use cli::Cli;
pub use config::ServerConfig;
pub use routes::create_router;
pub use state::AppState;
