//! HTTP API Service
//!
//! Account, betting, and history endpoints over the settlement core.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use server::{build_app, init_tracing, ApiServer};
