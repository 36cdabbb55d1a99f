//! listscan HTTP gateway.
//!
//! Serves the streaming recognition API, the client-safe config view, a
//! health probe and the static browser client, behind an optional access
//! token.

pub mod auth;
pub mod client_config;
pub mod config_reload;
pub mod error;
pub mod health_api;
pub mod ocr_api;
pub mod server;

pub use config_reload::ConfigReloader;
pub use error::ApiError;
pub use server::{body_limit_for, build_router, start_server, GatewayState, SharedConfig};
