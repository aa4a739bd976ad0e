//! Library crate for mission-control-back, exposing modules for the binary and tests.

/// Environment-driven settings and built-in game defaults.
pub mod config;
/// Persistence models and game store backends.
pub mod dao;
/// Request and response payloads.
pub mod dto;
/// Error types for the service and HTTP layers.
pub mod error;
/// HTTP route trees.
pub mod routes;
/// Business operations behind the routes.
pub mod services;
/// Shared application state and the game engine.
pub mod state;
