//! # Conforma
//!
//! HTTP API, CLI and configuration for the Conforma compliance server -
//! THE BINARY. All domain rules live in `conforma-core`.

pub mod api;
pub mod cli;
pub mod config;
