//! # CoopHub API Server Library
//!
//! The router and everything it needs, exposed as a library so integration
//! tests can drive it without binding a socket.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration from environment variables
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Validating JSON extractor
//! - `middleware`: Bearer token and security header layers
//! - `routes`: Route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
