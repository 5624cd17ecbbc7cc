//! Files Index Backend Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
/// Persistence backends for files index records
pub mod store;
