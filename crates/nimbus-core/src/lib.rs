//! # nimbus-core
//!
//! Core crate for Nimbus. Contains the unified error system, configuration
//! schemas, tracing initialization, and the object-store adapter trait.
//!
//! This crate has **no** internal dependencies on other Nimbus crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
