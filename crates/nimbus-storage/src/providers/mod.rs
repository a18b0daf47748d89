//! Object-store provider implementations.

pub mod memory;
#[cfg(feature = "s3")]
pub mod s3;
