//! Core traits implemented by the adapter crates.

pub mod object_store;

pub use object_store::{ObjectDescriptor, ObjectStore, UploadPart};
