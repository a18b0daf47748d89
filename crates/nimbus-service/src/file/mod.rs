//! File metadata service and the upload session coordinator.

pub mod service;
pub mod upload;

pub use service::FileService;
pub use upload::{InitiateUploadRequest, InitiateUploadResponse, UploadService, UploadTarget};
