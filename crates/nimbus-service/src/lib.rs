//! # nimbus-service
//!
//! Business logic service layer for Nimbus. [`FolderService`] is the folder
//! hierarchy engine: subtree resolution and cascading soft-delete/restore.
//! [`UploadService`] is the upload session coordinator, the state machine
//! from "upload initiated" to a single assembled object. [`FileService`]
//! covers file metadata queries around them.
//!
//! Services follow constructor injection; all dependencies are provided
//! at construction time via `Arc` references.

pub mod file;
pub mod folder;

pub use file::{FileService, UploadService};
pub use folder::FolderService;
