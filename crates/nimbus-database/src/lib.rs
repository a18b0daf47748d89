//! # nimbus-database
//!
//! PostgreSQL connection management and concrete repository implementations
//! for the Nimbus metadata store. Repositories own no business logic; they
//! are typed read/write primitives. Methods that participate in a cascade
//! take a `&mut PgConnection` so the caller can thread one transaction
//! through every mutation.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
