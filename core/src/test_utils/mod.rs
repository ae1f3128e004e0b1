//! Test utilities
//!
//! Manual in-memory implementations of the persistence ports and test
//! fixtures for unit testing the services.
//!
//! The in-memory unit of work mirrors the SQL schema's unique keys, foreign
//! keys and cascades, so service tests exercise the same failure paths as
//! the database does. Adapter behaviour itself is covered by the SQLite
//! integration tests in `adapters::sql`.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
