//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod sql;

pub use sql::{
    connect, create_schema, SqlRepoRepository, SqlUnitOfWork, SqlUnitOfWorkFactory,
    SqlUserProfileRepository, SqlVaultRepository, SqlWorkspaceRepository,
};
