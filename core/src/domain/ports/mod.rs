//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod repositories;
pub mod unit_of_work;

pub use repositories::{
    RepoRepository, Repository, UserProfileRepository, VaultRepository, WorkspaceRepository,
};
pub use unit_of_work::{UnitOfWork, UnitOfWorkFactory};
