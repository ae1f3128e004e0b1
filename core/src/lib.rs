//! Symphony core
//!
//! Persistence and consistency core for Symphony workspaces: user profiles
//! own workspaces, workspaces track repos and vaults. Uses hexagonal (ports &
//! adapters) architecture; services only see the port traits and run every
//! operation inside a unit of work.

pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod entity;
pub mod error;

#[cfg(test)]
mod test_utils;


pub use app::{ResourceLimits, Services};
pub use config::Config;
pub use error::DomainError;
