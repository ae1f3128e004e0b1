//! SeaORM entity models
//!
//! One module per table. Domain types never leak in here; the SQL adapters
//! convert between these models and `crate::domain::entities`.

pub mod repos;
pub mod user_profiles;
pub mod vaults;
pub mod workspaces;
