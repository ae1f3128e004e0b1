//! Vault domain entity
//!
//! A tracked document store inside a workspace. A locked vault refuses every
//! mutation except unlocking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::workspace::WorkspaceId;
use super::{is_valid_path, is_valid_resource_name, now};
use crate::error::DomainError;

/// Unique identifier for a vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VaultId(pub Uuid);

impl VaultId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VaultId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for VaultId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for VaultId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document vault tracked by a workspace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vault {
    pub id: VaultId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub path: String,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vault {
    /// Build a new, unlocked vault
    pub fn new(workspace_id: WorkspaceId, new: NewVault) -> Result<Self, DomainError> {
        let ts = now();
        let vault = Vault {
            id: VaultId::new(),
            workspace_id,
            name: new.name,
            path: new.path,
            is_locked: false,
            created_at: ts,
            updated_at: ts,
        };
        vault.validate()?;
        Ok(vault)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !is_valid_resource_name(&self.name) {
            return Err(DomainError::Validation(format!(
                "Invalid vault name: '{}'",
                self.name
            )));
        }
        if !is_valid_path(&self.path) {
            return Err(DomainError::Validation(format!(
                "Invalid vault path: '{}'",
                self.path
            )));
        }
        Ok(())
    }

    /// Fails with `Locked` while the vault is locked
    pub fn ensure_unlocked(&self) -> Result<(), DomainError> {
        if self.is_locked {
            return Err(DomainError::Locked(format!("Vault {} is locked", self.id)));
        }
        Ok(())
    }

    pub fn lock(&mut self) -> Result<(), DomainError> {
        if self.is_locked {
            return Err(DomainError::Conflict(format!(
                "Vault {} is already locked",
                self.id
            )));
        }
        self.is_locked = true;
        self.updated_at = now();
        Ok(())
    }

    pub fn unlock(&mut self) -> Result<(), DomainError> {
        if !self.is_locked {
            return Err(DomainError::Conflict(format!(
                "Vault {} is not locked",
                self.id
            )));
        }
        self.is_locked = false;
        self.updated_at = now();
        Ok(())
    }

    pub fn rename(&mut self, name: &str) -> Result<(), DomainError> {
        self.ensure_unlocked()?;
        if !is_valid_resource_name(name) {
            return Err(DomainError::Validation(format!(
                "Invalid vault name: '{}'",
                name
            )));
        }
        self.name = name.to_string();
        self.updated_at = now();
        Ok(())
    }

    pub fn update_path(&mut self, path: &str) -> Result<(), DomainError> {
        self.ensure_unlocked()?;
        if !is_valid_path(path) {
            return Err(DomainError::Validation(format!(
                "Invalid vault path: '{}'",
                path
            )));
        }
        self.path = path.to_string();
        self.updated_at = now();
        Ok(())
    }
}

/// Data needed to create a new vault
#[derive(Debug, Clone, Default)]
pub struct NewVault {
    pub name: String,
    pub path: String,
}

impl NewVault {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Partial update of a vault; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct VaultUpdate {
    pub name: Option<String>,
    pub path: Option<String>,
}

/// Filter for listing vaults
#[derive(Debug, Clone, Default)]
pub struct VaultFilter {
    pub workspace_id: Option<WorkspaceId>,
    pub name: Option<String>,
    pub is_locked: Option<bool>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}
