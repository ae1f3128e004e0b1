//! Repo domain entity
//!
//! A tracked code repository inside a workspace. Only metadata is kept here;
//! git operations live elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::workspace::WorkspaceId;
use super::{is_valid_path, is_valid_resource_name, now};
use crate::error::DomainError;

/// Unique identifier for a repo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId(pub Uuid);

impl RepoId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RepoId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RepoId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A code repository tracked by a workspace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Repo {
    pub id: RepoId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub path: String,
    pub remote_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Repo {
    pub fn new(workspace_id: WorkspaceId, new: NewRepo) -> Result<Self, DomainError> {
        let ts = now();
        let repo = Repo {
            id: RepoId::new(),
            workspace_id,
            name: new.name,
            path: new.path,
            remote_url: new.remote_url,
            created_at: ts,
            updated_at: ts,
        };
        repo.validate()?;
        Ok(repo)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !is_valid_resource_name(&self.name) {
            return Err(DomainError::Validation(format!(
                "Invalid repo name: '{}'",
                self.name
            )));
        }
        if !is_valid_path(&self.path) {
            return Err(DomainError::Validation(format!(
                "Invalid repo path: '{}'",
                self.path
            )));
        }
        if let Some(url) = &self.remote_url {
            if !is_valid_remote_url(url) {
                return Err(DomainError::Validation(format!(
                    "Invalid remote URL: '{}'",
                    url
                )));
            }
        }
        Ok(())
    }

    pub fn rename(&mut self, name: &str) -> Result<(), DomainError> {
        if !is_valid_resource_name(name) {
            return Err(DomainError::Validation(format!(
                "Invalid repo name: '{}'",
                name
            )));
        }
        self.name = name.to_string();
        self.updated_at = now();
        Ok(())
    }

    pub fn update_path(&mut self, path: &str) -> Result<(), DomainError> {
        if !is_valid_path(path) {
            return Err(DomainError::Validation(format!(
                "Invalid repo path: '{}'",
                path
            )));
        }
        self.path = path.to_string();
        self.updated_at = now();
        Ok(())
    }

    /// Set or clear the remote URL
    pub fn update_remote_url(&mut self, remote_url: Option<String>) -> Result<(), DomainError> {
        if let Some(url) = &remote_url {
            if !is_valid_remote_url(url) {
                return Err(DomainError::Validation(format!(
                    "Invalid remote URL: '{}'",
                    url
                )));
            }
        }
        self.remote_url = remote_url;
        self.updated_at = now();
        Ok(())
    }
}

/// Accepts http(s), git and ssh URLs plus scp-style `user@host:path`
pub(crate) fn is_valid_remote_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() {
        return false;
    }
    const SCHEMES: [&str; 5] = ["http://", "https://", "git://", "ssh://", "git@"];
    if SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
        return true;
    }
    url.contains(':') && !url.starts_with('/')
}

/// Data needed to create a new repo
#[derive(Debug, Clone, Default)]
pub struct NewRepo {
    pub name: String,
    pub path: String,
    pub remote_url: Option<String>,
}

impl NewRepo {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            remote_url: None,
        }
    }
}

/// Partial update of a repo; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct RepoUpdate {
    pub name: Option<String>,
    pub path: Option<String>,
    /// `Some(None)` clears the remote
    pub remote_url: Option<Option<String>>,
}

/// Filter for listing repos
#[derive(Debug, Clone, Default)]
pub struct RepoFilter {
    pub workspace_id: Option<WorkspaceId>,
    pub name: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}
