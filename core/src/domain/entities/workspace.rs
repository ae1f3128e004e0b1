//! Workspace domain entity
//!
//! An independent work context. It references its owner by id only and owns
//! the repos and vaults created inside it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::now;
use super::user_profile::UserProfileId;
use crate::error::DomainError;

/// Free-form workspace settings (a JSON object)
pub type Settings = Map<String, Value>;

/// Links to global resources, keyed by resource type (e.g. "contact", "template")
pub type SharedResources = BTreeMap<String, Vec<Uuid>>;

/// Unique identifier for a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkspaceId(pub Uuid);

impl WorkspaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkspaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for WorkspaceId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of work a workspace holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceType {
    #[default]
    General,
    Client,
    Personal,
    Research,
}

impl std::fmt::Display for WorkspaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkspaceType::General => write!(f, "general"),
            WorkspaceType::Client => write!(f, "client"),
            WorkspaceType::Personal => write!(f, "personal"),
            WorkspaceType::Research => write!(f, "research"),
        }
    }
}

impl std::str::FromStr for WorkspaceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(WorkspaceType::General),
            "client" => Ok(WorkspaceType::Client),
            "personal" => Ok(WorkspaceType::Personal),
            "research" => Ok(WorkspaceType::Research),
            _ => Err(DomainError::Validation(format!(
                "Invalid workspace type: {}",
                s
            ))),
        }
    }
}

/// A workspace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub owner_id: UserProfileId,
    pub name: String,
    pub description: Option<String>,
    pub workspace_type: WorkspaceType,
    pub settings: Settings,
    pub shared_resources: SharedResources,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    /// Build a new workspace for `owner_id`, rejecting invalid names
    pub fn new(owner_id: UserProfileId, new: NewWorkspace) -> Result<Self, DomainError> {
        let ts = now();
        let workspace = Workspace {
            id: WorkspaceId::new(),
            owner_id,
            name: new.name,
            description: new.description,
            workspace_type: new.workspace_type,
            settings: new.settings,
            shared_resources: SharedResources::new(),
            created_at: ts,
            updated_at: ts,
        };
        workspace.validate()?;
        Ok(workspace)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !is_valid_workspace_name(&self.name) {
            return Err(DomainError::Validation(format!(
                "Invalid workspace name: '{}'",
                self.name
            )));
        }
        Ok(())
    }

    pub fn is_owned_by(&self, user_id: &UserProfileId) -> bool {
        self.owner_id == *user_id
    }

    pub fn rename(&mut self, name: &str) -> Result<(), DomainError> {
        if !is_valid_workspace_name(name) {
            return Err(DomainError::Validation(format!(
                "Invalid workspace name: '{}'",
                name
            )));
        }
        self.name = name.to_string();
        self.updated_at = now();
        Ok(())
    }

    pub fn update_description(&mut self, description: Option<String>) {
        self.description = description;
        self.updated_at = now();
    }

    /// Merge settings: new keys overwrite, other keys are kept
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings.extend(settings);
        self.updated_at = now();
    }

    /// Link a global resource; linking twice is a no-op
    pub fn add_shared_resource(&mut self, resource_type: &str, resource_id: Uuid) {
        let ids = self
            .shared_resources
            .entry(resource_type.to_string())
            .or_default();
        if !ids.contains(&resource_id) {
            ids.push(resource_id);
            self.updated_at = now();
        }
    }

    pub fn remove_shared_resource(&mut self, resource_type: &str, resource_id: Uuid) {
        let Some(ids) = self.shared_resources.get_mut(resource_type) else {
            return;
        };
        let before = ids.len();
        ids.retain(|id| *id != resource_id);
        if ids.len() != before {
            if ids.is_empty() {
                self.shared_resources.remove(resource_type);
            }
            self.updated_at = now();
        }
    }
}

fn is_valid_workspace_name(name: &str) -> bool {
    !name.trim().is_empty() && name.chars().count() <= 255
}

/// Data needed to create a new workspace
#[derive(Debug, Clone, Default)]
pub struct NewWorkspace {
    pub name: String,
    pub description: Option<String>,
    pub workspace_type: WorkspaceType,
    pub settings: Settings,
}

impl NewWorkspace {
    pub fn new(name: impl Into<String>, workspace_type: WorkspaceType) -> Self {
        Self {
            name: name.into(),
            workspace_type,
            ..Default::default()
        }
    }
}

/// Partial update of a workspace; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct WorkspaceUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    /// Merged into the existing settings
    pub settings: Option<Settings>,
}

/// Filter for listing workspaces
#[derive(Debug, Clone, Default)]
pub struct WorkspaceFilter {
    pub owner_id: Option<UserProfileId>,
    pub workspace_type: Option<WorkspaceType>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Number of child resources held by a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ResourceCounts {
    pub repos: u64,
    pub vaults: u64,
}

impl ResourceCounts {
    pub fn has_active_resources(&self) -> bool {
        self.repos + self.vaults > 0
    }
}
