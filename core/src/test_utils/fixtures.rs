//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use serde_json::Map;
use std::collections::BTreeMap;

use crate::domain::entities::{
    now, Repo, RepoId, UserProfile, UserProfileId, Vault, VaultId, Workspace, WorkspaceId,
    WorkspaceType,
};

/// Create a test user with default values
pub fn test_user() -> UserProfile {
    test_user_named("alice")
}

/// Create a test user with a specific username; the email follows it
pub fn test_user_named(username: &str) -> UserProfile {
    let ts = now();
    UserProfile {
        id: UserProfileId::new(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        preferences: Map::new(),
        created_at: ts,
        updated_at: ts,
    }
}

/// Create a general workspace owned by `owner_id`
pub fn test_workspace(owner_id: UserProfileId, name: &str) -> Workspace {
    let ts = now();
    Workspace {
        id: WorkspaceId::new(),
        owner_id,
        name: name.to_string(),
        description: None,
        workspace_type: WorkspaceType::General,
        settings: Map::new(),
        shared_resources: BTreeMap::new(),
        created_at: ts,
        updated_at: ts,
    }
}

pub fn test_repo(workspace_id: WorkspaceId, name: &str) -> Repo {
    let ts = now();
    Repo {
        id: RepoId::new(),
        workspace_id,
        name: name.to_string(),
        path: format!("/src/{}", name),
        remote_url: None,
        created_at: ts,
        updated_at: ts,
    }
}

pub fn test_vault(workspace_id: WorkspaceId, name: &str) -> Vault {
    let ts = now();
    Vault {
        id: VaultId::new(),
        workspace_id,
        name: name.to_string(),
        path: format!("/vaults/{}", name),
        is_locked: false,
        created_at: ts,
        updated_at: ts,
    }
}

/// Create a vault that is already locked
pub fn locked_vault(workspace_id: WorkspaceId, name: &str) -> Vault {
    Vault {
        is_locked: true,
        ..test_vault(workspace_id, name)
    }
}
