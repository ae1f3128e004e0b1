//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod repo;
pub mod user_profile;
pub mod vault;
pub mod workspace;

use chrono::{DateTime, SubsecRound, Utc};

pub use repo::{NewRepo, Repo, RepoFilter, RepoId, RepoUpdate};
pub use user_profile::{
    NewUserProfile, Preferences, UserProfile, UserProfileFilter, UserProfileId, UserProfileUpdate,
};
pub use vault::{NewVault, Vault, VaultFilter, VaultId, VaultUpdate};
pub use workspace::{
    NewWorkspace, ResourceCounts, Settings, SharedResources, Workspace, WorkspaceFilter,
    WorkspaceId, WorkspaceType, WorkspaceUpdate,
};

/// Current UTC instant at the precision the store keeps (microseconds)
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Characters that are not allowed in repo and vault names
const INVALID_NAME_CHARS: [char; 8] = ['<', '>', ':', '"', '|', '?', '*', '\0'];

/// Shared name rule for workspace children: 1-255 chars, usable as a directory name
pub(crate) fn is_valid_resource_name(name: &str) -> bool {
    if name.trim().is_empty() || name.chars().count() > 255 {
        return false;
    }
    if name.contains('/') || name.contains('\\') {
        return false;
    }
    !name.chars().any(|c| INVALID_NAME_CHARS.contains(&c))
}

/// Shared path rule for workspace children
pub(crate) fn is_valid_path(path: &str) -> bool {
    !path.trim().is_empty() && !path.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_has_microsecond_precision() {
        let ts = now();
        assert_eq!(ts.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn resource_name_rules() {
        assert!(is_valid_resource_name("symphony"));
        assert!(is_valid_resource_name("my notes 2024"));
        assert!(!is_valid_resource_name(""));
        assert!(!is_valid_resource_name("   "));
        assert!(!is_valid_resource_name("a/b"));
        assert!(!is_valid_resource_name("a\\b"));
        assert!(!is_valid_resource_name("what?"));
        assert!(!is_valid_resource_name(&"x".repeat(256)));
        assert!(is_valid_resource_name(&"x".repeat(255)));
    }

    #[test]
    fn path_rules() {
        assert!(is_valid_path("/home/alice/code"));
        assert!(is_valid_path("relative/dir"));
        assert!(!is_valid_path(""));
        assert!(!is_valid_path("  "));
    }
}
