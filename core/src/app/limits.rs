//! Resource limit configuration
//!
//! Caps on how much a single user or workspace may hold. The defaults can be
//! overridden through `Config`.

/// Maximum workspaces a single user may own
pub const MAX_WORKSPACES_PER_USER: u64 = 50;

/// Maximum repos tracked by one workspace
pub const MAX_REPOS_PER_WORKSPACE: u64 = 100;

/// Maximum vaults tracked by one workspace
pub const MAX_VAULTS_PER_WORKSPACE: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    pub max_workspaces_per_user: u64,
    pub max_repos_per_workspace: u64,
    pub max_vaults_per_workspace: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_workspaces_per_user: MAX_WORKSPACES_PER_USER,
            max_repos_per_workspace: MAX_REPOS_PER_WORKSPACE,
            max_vaults_per_workspace: MAX_VAULTS_PER_WORKSPACE,
        }
    }
}
