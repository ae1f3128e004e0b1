//! In-memory implementations of the persistence ports
//!
//! `InMemoryUnitOfWorkFactory` stands in for the SQL unit of work in
//! service tests. A scope takes the store lock for its whole lifetime and
//! works on a copy of the tables; commit writes the copy back, anything else
//! throws it away. Unique keys, foreign keys and cascades are enforced the
//! way the SQL schema enforces them.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::entities::{
    now, Repo, RepoFilter, RepoId, ResourceCounts, UserProfile, UserProfileFilter, UserProfileId,
    Vault, VaultFilter, VaultId, Workspace, WorkspaceFilter, WorkspaceId, WorkspaceType,
};
use crate::domain::ports::{
    RepoRepository, Repository, UnitOfWork, UnitOfWorkFactory, UserProfileRepository,
    VaultRepository, WorkspaceRepository,
};
use crate::error::DomainError;

/// Every table of the store
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub user_profiles: HashMap<UserProfileId, UserProfile>,
    pub workspaces: HashMap<WorkspaceId, Workspace>,
    pub repos: HashMap<RepoId, Repo>,
    pub vaults: HashMap<VaultId, Vault>,
}

// ============================================================================
// In-Memory Unit of Work Factory
// ============================================================================

#[derive(Clone, Default)]
pub struct InMemoryUnitOfWorkFactory {
    tables: Arc<Mutex<Tables>>,
    fail_next_commit: Arc<AtomicBool>,
    stale_uniqueness_checks: Arc<AtomicBool>,
    commits: Arc<AtomicUsize>,
}

impl InMemoryUnitOfWorkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a user profile for testing
    pub fn with_user(self, user: UserProfile) -> Self {
        self.seed(|t| {
            t.user_profiles.insert(user.id, user);
        })
    }

    pub fn with_workspace(self, workspace: Workspace) -> Self {
        self.seed(|t| {
            t.workspaces.insert(workspace.id, workspace);
        })
    }

    pub fn with_repo(self, repo: Repo) -> Self {
        self.seed(|t| {
            t.repos.insert(repo.id, repo);
        })
    }

    pub fn with_vault(self, vault: Vault) -> Self {
        self.seed(|t| {
            t.vaults.insert(vault.id, vault);
        })
    }

    fn seed(self, f: impl FnOnce(&mut Tables)) -> Self {
        {
            let mut tables = self
                .tables
                .try_lock()
                .expect("store is busy while seeding");
            f(&mut tables);
        }
        self
    }

    /// Copy of the committed state
    pub async fn tables(&self) -> Tables {
        self.tables.lock().await.clone()
    }

    /// Make the next commit fail as if the database went away
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Make username and email existence checks report "free" from now on,
    /// as when a competing registration commits between check and insert.
    /// The unique constraint on `save` still applies.
    pub fn stale_uniqueness_checks(&self) {
        self.stale_uniqueness_checks.store(true, Ordering::SeqCst);
    }

    /// Number of successful commits so far
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryUnitOfWorkFactory {
    type Scope = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<InMemoryUnitOfWork, DomainError> {
        let store = self.tables.clone().lock_owned().await;
        let working = store.clone();

        Ok(InMemoryUnitOfWork {
            store: Some(store),
            working: RwLock::new(working),
            failed: AtomicBool::new(false),
            stale_uniqueness_checks: self.stale_uniqueness_checks.load(Ordering::SeqCst),
            committed: false,
            fail_next_commit: self.fail_next_commit.clone(),
            commits: self.commits.clone(),
        })
    }
}

// ============================================================================
// In-Memory Unit of Work
// ============================================================================

pub struct InMemoryUnitOfWork {
    store: Option<OwnedMutexGuard<Tables>>,
    working: RwLock<Tables>,
    failed: AtomicBool,
    stale_uniqueness_checks: bool,
    committed: bool,
    fail_next_commit: Arc<AtomicBool>,
    commits: Arc<AtomicUsize>,
}

impl InMemoryUnitOfWork {
    fn scope(&self) -> MemoryScope<'_> {
        MemoryScope {
            tables: &self.working,
            failed: &self.failed,
            open: self.store.is_some(),
            stale_uniqueness_checks: self.stale_uniqueness_checks,
        }
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    type UserProfiles<'a> = InMemoryUserProfileRepository<'a>;
    type Workspaces<'a> = InMemoryWorkspaceRepository<'a>;
    type Repos<'a> = InMemoryRepoRepository<'a>;
    type Vaults<'a> = InMemoryVaultRepository<'a>;

    fn user_profiles(&self) -> Self::UserProfiles<'_> {
        InMemoryUserProfileRepository { scope: self.scope() }
    }

    fn workspaces(&self) -> Self::Workspaces<'_> {
        InMemoryWorkspaceRepository { scope: self.scope() }
    }

    fn repos(&self) -> Self::Repos<'_> {
        InMemoryRepoRepository { scope: self.scope() }
    }

    fn vaults(&self) -> Self::Vaults<'_> {
        InMemoryVaultRepository { scope: self.scope() }
    }

    async fn commit(&mut self) -> Result<(), DomainError> {
        let Some(mut store) = self.store.take() else {
            return Err(DomainError::IllegalState(if self.committed {
                "Unit of work already committed".to_string()
            } else {
                "Unit of work already rolled back".to_string()
            }));
        };
        if self.failed.load(Ordering::SeqCst) {
            return Err(DomainError::IllegalState(
                "Cannot commit after a failed operation; changes were rolled back".to_string(),
            ));
        }
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(DomainError::Database("connection lost during commit".to_string()));
        }

        *store = std::mem::take(&mut *self.working.write().unwrap());
        self.committed = true;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DomainError> {
        self.store = None;
        Ok(())
    }
}

/// Borrowed view of an open scope
#[derive(Clone, Copy)]
pub struct MemoryScope<'a> {
    tables: &'a RwLock<Tables>,
    failed: &'a AtomicBool,
    open: bool,
    stale_uniqueness_checks: bool,
}

impl<'a> MemoryScope<'a> {
    fn read(&self) -> Result<RwLockReadGuard<'a, Tables>, DomainError> {
        self.ensure_open()?;
        Ok(self.tables.read().unwrap())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'a, Tables>, DomainError> {
        self.ensure_open()?;
        Ok(self.tables.write().unwrap())
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if !self.open {
            return Err(DomainError::IllegalState(
                "Unit of work is already closed".to_string(),
            ));
        }
        Ok(())
    }

    /// A constraint violation poisons the scope, like an aborted transaction
    fn fail(&self, err: DomainError) -> DomainError {
        self.failed.store(true, Ordering::SeqCst);
        err
    }
}

fn page<T>(items: Vec<T>, limit: Option<u64>, offset: Option<u64>) -> Vec<T> {
    let offset = offset.unwrap_or(0) as usize;
    let limit = limit.map(|l| l as usize).unwrap_or(usize::MAX);
    items.into_iter().skip(offset).take(limit).collect()
}

// ============================================================================
// In-Memory UserProfile Repository
// ============================================================================

pub struct InMemoryUserProfileRepository<'a> {
    scope: MemoryScope<'a>,
}

#[async_trait]
impl<'a> Repository for InMemoryUserProfileRepository<'a> {
    type Entity = UserProfile;
    type Id = UserProfileId;
    type Filter = UserProfileFilter;

    async fn get(&self, id: &UserProfileId) -> Result<Option<UserProfile>, DomainError> {
        Ok(self.scope.read()?.user_profiles.get(id).cloned())
    }

    async fn save(&self, profile: &UserProfile) -> Result<UserProfile, DomainError> {
        profile.validate()?;
        let mut tables = self.scope.write()?;

        let clash = tables.user_profiles.values().find(|p| {
            p.id != profile.id && (p.username == profile.username || p.email == profile.email)
        });
        if let Some(other) = clash {
            let column = if other.username == profile.username {
                "username"
            } else {
                "email"
            };
            return Err(self.scope.fail(DomainError::Conflict(format!(
                "duplicate key value violates unique constraint on user_profiles.{}",
                column
            ))));
        }

        let mut stored = profile.clone();
        if let Some(existing) = tables.user_profiles.get(&profile.id) {
            stored.created_at = existing.created_at;
        }
        tables.user_profiles.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &UserProfileId) -> Result<(), DomainError> {
        let mut tables = self.scope.write()?;
        if tables.workspaces.values().any(|w| w.owner_id == *id) {
            return Err(DomainError::Conflict(format!(
                "UserProfile {} still owns workspaces",
                id
            )));
        }
        tables
            .user_profiles
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("UserProfile {}", id)))
    }

    async fn exists(&self, id: &UserProfileId) -> Result<bool, DomainError> {
        Ok(self.scope.read()?.user_profiles.contains_key(id))
    }

    async fn list(&self, filter: &UserProfileFilter) -> Result<Vec<UserProfile>, DomainError> {
        let tables = self.scope.read()?;
        let mut profiles: Vec<UserProfile> = tables.user_profiles.values().cloned().collect();
        profiles.sort_by_key(|p| (p.created_at, p.id.0));
        Ok(page(profiles, filter.limit, filter.offset))
    }
}

#[async_trait]
impl<'a> UserProfileRepository for InMemoryUserProfileRepository<'a> {
    async fn get_by_username(&self, username: &str) -> Result<Option<UserProfile>, DomainError> {
        let tables = self.scope.read()?;
        Ok(tables
            .user_profiles
            .values()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserProfile>, DomainError> {
        let tables = self.scope.read()?;
        Ok(tables
            .user_profiles
            .values()
            .find(|p| p.email == email)
            .cloned())
    }

    async fn exists_by_username(
        &self,
        username: &str,
        exclude_id: Option<&UserProfileId>,
    ) -> Result<bool, DomainError> {
        let tables = self.scope.read()?;
        if self.scope.stale_uniqueness_checks {
            return Ok(false);
        }
        Ok(tables
            .user_profiles
            .values()
            .any(|p| p.username == username && Some(&p.id) != exclude_id))
    }

    async fn exists_by_email(
        &self,
        email: &str,
        exclude_id: Option<&UserProfileId>,
    ) -> Result<bool, DomainError> {
        let tables = self.scope.read()?;
        if self.scope.stale_uniqueness_checks {
            return Ok(false);
        }
        Ok(tables
            .user_profiles
            .values()
            .any(|p| p.email == email && Some(&p.id) != exclude_id))
    }

    async fn count_workspaces(&self, user_id: &UserProfileId) -> Result<u64, DomainError> {
        let tables = self.scope.read()?;
        Ok(tables
            .workspaces
            .values()
            .filter(|w| w.owner_id == *user_id)
            .count() as u64)
    }
}

// ============================================================================
// In-Memory Workspace Repository
// ============================================================================

pub struct InMemoryWorkspaceRepository<'a> {
    scope: MemoryScope<'a>,
}

#[async_trait]
impl<'a> Repository for InMemoryWorkspaceRepository<'a> {
    type Entity = Workspace;
    type Id = WorkspaceId;
    type Filter = WorkspaceFilter;

    async fn get(&self, id: &WorkspaceId) -> Result<Option<Workspace>, DomainError> {
        Ok(self.scope.read()?.workspaces.get(id).cloned())
    }

    async fn save(&self, workspace: &Workspace) -> Result<Workspace, DomainError> {
        workspace.validate()?;
        let mut tables = self.scope.write()?;

        if !tables.user_profiles.contains_key(&workspace.owner_id) {
            return Err(self.scope.fail(DomainError::NotFound(format!(
                "Referenced entity is missing: user_profiles.id = {}",
                workspace.owner_id
            ))));
        }
        let clash = tables.workspaces.values().any(|w| {
            w.id != workspace.id && w.owner_id == workspace.owner_id && w.name == workspace.name
        });
        if clash {
            return Err(self.scope.fail(DomainError::Conflict(
                "duplicate key value violates unique constraint uq_workspaces_owner_name"
                    .to_string(),
            )));
        }

        let mut stored = workspace.clone();
        if let Some(existing) = tables.workspaces.get(&workspace.id) {
            stored.created_at = existing.created_at;
        }
        tables.workspaces.insert(stored.id, stored.clone());
        Ok(stored)
    }

    /// Cascades to the workspace's repos and vaults
    async fn delete(&self, id: &WorkspaceId) -> Result<(), DomainError> {
        let mut tables = self.scope.write()?;
        if tables.workspaces.remove(id).is_none() {
            return Err(DomainError::NotFound(format!("Workspace {}", id)));
        }
        tables.repos.retain(|_, r| r.workspace_id != *id);
        tables.vaults.retain(|_, v| v.workspace_id != *id);
        Ok(())
    }

    async fn exists(&self, id: &WorkspaceId) -> Result<bool, DomainError> {
        Ok(self.scope.read()?.workspaces.contains_key(id))
    }

    async fn list(&self, filter: &WorkspaceFilter) -> Result<Vec<Workspace>, DomainError> {
        let tables = self.scope.read()?;
        let mut workspaces: Vec<Workspace> = tables
            .workspaces
            .values()
            .filter(|w| filter.owner_id.map_or(true, |o| w.owner_id == o))
            .filter(|w| filter.workspace_type.map_or(true, |t| w.workspace_type == t))
            .cloned()
            .collect();
        workspaces.sort_by_key(|w| (w.created_at, w.id.0));
        Ok(page(workspaces, filter.limit, filter.offset))
    }
}

#[async_trait]
impl<'a> WorkspaceRepository for InMemoryWorkspaceRepository<'a> {
    async fn get_by_user_and_name(
        &self,
        user_id: &UserProfileId,
        name: &str,
    ) -> Result<Option<Workspace>, DomainError> {
        let tables = self.scope.read()?;
        Ok(tables
            .workspaces
            .values()
            .find(|w| w.owner_id == *user_id && w.name == name)
            .cloned())
    }

    async fn list_by_user(&self, user_id: &UserProfileId) -> Result<Vec<Workspace>, DomainError> {
        self.list(&WorkspaceFilter {
            owner_id: Some(*user_id),
            ..Default::default()
        })
        .await
    }

    async fn list_by_user_and_type(
        &self,
        user_id: &UserProfileId,
        workspace_type: WorkspaceType,
    ) -> Result<Vec<Workspace>, DomainError> {
        self.list(&WorkspaceFilter {
            owner_id: Some(*user_id),
            workspace_type: Some(workspace_type),
            ..Default::default()
        })
        .await
    }

    async fn count_resources(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<ResourceCounts, DomainError> {
        let tables = self.scope.read()?;
        Ok(ResourceCounts {
            repos: tables
                .repos
                .values()
                .filter(|r| r.workspace_id == *workspace_id)
                .count() as u64,
            vaults: tables
                .vaults
                .values()
                .filter(|v| v.workspace_id == *workspace_id)
                .count() as u64,
        })
    }
}

// ============================================================================
// In-Memory Repo Repository
// ============================================================================

pub struct InMemoryRepoRepository<'a> {
    scope: MemoryScope<'a>,
}

#[async_trait]
impl<'a> Repository for InMemoryRepoRepository<'a> {
    type Entity = Repo;
    type Id = RepoId;
    type Filter = RepoFilter;

    async fn get(&self, id: &RepoId) -> Result<Option<Repo>, DomainError> {
        Ok(self.scope.read()?.repos.get(id).cloned())
    }

    async fn save(&self, repo: &Repo) -> Result<Repo, DomainError> {
        repo.validate()?;
        let mut tables = self.scope.write()?;

        if !tables.workspaces.contains_key(&repo.workspace_id) {
            return Err(self.scope.fail(DomainError::NotFound(format!(
                "Referenced entity is missing: workspaces.id = {}",
                repo.workspace_id
            ))));
        }

        let mut stored = repo.clone();
        if let Some(existing) = tables.repos.get(&repo.id) {
            stored.created_at = existing.created_at;
        }
        tables.repos.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &RepoId) -> Result<(), DomainError> {
        let mut tables = self.scope.write()?;
        tables
            .repos
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("Repo {}", id)))
    }

    async fn exists(&self, id: &RepoId) -> Result<bool, DomainError> {
        Ok(self.scope.read()?.repos.contains_key(id))
    }

    async fn list(&self, filter: &RepoFilter) -> Result<Vec<Repo>, DomainError> {
        let tables = self.scope.read()?;
        let mut repos: Vec<Repo> = tables
            .repos
            .values()
            .filter(|r| filter.workspace_id.map_or(true, |w| r.workspace_id == w))
            .filter(|r| filter.name.as_ref().map_or(true, |n| &r.name == n))
            .cloned()
            .collect();
        repos.sort_by_key(|r| (r.created_at, r.id.0));
        Ok(page(repos, filter.limit, filter.offset))
    }
}

#[async_trait]
impl<'a> RepoRepository for InMemoryRepoRepository<'a> {
    async fn list_by_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Repo>, DomainError> {
        self.list(&RepoFilter {
            workspace_id: Some(*workspace_id),
            ..Default::default()
        })
        .await
    }

    async fn get_by_name(
        &self,
        workspace_id: &WorkspaceId,
        name: &str,
    ) -> Result<Option<Repo>, DomainError> {
        let tables = self.scope.read()?;
        Ok(tables
            .repos
            .values()
            .find(|r| r.workspace_id == *workspace_id && r.name == name)
            .cloned())
    }

    async fn count_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<u64, DomainError> {
        let tables = self.scope.read()?;
        Ok(tables
            .repos
            .values()
            .filter(|r| r.workspace_id == *workspace_id)
            .count() as u64)
    }

    async fn delete_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<u64, DomainError> {
        let mut tables = self.scope.write()?;
        let before = tables.repos.len();
        tables.repos.retain(|_, r| r.workspace_id != *workspace_id);
        Ok((before - tables.repos.len()) as u64)
    }
}

// ============================================================================
// In-Memory Vault Repository
// ============================================================================

pub struct InMemoryVaultRepository<'a> {
    scope: MemoryScope<'a>,
}

#[async_trait]
impl<'a> Repository for InMemoryVaultRepository<'a> {
    type Entity = Vault;
    type Id = VaultId;
    type Filter = VaultFilter;

    async fn get(&self, id: &VaultId) -> Result<Option<Vault>, DomainError> {
        Ok(self.scope.read()?.vaults.get(id).cloned())
    }

    async fn save(&self, vault: &Vault) -> Result<Vault, DomainError> {
        vault.validate()?;
        let mut tables = self.scope.write()?;

        if !tables.workspaces.contains_key(&vault.workspace_id) {
            return Err(self.scope.fail(DomainError::NotFound(format!(
                "Referenced entity is missing: workspaces.id = {}",
                vault.workspace_id
            ))));
        }

        let mut stored = vault.clone();
        if let Some(existing) = tables.vaults.get(&vault.id) {
            stored.created_at = existing.created_at;
            stored.is_locked = existing.is_locked;
        }
        tables.vaults.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &VaultId) -> Result<(), DomainError> {
        let mut tables = self.scope.write()?;
        tables
            .vaults
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("Vault {}", id)))
    }

    async fn exists(&self, id: &VaultId) -> Result<bool, DomainError> {
        Ok(self.scope.read()?.vaults.contains_key(id))
    }

    async fn list(&self, filter: &VaultFilter) -> Result<Vec<Vault>, DomainError> {
        let tables = self.scope.read()?;
        let mut vaults: Vec<Vault> = tables
            .vaults
            .values()
            .filter(|v| filter.workspace_id.map_or(true, |w| v.workspace_id == w))
            .filter(|v| filter.name.as_ref().map_or(true, |n| &v.name == n))
            .filter(|v| filter.is_locked.map_or(true, |l| v.is_locked == l))
            .cloned()
            .collect();
        vaults.sort_by_key(|v| (v.created_at, v.id.0));
        Ok(page(vaults, filter.limit, filter.offset))
    }
}

#[async_trait]
impl<'a> VaultRepository for InMemoryVaultRepository<'a> {
    async fn list_by_workspace(
        &self,
        workspace_id: &WorkspaceId,
    ) -> Result<Vec<Vault>, DomainError> {
        self.list(&VaultFilter {
            workspace_id: Some(*workspace_id),
            ..Default::default()
        })
        .await
    }

    async fn get_by_name(
        &self,
        workspace_id: &WorkspaceId,
        name: &str,
    ) -> Result<Option<Vault>, DomainError> {
        let tables = self.scope.read()?;
        Ok(tables
            .vaults
            .values()
            .find(|v| v.workspace_id == *workspace_id && v.name == name)
            .cloned())
    }

    async fn count_by_workspace(&self, workspace_id: &WorkspaceId) -> Result<u64, DomainError> {
        let tables = self.scope.read()?;
        Ok(tables
            .vaults
            .values()
            .filter(|v| v.workspace_id == *workspace_id)
            .count() as u64)
    }

    async fn set_locked(&self, id: &VaultId, locked: bool) -> Result<Vault, DomainError> {
        let mut tables = self.scope.write()?;
        let vault = tables
            .vaults
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Vault {}", id)))?;
        vault.is_locked = locked;
        vault.updated_at = now();
        Ok(vault.clone())
    }
}
