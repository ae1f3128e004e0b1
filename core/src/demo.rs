//! Sample scenario for demo mode

use anyhow::Context;
use serde_json::{json, Map};

use symphony_core::adapters::SqlUnitOfWorkFactory;
use symphony_core::domain::entities::{
    NewRepo, NewUserProfile, NewVault, NewWorkspace, WorkspaceType,
};
use symphony_core::{DomainError, Services};

pub async fn run(services: &Services<SqlUnitOfWorkFactory>) -> anyhow::Result<()> {
    let mut prefs = Map::new();
    prefs.insert("theme".to_string(), json!("dark"));
    let alice = services
        .users
        .create(NewUserProfile {
            preferences: prefs,
            ..NewUserProfile::new("alice", "a@x.io")
        })
        .await
        .context("creating demo user")?;
    tracing::info!(user_id = %alice.id, "Demo user created");

    let client = services
        .workspaces
        .create(&alice.id, NewWorkspace::new("Client Work", WorkspaceType::Client))
        .await
        .context("creating first workspace")?;

    match services
        .workspaces
        .create(&alice.id, NewWorkspace::new("Client Work", WorkspaceType::Client))
        .await
    {
        Err(DomainError::Conflict(msg)) => {
            tracing::info!(%msg, "Duplicate workspace name rejected as expected")
        }
        other => anyhow::bail!("expected a conflict for a duplicate workspace, got {:?}", other),
    }

    services
        .workspaces
        .create(&alice.id, NewWorkspace::new("Personal", WorkspaceType::Personal))
        .await
        .context("creating second workspace")?;

    let repo = services
        .repos
        .create(
            &client.id,
            &alice.id,
            NewRepo {
                remote_url: Some("git@github.com:alice/client-api.git".to_string()),
                ..NewRepo::new("client-api", "/src/client-api")
            },
        )
        .await
        .context("adding demo repo")?;
    let vault = services
        .vaults
        .create(&client.id, &alice.id, NewVault::new("contracts", "/vaults/contracts"))
        .await
        .context("adding demo vault")?;
    services
        .vaults
        .lock(&vault.id, &alice.id)
        .await
        .context("locking demo vault")?;

    match services.workspaces.delete(&client.id, &alice.id).await {
        Err(DomainError::Locked(msg)) => {
            tracing::info!(%msg, "Delete refused while a vault is locked")
        }
        other => anyhow::bail!("expected the delete to be refused, got {:?}", other),
    }

    let workspaces = services.workspaces.list_for_user(&alice.id, None).await?;
    let stats = services.workspaces.stats(&client.id, &alice.id).await?;
    tracing::info!(
        workspaces = ?workspaces.iter().map(|w| w.name.as_str()).collect::<Vec<_>>(),
        repos = stats.repos,
        vaults = stats.vaults,
        repo = %repo.name,
        "Demo scenario complete"
    );
    Ok(())
}
