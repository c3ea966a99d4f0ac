//! Saved dashboard workspaces, one per GitHub username.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workspace {
    pub id: u64,
    /// Lowercased GitHub username; unique across the store.
    pub username: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

/// Storage capability for workspaces.
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    /// Inserts or updates the workspace for `username` and returns the stored record.
    async fn save(&self, username: &str) -> anyhow::Result<Workspace>;

    /// Every stored workspace, newest first.
    async fn list_all(&self) -> anyhow::Result<Vec<Workspace>>;
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    workspaces: Vec<Workspace>,
}

/// Process-local workspace store.
#[derive(Default)]
pub struct InMemoryWorkspaceStore {
    inner: RwLock<Inner>,
}

impl InMemoryWorkspaceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

pub fn workspace_label(username: &str) -> String {
    format!("{username}'s Hub")
}

#[async_trait]
impl WorkspaceStore for InMemoryWorkspaceStore {
    async fn save(&self, username: &str) -> anyhow::Result<Workspace> {
        let key = username.to_lowercase();
        let label = workspace_label(username);
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.workspaces.iter_mut().find(|w| w.username == key) {
            existing.label = label;
            return Ok(existing.clone());
        }

        inner.next_id += 1;
        let workspace = Workspace {
            id: inner.next_id,
            username: key,
            label,
            created_at: Utc::now(),
        };
        inner.workspaces.push(workspace.clone());
        Ok(workspace)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Workspace>> {
        let inner = self.inner.read().await;
        let mut workspaces = inner.workspaces.clone();
        // Ties (same timestamp) keep the later insert first.
        workspaces.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(workspaces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_lowercases_username() {
        let store = InMemoryWorkspaceStore::new();

        let workspace = store.save("OctoCat").await.unwrap();

        assert_eq!(workspace.username, "octocat");
        assert_eq!(workspace.label, "OctoCat's Hub");
        assert_eq!(workspace.id, 1);
    }

    #[tokio::test]
    async fn test_save_upserts_by_lowercased_username() {
        let store = InMemoryWorkspaceStore::new();

        let first = store.save("octocat").await.unwrap();
        let second = store.save("OCTOCAT").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.label, "OCTOCAT's Hub");
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_all_newest_first() {
        let store = InMemoryWorkspaceStore::new();
        store.save("alice").await.unwrap();
        store.save("bob").await.unwrap();
        store.save("carol").await.unwrap();

        let names: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.username)
            .collect();

        assert_eq!(names, vec!["carol", "bob", "alice"]);
    }

    #[tokio::test]
    async fn test_list_all_empty() {
        let store = InMemoryWorkspaceStore::new();
        assert!(store.list_all().await.unwrap().is_empty());
    }
}
