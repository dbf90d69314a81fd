//! In-process collection for local runs and tests.
//!
//! Every view mounted on clones of the same `InMemoryCollection` sees the
//! same todos, the way sessions of one backend do.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::ApiError;
use crate::remote::{Authenticator, RemoteCollection, SnapshotStream};
use crate::types::{CreateTodo, Snapshot, Todo};

/// Todos kept in creation order behind a `watch` channel.
#[derive(Debug, Clone)]
pub struct InMemoryCollection {
    todos: Arc<watch::Sender<Snapshot>>,
    signed_out: Arc<AtomicBool>,
}

impl Default for InMemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCollection {
    pub fn new() -> Self {
        let (todos, _) = watch::channel(Vec::new());
        Self {
            todos: Arc::new(todos),
            signed_out: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A new session on the same backing store.
    pub fn session(&self) -> Self {
        Self {
            todos: self.todos.clone(),
            signed_out: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.todos.borrow().clone()
    }

    fn ensure_signed_in(&self) -> Result<(), ApiError> {
        if self.signed_out.load(Ordering::Acquire) {
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteCollection for InMemoryCollection {
    fn subscribe(&self) -> SnapshotStream {
        let mut rx = self.todos.subscribe();
        rx.mark_changed();
        futures::stream::unfold(rx, |mut rx| async move {
            rx.changed().await.ok()?;
            let snapshot = rx.borrow_and_update().clone();
            Some((Ok(snapshot), rx))
        })
        .boxed()
    }

    async fn create(&self, input: CreateTodo) -> Result<Todo, ApiError> {
        self.ensure_signed_in()?;
        let todo = Todo {
            id: Uuid::new_v4(),
            content: input.content,
        };
        self.todos.send_modify(|todos| todos.push(todo.clone()));
        Ok(todo)
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.ensure_signed_in()?;
        let removed = self.todos.send_if_modified(|todos| {
            let before = todos.len();
            todos.retain(|t| t.id != id);
            todos.len() != before
        });
        if removed {
            Ok(())
        } else {
            Err(ApiError::NotFound)
        }
    }
}

#[async_trait]
impl Authenticator for InMemoryCollection {
    async fn sign_out(&self) -> Result<(), ApiError> {
        self.signed_out.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::TodoListView;

    #[tokio::test]
    async fn subscription_starts_with_current_snapshot() {
        let store = InMemoryCollection::new();
        store.create(CreateTodo::new("first")).await.unwrap();

        let mut stream = store.subscribe();
        let snapshot = stream.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].content, "first");
    }

    #[tokio::test]
    async fn creation_order_is_kept() {
        let store = InMemoryCollection::new();
        for content in ["a", "b", "c"] {
            store.create(CreateTodo::new(content)).await.unwrap();
        }
        let contents: Vec<_> = store.snapshot().into_iter().map(|t| t.content).collect();
        assert_eq!(contents, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let store = InMemoryCollection::new();
        let err = store.delete(Uuid::nil()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn signed_out_session_is_rejected() {
        let store = InMemoryCollection::new();
        let other = store.session();
        store.sign_out().await.unwrap();

        let err = store.create(CreateTodo::new("x")).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert!(other.create(CreateTodo::new("x")).await.is_ok());
    }

    #[tokio::test]
    async fn sessions_observe_each_other() {
        let store = InMemoryCollection::new();
        let alice = Arc::new(store.session());
        let bob = Arc::new(store.session());
        let alice_view = TodoListView::mount(alice.clone(), alice);
        let bob_view = TodoListView::mount(bob.clone(), bob);
        let mut bob_changes = bob_view.changes();

        alice_view.set_draft("shared");
        alice_view.create().await;

        let seen = bob_changes
            .wait_for(|items| items.len() == 1)
            .await
            .unwrap()
            .clone();
        assert_eq!(seen[0].content, "shared");

        bob_view.delete(seen[0].id).await;
        let mut alice_changes = alice_view.changes();
        alice_changes.wait_for(|items| items.is_empty()).await.unwrap();
        assert!(alice_view.items().is_empty());
    }
}
