//! Local mirror of the remote todo collection.
//!
//! # Design
//! The subscription is the only writer of the mirror. `create` and `delete`
//! forward the user's intent and never touch the mirror themselves, even on
//! success: the next pushed snapshot is the authority. Failures of either
//! call are logged and swallowed, leaving the view in whatever state the
//! last snapshot put it.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

use crate::remote::{Authenticator, RemoteCollection};
use crate::subscription::Subscription;
use crate::types::{CreateTodo, Snapshot};

/// A mounted, subscribed todo list.
///
/// Exists only while subscribed: `unmount`, `sign_out` and drop all release
/// the subscription.
pub struct TodoListView<R: RemoteCollection, A: Authenticator> {
    remote: Arc<R>,
    auth: Arc<A>,
    mirror: watch::Receiver<Snapshot>,
    draft: Mutex<String>,
    subscription: Subscription,
}

impl<R: RemoteCollection, A: Authenticator> TodoListView<R, A> {
    /// Open the subscription and start mirroring. Must run inside a tokio runtime.
    pub fn mount(remote: Arc<R>, auth: Arc<A>) -> Self {
        let (tx, mirror) = watch::channel(Vec::new());
        let subscription = Subscription::spawn(remote.subscribe(), tx);
        tracing::debug!("todo list mounted");
        Self {
            remote,
            auth,
            mirror,
            draft: Mutex::new(String::new()),
            subscription,
        }
    }

    /// The most recently delivered snapshot.
    pub fn items(&self) -> Snapshot {
        self.mirror.borrow().clone()
    }

    /// A receiver notified after every snapshot replaces the mirror.
    pub fn changes(&self) -> watch::Receiver<Snapshot> {
        self.mirror.clone()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    pub fn draft(&self) -> String {
        self.draft.lock().clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *self.draft.lock() = text.into();
    }

    /// Submit the draft as a new todo.
    ///
    /// The draft is read when this is called, not when the future is first
    /// polled. Blank drafts are ignored. The draft is cleared once the
    /// service accepts the todo and kept for a retry when it does not.
    pub fn create(&self) -> impl Future<Output = ()> + '_ {
        let content = self.draft();
        async move {
            if content.trim().is_empty() {
                return;
            }

            match self.remote.create(CreateTodo { content }).await {
                Ok(todo) => {
                    tracing::debug!(id = %todo.id, "todo created");
                    self.draft.lock().clear();
                }
                Err(e) => tracing::error!(error = %e, "error creating todo"),
            }
        }
    }

    /// Ask the service to delete `id`. The item leaves the mirror only when
    /// a snapshot without it arrives.
    pub async fn delete(&self, id: Uuid) {
        match self.remote.delete(id).await {
            Ok(()) => tracing::debug!(%id, "todo deleted"),
            Err(e) => tracing::error!(%id, error = %e, "error deleting todo"),
        }
    }

    /// Release the subscription and tear the view down.
    pub fn unmount(mut self) {
        self.subscription.cancel();
    }

    /// Tear the view down, then end the session.
    pub async fn sign_out(mut self) {
        self.subscription.cancel();
        if let Err(e) = self.auth.sign_out().await {
            tracing::error!(error = %e, "error signing out");
        }
    }
}
