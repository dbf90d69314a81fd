//! Scoped ownership of a running subscription.

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::remote::SnapshotStream;
use crate::types::Snapshot;

/// Handle to the task that drains a snapshot stream into a mirror.
///
/// The task is aborted when the handle is cancelled or dropped, so the
/// mirror has no writer once its owner is gone.
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Spawn the drain task. Must be called inside a tokio runtime.
    pub fn spawn(stream: SnapshotStream, mirror: watch::Sender<Snapshot>) -> Self {
        let task = tokio::spawn(drain(stream, mirror));
        Self { task: Some(task) }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop receiving snapshots. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("subscription released");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn drain(mut stream: SnapshotStream, mirror: watch::Sender<Snapshot>) {
    while let Some(next) = stream.next().await {
        match next {
            Ok(snapshot) => {
                tracing::debug!(items = snapshot.len(), "snapshot received");
                mirror.send_replace(snapshot);
            }
            Err(e) => tracing::error!(error = %e, "subscription error"),
        }
    }
    tracing::warn!("subscription stream ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Todo;
    use futures::stream;
    use uuid::Uuid;

    fn todo(n: u128, content: &str) -> Todo {
        Todo {
            id: Uuid::from_u128(n),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn last_snapshot_wins() {
        let (tx, mut rx) = watch::channel(Vec::new());
        let snapshots = vec![
            Ok(vec![todo(1, "a"), todo(2, "b")]),
            Ok(vec![todo(2, "b")]),
            Ok(vec![todo(3, "c")]),
        ];
        let mut sub = Subscription::spawn(stream::iter(snapshots).boxed(), tx);

        rx.wait_for(|items| items.first().map(|t| t.content.as_str()) == Some("c"))
            .await
            .unwrap();
        assert_eq!(*rx.borrow(), vec![todo(3, "c")]);
        sub.cancel();
        assert!(!sub.is_active());
    }

    #[tokio::test]
    async fn errors_do_not_stop_the_drain() {
        let (tx, mut rx) = watch::channel(Vec::new());
        let items = vec![
            Err(crate::ApiError::StreamClosed),
            Ok(vec![todo(1, "after error")]),
        ];
        let _sub = Subscription::spawn(stream::iter(items).boxed(), tx);

        rx.wait_for(|items| !items.is_empty()).await.unwrap();
        assert_eq!(rx.borrow()[0].content, "after error");
    }

    #[tokio::test]
    async fn drop_aborts_pending_stream() {
        let (tx, mut rx) = watch::channel(Vec::new());
        let sub = Subscription::spawn(stream::pending().boxed(), tx);
        assert!(sub.is_active());
        drop(sub);
        // the aborted task dropped the only sender
        assert!(rx.changed().await.is_err());
    }
}
