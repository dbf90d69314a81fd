//! Views on two sessions of one live mock server.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use todo_app::HttpCollection;
use todo_core::{ApiError, Authenticator, CreateTodo, RemoteCollection, Snapshot, TodoListView};
use tokio::sync::watch;
use uuid::Uuid;

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

async fn until(changes: &mut watch::Receiver<Snapshot>, f: impl FnMut(&Snapshot) -> bool) -> Snapshot {
    tokio::time::timeout(Duration::from_secs(5), changes.wait_for(f))
        .await
        .expect("timed out waiting for snapshot")
        .expect("subscription writer dropped")
        .clone()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sessions_see_each_others_changes() {
    let base = start_server().await;
    let alice = Arc::new(HttpCollection::sign_in(&base, "alice").await.unwrap());
    let bob = Arc::new(HttpCollection::sign_in(&base, "bob").await.unwrap());

    let alice_view = TodoListView::mount(alice.clone(), alice.clone());
    let bob_view = TodoListView::mount(bob.clone(), bob.clone());
    let mut alice_changes = alice_view.changes();
    let mut bob_changes = bob_view.changes();

    alice_view.set_draft("buy milk");
    alice_view.create().await;
    assert_eq!(alice_view.draft(), "");

    let seen = until(&mut bob_changes, |items| items.len() == 1).await;
    assert_eq!(seen[0].content, "buy milk");

    bob_view.delete(seen[0].id).await;
    until(&mut alice_changes, |items| items.is_empty()).await;
    assert!(alice_view.items().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failures_are_swallowed() {
    let base = start_server().await;
    let remote = Arc::new(HttpCollection::sign_in(&base, "carol").await.unwrap());
    let view = TodoListView::mount(remote.clone(), remote.clone());
    let mut changes = view.changes();

    view.set_draft("keep");
    view.create().await;
    until(&mut changes, |items| items.len() == 1).await;

    // unknown id: the service says 404, the view carries on
    view.delete(Uuid::nil()).await;
    assert_eq!(view.items().len(), 1);

    // blank drafts never reach the service (which would answer 422)
    view.set_draft("   ");
    view.create().await;
    assert_eq!(view.draft(), "   ");

    view.sign_out().await;

    // the token is gone: further calls on the same session are rejected
    let err = remote.create(CreateTodo::new("late")).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    let err = remote.sign_out().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_after_sign_out_keeps_draft() {
    let base = start_server().await;
    let remote = Arc::new(HttpCollection::sign_in(&base, "dave").await.unwrap());
    remote.sign_out().await.unwrap();

    let view = TodoListView::mount(remote.clone(), remote);
    view.set_draft("offline");
    view.create().await;
    assert_eq!(view.draft(), "offline");
    assert!(view.items().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sign_in_against_dead_server_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = HttpCollection::sign_in(&format!("http://{addr}"), "erin").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejected_subscribe_yields_one_error_then_ends() {
    let base = start_server().await;
    let remote = HttpCollection::sign_in(&base, "frank").await.unwrap();
    remote.sign_out().await.unwrap();

    let mut stream = remote.subscribe();
    let first = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("timed out waiting for the rejection");
    assert!(matches!(first, Some(Err(ApiError::Unauthorized))), "{first:?}");
    assert!(stream.next().await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn view_outlives_a_rejected_subscription() {
    let base = start_server().await;
    let remote = Arc::new(HttpCollection::sign_in(&base, "grace").await.unwrap());
    remote.sign_out().await.unwrap();

    let view = TodoListView::mount(remote.clone(), remote);
    tokio::time::timeout(Duration::from_secs(5), async {
        while view.is_subscribed() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscription task still running");
    assert!(view.items().is_empty());
    view.unmount();
}
