//! Seams between the view and the service that owns the collection.
//!
//! The view never talks HTTP itself. Anything that can push snapshots and
//! accept create/delete requests can back it: `HttpCollection` in the app
//! crate, `InMemoryCollection` for local runs, scripted fakes in tests.

use async_trait::async_trait;
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::error::ApiError;
use crate::types::{CreateTodo, Snapshot, Todo};

/// Stream of full snapshots: the current collection first, then one per change.
pub type SnapshotStream = BoxStream<'static, Result<Snapshot, ApiError>>;

/// The remote, authoritative todo collection.
#[async_trait]
pub trait RemoteCollection: Send + Sync + 'static {
    /// Open a subscription. The stream ends only when the service rejects
    /// the subscription or the connection is lost; it is not reopened.
    /// Dropping it releases the subscription on the service side.
    fn subscribe(&self) -> SnapshotStream;

    /// Create a todo. The service assigns the id.
    async fn create(&self, input: CreateTodo) -> Result<Todo, ApiError>;

    /// Delete the todo with `id`. Unknown ids fail with `NotFound`.
    async fn delete(&self, id: Uuid) -> Result<(), ApiError>;
}

/// Ends the authenticated session the collection was opened with.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    async fn sign_out(&self) -> Result<(), ApiError>;
}
