//! Client core for the live todo list.
//!
//! # Overview
//! Two halves. `TodoClient` builds `HttpRequest` values and parses
//! `HttpResponse` values without touching the network (host-does-IO
//! pattern), and `SnapshotDecoder` turns the subscription body into
//! snapshots. `TodoListView` keeps a local mirror of the remote collection
//! behind the `RemoteCollection` seam and forwards create/delete intents.
//!
//! # Design
//! - `TodoClient` is stateless apart from the session token.
//! - The mirror has a single writer, the subscription task owned by
//!   `Subscription`; mutations never update it directly.
//! - Remote failures inside the view are logged through `tracing` and
//!   swallowed.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod remote;
pub mod stream;
pub mod subscription;
pub mod types;
pub mod view;

pub use client::TodoClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use memory::InMemoryCollection;
pub use remote::{Authenticator, RemoteCollection, SnapshotStream};
pub use stream::SnapshotDecoder;
pub use subscription::Subscription;
pub use types::{CreateTodo, Session, SignIn, Snapshot, Todo};
pub use view::TodoListView;
