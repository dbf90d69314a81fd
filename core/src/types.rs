//! Domain DTOs for the todo service.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single todo item. The id is assigned by the service and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: Uuid,
    pub content: String,
}

/// The complete ordered collection as delivered by one subscription push.
pub type Snapshot = Vec<Todo>;

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateTodo {
    pub content: String,
}

impl CreateTodo {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Request payload for opening a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignIn {
    pub username: String,
}

/// An authenticated session. The token is sent as a bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub token: Uuid,
    pub username: String,
}
