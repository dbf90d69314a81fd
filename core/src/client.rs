//! Stateless HTTP request builder and response parser for the todo service.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and, once signed in, a bearer token.
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The host executes the actual HTTP round-trip, keeping the core
//! deterministic and free of I/O dependencies. The subscription endpoint has
//! no `parse_*` counterpart: its body is a stream fed to `SnapshotDecoder`.

use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, Session, SignIn, Snapshot, Todo};

/// Synchronous, stateless client for the todo service.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
    token: Option<Uuid>,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Return a copy of this client that authenticates with `session`.
    pub fn with_session(&self, session: &Session) -> Self {
        Self {
            base_url: self.base_url.clone(),
            token: Some(session.token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_sign_in(&self, username: &str) -> Result<HttpRequest, ApiError> {
        let input = SignIn {
            username: username.to_string(),
        };
        let body = serde_json::to_string(&input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/session", self.base_url),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn build_sign_out(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}/session", self.base_url),
            headers: self.auth_headers(),
            body: None,
        }
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/todos", self.base_url),
            headers: self.auth_headers(),
            body: None,
        }
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut headers = self.auth_headers();
        headers.push(("content-type".to_string(), "application/json".to_string()));
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/todos", self.base_url),
            headers,
            body: Some(body),
        })
    }

    pub fn build_delete_todo(&self, id: Uuid) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}/todos/{id}", self.base_url),
            headers: self.auth_headers(),
            body: None,
        }
    }

    /// Build the long-lived request whose body is a stream of snapshot events.
    pub fn build_subscribe(&self) -> HttpRequest {
        let mut headers = self.auth_headers();
        headers.push(("accept".to_string(), "text/event-stream".to_string()));
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/todos/subscribe", self.base_url),
            headers,
            body: None,
        }
    }

    pub fn parse_sign_in(&self, response: HttpResponse) -> Result<Session, ApiError> {
        check_status(&response, 201)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    pub fn parse_sign_out(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Snapshot, ApiError> {
        check_status(&response, 200)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        check_status(&response, 201)?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    /// Validate the status line of a subscription response before its body
    /// is handed to the decoder.
    pub fn check_subscribe(&self, response: &HttpResponse) -> Result<(), ApiError> {
        check_status(response, 200)
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        match self.token {
            Some(token) => vec![("authorization".to_string(), format!("Bearer {token}"))],
            None => Vec::new(),
        }
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    match response.status {
        s if s == expected => Ok(()),
        401 => Err(ApiError::Unauthorized),
        404 => Err(ApiError::NotFound),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}
