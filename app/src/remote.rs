//! `RemoteCollection` over HTTP.
//!
//! # Design
//! `TodoClient` still builds every request and parses every response; this
//! module only executes them with reqwest. The subscription body is read as
//! a byte stream and decoded by `SnapshotDecoder`. A rejected subscribe
//! yields its error as the only item; a dropped connection ends the stream.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use todo_core::{
    ApiError, Authenticator, CreateTodo, HttpMethod, HttpRequest, HttpResponse, RemoteCollection,
    Session, SnapshotDecoder, SnapshotStream, Todo, TodoClient,
};
use uuid::Uuid;

/// A signed-in session against the todo service.
#[derive(Debug, Clone)]
pub struct HttpCollection {
    http: reqwest::Client,
    client: TodoClient,
    session: Session,
}

impl HttpCollection {
    /// Open a session for `username`.
    pub async fn sign_in(base_url: &str, username: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::new();
        let anonymous = TodoClient::new(base_url);
        let req = anonymous.build_sign_in(username)?;
        let session = anonymous.parse_sign_in(execute(&http, &req).await?)?;
        tracing::info!(username = %session.username, "signed in");
        Ok(Self {
            client: anonymous.with_session(&session),
            http,
            session,
        })
    }
}

#[async_trait]
impl RemoteCollection for HttpCollection {
    fn subscribe(&self) -> SnapshotStream {
        let request = prepare(&self.http, &self.client.build_subscribe());
        let client = self.client.clone();

        stream::once(async move {
            let response = request.send().await.map_err(transport)?;
            let status = response.status().as_u16();
            if status == 200 {
                return Ok::<_, ApiError>(response.bytes_stream());
            }
            let body = response.text().await.unwrap_or_default();
            let rejected = HttpResponse::new(status, body);
            client.check_subscribe(&rejected)?;
            Err(ApiError::HttpError {
                status,
                body: rejected.body,
            })
        })
        .map(|opened| match opened {
            Ok(body) => {
                let mut decoder = SnapshotDecoder::new();
                body.flat_map(move |chunk| {
                    let frames = match chunk {
                        Ok(bytes) => decoder.push(&bytes),
                        Err(e) => vec![Err(transport(e))],
                    };
                    stream::iter(frames)
                })
                .boxed()
            }
            Err(e) => stream::iter(vec![Err(e)]).boxed(),
        })
        .flatten()
        .boxed()
    }

    async fn create(&self, input: CreateTodo) -> Result<Todo, ApiError> {
        let req = self.client.build_create_todo(&input)?;
        self.client.parse_create_todo(execute(&self.http, &req).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let req = self.client.build_delete_todo(id);
        self.client.parse_delete_todo(execute(&self.http, &req).await?)
    }
}

#[async_trait]
impl Authenticator for HttpCollection {
    async fn sign_out(&self) -> Result<(), ApiError> {
        let req = self.client.build_sign_out();
        self.client.parse_sign_out(execute(&self.http, &req).await?)?;
        tracing::info!(username = %self.session.username, "signed out");
        Ok(())
    }
}

fn prepare(http: &reqwest::Client, req: &HttpRequest) -> reqwest::RequestBuilder {
    let method = match req.method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Delete => reqwest::Method::DELETE,
    };
    let mut builder = http.request(method, &req.path);
    for (k, v) in &req.headers {
        builder = builder.header(k.as_str(), v.as_str());
    }
    if let Some(body) = &req.body {
        builder = builder.body(body.clone());
    }
    builder
}

async fn execute(http: &reqwest::Client, req: &HttpRequest) -> Result<HttpResponse, ApiError> {
    let response = prepare(http, req).send().await.map_err(transport)?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(transport)?;
    Ok(HttpResponse::new(status, body))
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}
