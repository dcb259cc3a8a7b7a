//! Remote store: one `TodoClient` request per call, executed over a
//! `Transport`.
//!
//! No retries, no error interpretation. Whatever the transport or the
//! status check reports is handed back to the caller as-is.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::types::{Todo, TodoId, TodoPatch};

#[derive(Clone)]
pub struct RemoteStore {
    client: TodoClient,
    transport: Arc<dyn Transport>,
}

impl RemoteStore {
    pub fn new(client: TodoClient, transport: Arc<dyn Transport>) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    pub async fn list(&self) -> Result<Vec<Todo>, ApiError> {
        let response = self.send(self.client.build_list_todos()).await?;
        let todos = self.client.parse_list_todos(response).inspect_err(log_failure)?;
        debug!(count = todos.len(), "listed todos");
        Ok(todos)
    }

    pub async fn create(&self, todo: &Todo) -> Result<Todo, ApiError> {
        let request = self.client.build_create_todo(todo)?;
        let response = self.send(request).await?;
        self.client.parse_create_todo(response).inspect_err(log_failure)
    }

    pub async fn update(&self, id: &TodoId, patch: &TodoPatch) -> Result<Todo, ApiError> {
        let request = self.client.build_update_todo(id, patch)?;
        let response = self.send(request).await?;
        self.client.parse_update_todo(response).inspect_err(log_failure)
    }

    pub async fn delete(&self, id: &TodoId) -> Result<(), ApiError> {
        let response = self.send(self.client.build_delete_todo(id)).await?;
        self.client.parse_delete_todo(response).inspect_err(log_failure)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, path = %request.path, "sending request");
        self.transport.execute(request).await.inspect_err(log_failure)
    }
}

impl std::fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStore")
            .field("base_url", &self.client.base_url())
            .finish_non_exhaustive()
    }
}

fn log_failure(err: &ApiError) {
    warn!(error = %err, "todo API request failed");
}
