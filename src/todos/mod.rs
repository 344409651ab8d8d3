//! Todos module - CRUD calls against the todo API
//!
//! Thin wrappers: every call goes through the [`AuthPipeline`] and the
//! server owns all todo semantics.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::auth::GenericResponse;
use crate::error::Error;
use crate::http::{ApiEndpoints, ApiRequest, ApiResponse, AuthPipeline};

/// A todo item as the server returns it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

/// Create request body
#[derive(Debug, Serialize)]
struct NewTodo<'a> {
    title: &'a str,
    description: &'a str,
    done: bool,
}

pub struct TodosService {
    pipeline: Arc<AuthPipeline>,
    endpoints: ApiEndpoints,
}

impl TodosService {
    pub fn new(pipeline: Arc<AuthPipeline>, endpoints: ApiEndpoints) -> Self {
        Self { pipeline, endpoints }
    }

    pub async fn list(&self) -> Result<Vec<Todo>> {
        self.pipeline
            .dispatch(ApiRequest::get(self.endpoints.todos()))
            .await?
            .json()
    }

    pub async fn create(&self, title: &str, description: &str, done: bool) -> Result<GenericResponse> {
        let request = ApiRequest::post(self.endpoints.todos())
            .json(&NewTodo { title, description, done })?;
        message(self.pipeline.dispatch(request).await?)
    }

    pub async fn read(&self, todo_id: &str) -> Result<Todo> {
        self.pipeline
            .dispatch(ApiRequest::get(self.endpoints.todo(todo_id)?))
            .await?
            .json()
    }

    pub async fn update(&self, todo: &Todo) -> Result<GenericResponse> {
        let id = todo
            .todo_id
            .as_deref()
            .ok_or_else(|| Error::Validation("todo has no id".to_string()))?;
        let request = ApiRequest::put(self.endpoints.todo(id)?).json(todo)?;
        message(self.pipeline.dispatch(request).await?)
    }

    pub async fn delete(&self, todo_id: &str) -> Result<GenericResponse> {
        let request = ApiRequest::delete(self.endpoints.todo(todo_id)?);
        message(self.pipeline.dispatch(request).await?)
    }
}

/// Tolerate empty bodies on mutating calls (e.g. 204 No Content)
fn message(response: ApiResponse) -> Result<GenericResponse> {
    if response.body.trim().is_empty() {
        Ok(GenericResponse::default())
    } else {
        response.json()
    }
}
