//! In-memory backend speaking the todo REST contract, plus wiring helpers.
//!
//! The backend records every request, can be told to fail the next N
//! requests, and can hold responses behind a gate so tests can observe
//! in-flight state. Responses are computed *before* waiting on the gate, so
//! a held request reflects the backend state at the time it arrived.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use todo_core::{
    ApiError, ChannelNotifier, ClientConfig, FixedClock, HttpMethod, HttpRequest, HttpResponse,
    Notification, Priority, Todo, TodoId, TodoSync, Transport,
};

pub const BASE_URL: &str = "http://fake";

#[derive(Debug, Clone)]
pub enum Failure {
    Transport,
    Status(u16),
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<String>,
}

pub struct FakeBackend {
    todos: Mutex<Vec<Todo>>,
    log: Mutex<Vec<Recorded>>,
    failures: Mutex<VecDeque<Failure>>,
    gate: watch::Sender<bool>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Self::with_todos(Vec::new())
    }

    pub fn with_todos(todos: Vec<Todo>) -> Arc<Self> {
        let (gate, _) = watch::channel(true);
        Arc::new(Self {
            todos: Mutex::new(todos),
            log: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            gate,
        })
    }

    /// Hold every response until `release`.
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    pub fn fail_next(&self, failure: Failure) {
        self.failures.lock().push_back(failure);
    }

    pub fn insert(&self, todo: Todo) {
        self.todos.lock().push(todo);
    }

    pub fn todos(&self) -> Vec<Todo> {
        self.todos.lock().clone()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().clone()
    }

    pub fn count(&self, method: HttpMethod) -> usize {
        self.log.lock().iter().filter(|r| r.method == method).count()
    }

    fn respond(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        match self.failures.lock().pop_front() {
            Some(Failure::Transport) => {
                return Err(ApiError::Transport("connection refused".to_string()))
            }
            Some(Failure::Status(status)) => return Ok(response(status, "backend failure")),
            None => {}
        }

        let path = request.path.strip_prefix(BASE_URL).unwrap_or(&request.path);
        let id = path.strip_prefix("/todos/");
        let mut todos = self.todos.lock();

        Ok(match (request.method, id) {
            (HttpMethod::Get, None) => response(200, &serde_json::to_string(&*todos).unwrap()),
            (HttpMethod::Post, None) => {
                let todo: Todo = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
                todos.push(todo.clone());
                response(201, &serde_json::to_string(&todo).unwrap())
            }
            (HttpMethod::Patch, Some(id)) => {
                let Some(todo) = todos.iter_mut().find(|t| t.id.as_str() == id) else {
                    return Ok(response(404, ""));
                };
                let patch: serde_json::Value =
                    serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
                if let Some(title) = patch.get("title").and_then(|v| v.as_str()) {
                    todo.title = title.to_string();
                }
                if let Some(priority) = patch.get("priority").and_then(|v| v.as_str()) {
                    todo.priority = priority.parse().unwrap();
                }
                if let Some(completed) = patch.get("completed").and_then(|v| v.as_bool()) {
                    todo.completed = completed;
                }
                response(200, &serde_json::to_string(&*todo).unwrap())
            }
            (HttpMethod::Delete, Some(id)) => match todos.iter().position(|t| t.id.as_str() == id) {
                Some(index) => {
                    todos.remove(index);
                    response(204, "")
                }
                None => response(404, ""),
            },
            _ => response(405, ""),
        })
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.log.lock().push(Recorded {
            method: request.method,
            path: request.path.clone(),
            body: request.body.clone(),
        });
        let result = self.respond(&request);

        let mut gate = self.gate.subscribe();
        loop {
            let open = *gate.borrow_and_update();
            if open || gate.changed().await.is_err() {
                break;
            }
        }
        result
    }
}

fn response(status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: body.to_string(),
    }
}

pub fn todo(id: &str, title: &str) -> Todo {
    Todo {
        id: TodoId::from(id),
        title: title.to_string(),
        priority: Priority::Low,
        completed: false,
        created_at: "Sat, 17 Oct 2026 09:00:00 GMT".to_string(),
    }
}

/// Sync module over `backend`, with a fixed clock and a notification
/// channel the test can drain.
pub fn wire(backend: &Arc<FakeBackend>) -> (TodoSync, mpsc::UnboundedReceiver<Notification>) {
    let (notifier, rx) = ChannelNotifier::new();
    let clock = FixedClock(Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap());
    let config = ClientConfig {
        base_url: BASE_URL.to_string(),
    };
    let sync = TodoSync::with_parts(
        &config,
        backend.clone(),
        Arc::new(clock),
        Arc::new(notifier),
    );
    (sync, rx)
}
