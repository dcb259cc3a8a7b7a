//! What the list area should show for a cache snapshot.

use crate::cache::Snapshot;
use crate::types::{Priority, Todo, TodoId};

pub const LOADING_MESSAGE: &str = "Loading...";
pub const EMPTY_MESSAGE: &str = "No todos, please add one!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Loading,
    /// Blocking error shown in place of the list.
    Failed(String),
    Empty,
    Items(Vec<TodoRow>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRow {
    pub id: TodoId,
    pub title: String,
    pub priority: Priority,
    pub completed: bool,
    pub can_edit: bool,
    pub can_complete: bool,
}

impl From<&Todo> for TodoRow {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id.clone(),
            title: todo.title.clone(),
            priority: todo.priority,
            completed: todo.completed,
            can_edit: !todo.completed,
            can_complete: !todo.completed,
        }
    }
}

impl ListView {
    /// Loading wins while there is nothing to show, then errors, then data.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        if snapshot.is_loading {
            return ListView::Loading;
        }
        if let Some(err) = &snapshot.error {
            return ListView::Failed(err.to_string());
        }
        match &snapshot.data {
            Some(todos) if !todos.is_empty() => {
                ListView::Items(todos.iter().map(TodoRow::from).collect())
            }
            Some(_) => ListView::Empty,
            None => ListView::Loading,
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            ListView::Loading => Some(LOADING_MESSAGE.to_string()),
            ListView::Failed(msg) => Some(format!("Something went wrong: {msg}")),
            ListView::Empty => Some(EMPTY_MESSAGE.to_string()),
            ListView::Items(_) => None,
        }
    }
}
