//! Write path: issue the request, then invalidate and notify.
//!
//! # Design
//! Updates are not optimistic. The cache is only touched after the backend
//! acknowledged the write, and then only by invalidating it; consumers see
//! the change once the re-fetch lands. A failed write leaves the cache alone
//! and reports the error, so the caller can keep its form values for a
//! retry.
//!
//! [`Mutation`] is the per-form handle. It carries the pending flag that
//! stands in for the disabled submit button: a second submit while one is in
//! flight is rejected with [`ApiError::Pending`] before any request is made.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::QueryCache;
use crate::clock::{format_created_at, Clock};
use crate::error::{ApiError, ValidationError};
use crate::form::TodoFields;
use crate::notify::{Notification, Notifier, TODO_ADDED, TODO_COMPLETED, TODO_UPDATED};
use crate::store::RemoteStore;
use crate::types::{Todo, TodoId, TodoPatch};

/// A write against the todo collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Create(Todo),
    Update { id: TodoId, patch: TodoPatch },
    Complete(TodoId),
    Delete(TodoId),
}

impl Operation {
    /// Mark `todo` as completed. Completed todos cannot be completed again.
    pub fn complete(todo: &Todo) -> Result<Self, ValidationError> {
        if todo.completed {
            return Err(ValidationError::AlreadyCompleted);
        }
        Ok(Operation::Complete(todo.id.clone()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Create(_) => "create",
            Operation::Update { .. } => "update",
            Operation::Complete(_) => "complete",
            Operation::Delete(_) => "delete",
        }
    }

    /// Success toast for this operation. Deletes are silent.
    pub fn success_message(&self) -> Option<&'static str> {
        match self {
            Operation::Create(_) => Some(TODO_ADDED),
            Operation::Update { .. } => Some(TODO_UPDATED),
            Operation::Complete(_) => Some(TODO_COMPLETED),
            Operation::Delete(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct MutationCoordinator {
    store: RemoteStore,
    cache: QueryCache,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl MutationCoordinator {
    pub fn new(
        store: RemoteStore,
        cache: QueryCache,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            cache,
            notifier,
            clock,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Build a new, not yet persisted todo from form values.
    pub fn draft(&self, fields: &TodoFields) -> Todo {
        Todo {
            id: TodoId::generate(),
            title: fields.title.clone(),
            priority: fields.priority,
            completed: false,
            created_at: format_created_at(self.clock.now()),
        }
    }

    /// New per-form handle with its own pending flag.
    pub fn mutation(&self) -> Mutation {
        Mutation {
            coordinator: self.clone(),
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run `op` against the backend. On success the cache is invalidated
    /// and the success toast (if any) is emitted; on failure the cache is
    /// left untouched and an error toast is emitted.
    pub async fn submit(&self, op: Operation) -> Result<(), ApiError> {
        let kind = op.kind();
        let message = op.success_message();
        debug!(kind, "submitting mutation");

        let result = match op {
            Operation::Create(todo) => self.store.create(&todo).await.map(drop),
            Operation::Update { id, patch } => self.store.update(&id, &patch).await.map(drop),
            Operation::Complete(id) => self
                .store
                .update(&id, &TodoPatch::complete())
                .await
                .map(drop),
            Operation::Delete(id) => self.store.delete(&id).await,
        };

        match result {
            Ok(()) => {
                info!(kind, "mutation succeeded");
                self.cache.invalidate();
                if let Some(message) = message {
                    self.notifier.notify(Notification::Success(message.to_string()));
                }
                Ok(())
            }
            Err(err) => {
                self.notifier.notify(Notification::Error(err.to_string()));
                Err(err)
            }
        }
    }
}

/// Per-form mutation handle. Clones share the pending flag.
#[derive(Clone)]
pub struct Mutation {
    coordinator: MutationCoordinator,
    pending: Arc<AtomicBool>,
}

impl Mutation {
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn coordinator(&self) -> &MutationCoordinator {
        &self.coordinator
    }

    pub async fn submit(&self, op: Operation) -> Result<(), ApiError> {
        if self.pending.swap(true, Ordering::AcqRel) {
            debug!(kind = op.kind(), "submission rejected, one already in flight");
            return Err(ApiError::Pending);
        }
        let _guard = PendingGuard(&self.pending);
        self.coordinator.submit(op).await
    }
}

/// Clears the pending flag when the submission finishes or is dropped.
struct PendingGuard<'a>(&'a AtomicBool);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    fn todo(completed: bool) -> Todo {
        Todo {
            id: TodoId::from("t1"),
            title: "Walk dog".to_string(),
            priority: Priority::High,
            completed,
            created_at: "now".to_string(),
        }
    }

    #[test]
    fn complete_refuses_completed_todo() {
        assert_eq!(
            Operation::complete(&todo(true)),
            Err(ValidationError::AlreadyCompleted)
        );
        assert_eq!(
            Operation::complete(&todo(false)),
            Ok(Operation::Complete(TodoId::from("t1")))
        );
    }

    #[test]
    fn success_messages_per_operation() {
        let id = TodoId::from("t1");
        assert_eq!(Operation::Create(todo(false)).success_message(), Some("Todo added."));
        assert_eq!(
            Operation::Update {
                id: id.clone(),
                patch: TodoPatch::edit("x", Priority::Low)
            }
            .success_message(),
            Some("Todo updated.")
        );
        assert_eq!(
            Operation::Complete(id.clone()).success_message(),
            Some("Todo marked as completed.")
        );
        assert_eq!(Operation::Delete(id).success_message(), None);
    }
}
