//! Client configuration and wiring.

use std::sync::Arc;

use tracing::info;

use crate::cache::QueryCache;
use crate::client::TodoClient;
use crate::clock::{Clock, SystemClock};
use crate::error::ValidationError;
use crate::form::{AddForm, EditForm};
use crate::mutation::{Mutation, MutationCoordinator};
use crate::notify::{Notifier, TracingNotifier};
use crate::store::RemoteStore;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::Todo;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const BASE_URL_ENV: &str = "TODO_API_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Default config, with the base URL taken from `TODO_API_URL` when set
    /// and non-empty.
    pub fn from_env() -> Self {
        Self::with_base_url_override(std::env::var(BASE_URL_ENV).ok())
    }

    fn with_base_url_override(url: Option<String>) -> Self {
        match url {
            Some(url) if !url.trim().is_empty() => Self {
                base_url: url.trim().to_string(),
            },
            _ => Self::default(),
        }
    }
}

/// The assembled sync module: one cache and one coordinator sharing a
/// remote store.
#[derive(Clone)]
pub struct TodoSync {
    cache: QueryCache,
    coordinator: MutationCoordinator,
}

impl TodoSync {
    /// Production wiring: reqwest transport, wall clock, logged toasts.
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(ReqwestTransport::new()),
            Arc::new(SystemClock),
            Arc::new(TracingNotifier),
        )
    }

    pub fn with_parts(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        info!(base_url = %config.base_url, "todo sync configured");
        let store = RemoteStore::new(TodoClient::new(&config.base_url), transport);
        let cache = QueryCache::new(store.clone(), Arc::clone(&clock));
        let coordinator = MutationCoordinator::new(store, cache.clone(), notifier, clock);
        Self { cache, coordinator }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn coordinator(&self) -> &MutationCoordinator {
        &self.coordinator
    }

    pub fn mutation(&self) -> Mutation {
        self.coordinator.mutation()
    }

    pub fn add_form(&self) -> AddForm {
        AddForm::new(self.mutation())
    }

    pub fn edit_form(&self, todo: &Todo) -> Result<EditForm, ValidationError> {
        EditForm::open(todo, self.mutation())
    }
}
