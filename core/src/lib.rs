//! Client-side data synchronization for the todo service.
//!
//! # Overview
//! Keeps a local view of the remote todo list consistent with the writes the
//! user makes through forms. The backend is the only source of truth: every
//! successful write invalidates the cached list and the next read re-fetches
//! it.
//!
//! # Design
//! - `TodoClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network; a `Transport` does the I/O.
//! - `RemoteStore` issues one request per operation, no retries.
//! - `QueryCache` holds the single `"todos"` entry, serves stale data during
//!   refreshes and collapses concurrent fetches into one request.
//! - `MutationCoordinator` runs write, then invalidate, then notify.
//! - `AddForm` / `EditForm` hold unsent values, validate before submitting,
//!   and keep their values when a submission fails.

pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod form;
pub mod http;
pub mod mutation;
pub mod notify;
pub mod store;
pub mod transport;
pub mod types;
pub mod view;

pub use cache::{CacheEvent, QueryCache, Snapshot, Subscription, CACHE_KEY};
pub use client::TodoClient;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ClientConfig, TodoSync};
pub use error::{ApiError, ValidationError};
pub use form::{complete_todo, AddForm, EditForm, Field, FormState, TodoFields};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mutation::{Mutation, MutationCoordinator, Operation};
pub use notify::{ChannelNotifier, Notification, Notifier, TracingNotifier};
pub use store::RemoteStore;
pub use transport::{ReqwestTransport, Transport};
pub use types::{Priority, Todo, TodoId, TodoPatch, TITLE_MIN_LEN};
pub use view::{ListView, TodoRow};
