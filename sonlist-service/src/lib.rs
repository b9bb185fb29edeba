//! Item service for sonlist.
//!
//! The single orchestration layer between transport glue and storage. Each
//! operation runs the same pipeline: load the target and its list, evaluate
//! permissions, compile the list's schema, validate and sanitize the
//! payload, then persist through the injected [`DocumentStore`].
//!
//! [`DocumentStore`]: sonlist_storage::DocumentStore

mod config;
mod error;
mod lookup;
mod service;

pub use config::ServiceConfig;
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use service::{Created, Fetched, ItemService};
