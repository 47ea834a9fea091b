//! Remote content store.
//!
//! [`ContentStore`] is the seam between reconciliation logic and the BI
//! platform's REST API. Implementations:
//!
//! - [`HttpContentStore`] - reqwest client against `<host>/api/<version>`
//! - `MemoryStore` (tests only) - in-process store recording every call
//!
//! Store methods return [`StoreError`]; callers go through [`Remote`], which
//! turns those into crate errors and reports them to the operator in one
//! place.

mod http;
#[cfg(test)]
pub(crate) mod memory;
mod remote;

pub use http::HttpContentStore;
pub use remote::Remote;

use serde::Serialize;

use crate::model::Attrs;

/// Criteria for `GET /looks/search`.
///
/// `deleted: None` lets the store apply its default, which only returns
/// Looks that are not in the trash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LookSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

impl LookSearch {
    #[must_use]
    pub fn by_slug(slug: &str) -> Self {
        Self {
            slug: Some(slug.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_title(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_folder(mut self, folder_id: Option<&str>) -> Self {
        self.folder_id = folder_id.map(String::from);
        self
    }

    #[must_use]
    pub fn in_trash(mut self) -> Self {
        self.deleted = Some(true);
        self
    }
}

/// Which color collections to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionScope {
    /// Standard and custom collections.
    All,
    /// Only user-created (deletable) collections.
    Custom,
}

/// Errors reported by a content store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The addressed object does not exist.
    #[error("{resource}({id}) not found")]
    NotFound { resource: &'static str, id: String },

    /// Any other failure: transport, authentication, validation.
    #[error("{message}")]
    Remote {
        /// HTTP status, when the failure came from a response.
        status: Option<u16>,
        message: String,
    },
}

impl StoreError {
    #[must_use]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            status: None,
            message: message.into(),
        }
    }
}

/// Result type for store calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Operations the reconciliation core needs from the remote instance.
///
/// Calls are blocking round-trips. Write calls are never retried here.
pub trait ContentStore {
    /// Fetch a Look with its embedded query.
    fn look(&self, id: &str) -> StoreResult<Attrs>;

    /// Search Looks; ordering is whatever the store returns.
    fn search_looks(&self, criteria: &LookSearch) -> StoreResult<Vec<Attrs>>;

    fn create_look(&self, body: &Attrs) -> StoreResult<Attrs>;

    fn update_look(&self, id: &str, body: &Attrs) -> StoreResult<Attrs>;

    /// Permanently delete a Look.
    fn delete_look(&self, id: &str) -> StoreResult<()>;

    fn create_query(&self, body: &Attrs) -> StoreResult<Attrs>;

    fn create_merge_query(&self, body: &Attrs) -> StoreResult<Attrs>;

    /// Scheduled plans attached to a Look, optionally for every user.
    fn scheduled_plans_for_look(&self, look_id: &str, all_users: bool)
    -> StoreResult<Vec<Attrs>>;

    fn color_collections(&self, scope: CollectionScope) -> StoreResult<Vec<Attrs>>;

    fn create_color_collection(&self, body: &Attrs) -> StoreResult<Attrs>;

    /// The user the session is authenticated as.
    fn me(&self) -> StoreResult<Attrs>;

    /// Fetch a user, optionally limited to a comma-separated field list.
    fn user(&self, id: &str, fields: Option<&str>) -> StoreResult<Attrs>;
}
