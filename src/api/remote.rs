//! Error decoration at the store boundary.
//!
//! Every store call made by the core goes through [`Remote::read`] or
//! [`Remote::write`]. A failure is reported to the operator (the context
//! line, then the store's message), traced, and converted to the matching
//! crate error. Nothing is retried or swallowed.

use tracing::debug;

use super::{ContentStore, StoreError, StoreResult};
use crate::error::{Error, Result};
use crate::output::Messenger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

/// A content store paired with the messenger that hears about its failures.
#[derive(Clone, Copy)]
pub struct Remote<'a> {
    store: &'a dyn ContentStore,
    out: &'a dyn Messenger,
}

impl<'a> Remote<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ContentStore, out: &'a dyn Messenger) -> Self {
        Self { store, out }
    }

    /// The messenger used for operator output.
    #[must_use]
    pub fn out(&self) -> &'a dyn Messenger {
        self.out
    }

    /// Run a read; failures become [`Error::RemoteQuery`] or
    /// [`Error::NotFound`].
    ///
    /// `context` is only rendered on failure.
    ///
    /// # Errors
    ///
    /// Returns the decorated store error.
    pub fn read<T>(
        &self,
        context: impl FnOnce() -> String,
        call: impl FnOnce(&dyn ContentStore) -> StoreResult<T>,
    ) -> Result<T> {
        call(self.store).map_err(|e| self.decorate(Access::Read, context, e))
    }

    /// Run a create/update/delete; failures become [`Error::RemoteWrite`]
    /// or [`Error::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns the decorated store error.
    pub fn write<T>(
        &self,
        context: impl FnOnce() -> String,
        call: impl FnOnce(&dyn ContentStore) -> StoreResult<T>,
    ) -> Result<T> {
        call(self.store).map_err(|e| self.decorate(Access::Write, context, e))
    }

    fn decorate(&self, access: Access, context: impl FnOnce() -> String, err: StoreError) -> Error {
        match err {
            StoreError::NotFound { resource, id } => {
                debug!(resource, id = %id, "remote object not found");
                self.out.error(&format!("{resource}({id}) not found"));
                Error::NotFound {
                    resource: resource.to_string(),
                    id,
                }
            }
            StoreError::Remote { status, message } => {
                let context = context();
                debug!(?status, context = %context, error = %message, "remote call failed");
                self.out.error(&context);
                self.out.error(&message);
                match access {
                    Access::Read => Error::RemoteQuery { context, message },
                    Access::Write => Error::RemoteWrite { context, message },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryStore;
    use crate::output::{Level, Transcript};

    #[test]
    fn test_not_found_is_reported_and_typed() {
        let store = MemoryStore::new();
        let out = Transcript::new();
        let remote = Remote::new(&store, &out);

        let err = remote
            .read(|| "Error querying look(12)".to_string(), |s| s.look("12"))
            .unwrap_err();

        assert!(matches!(err, Error::NotFound { ref resource, ref id } if resource == "look" && id == "12"));
        assert_eq!(out.texts(Level::Error), vec!["look(12) not found"]);
    }

    #[test]
    fn test_read_failure_becomes_remote_query() {
        let store = MemoryStore::new();
        store.fail_with("503 Service Unavailable");
        let out = Transcript::new();
        let remote = Remote::new(&store, &out);

        let err = remote
            .read(|| "Error searching".to_string(), |s| s.search_looks(&Default::default()))
            .unwrap_err();

        assert!(matches!(err, Error::RemoteQuery { .. }));
        assert_eq!(
            out.texts(Level::Error),
            vec!["Error searching", "503 Service Unavailable"]
        );
    }

    #[test]
    fn test_write_failure_becomes_remote_write() {
        let store = MemoryStore::new();
        store.fail_with("422 Validation Failed");
        let out = Transcript::new();
        let remote = Remote::new(&store, &out);

        let err = remote
            .write(|| "Error creating look".to_string(), |s| s.create_look(&Default::default()))
            .unwrap_err();

        assert!(matches!(err, Error::RemoteWrite { ref message, .. } if message == "422 Validation Failed"));
    }

    #[test]
    fn test_success_passes_through_silently() {
        let store = MemoryStore::new();
        let out = Transcript::new();
        let remote = Remote::new(&store, &out);

        let me = remote.read(|| unreachable!(), |s| s.me()).unwrap();

        assert!(me.contains_key("id"));
        assert!(out.messages().is_empty());
    }
}
