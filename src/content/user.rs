//! User export.

use super::fields::project_keeping;
use crate::api::Remote;
use crate::error::{Error, Result};
use crate::model::{Attrs, id_of};

/// Id of the user the session belongs to.
///
/// # Errors
///
/// Returns a remote error if the user cannot be read.
pub fn current_user_id(remote: Remote<'_>) -> Result<String> {
    let me = remote.read(|| "Error querying current user".to_string(), |s| s.me())?;
    id_of(&me).ok_or_else(|| Error::Other("current user has no id".to_string()))
}

/// Fetch a user, optionally limited to a comma-separated field list.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for an unknown user and remote errors.
pub fn cat_user(remote: Remote<'_>, id: &str, fields: Option<&str>) -> Result<Attrs> {
    remote.read(|| format!("Error querying user({id})"), |s| s.user(id, fields))
}

/// Cut a user down to its writable fields plus `id`.
///
/// # Errors
///
/// Only fails if the allow-list is missing.
pub fn trim_user(user: &Attrs) -> Result<Attrs> {
    project_keeping(user, "update_user", &["id"])
}
