//! Look export and import.
//!
//! - [`fields`] - per-operation field allow-lists and projection
//! - [`palette`] - color palette references in vis configs
//! - [`resolve`] - slug and title lookups with a tie-break policy
//! - [`upsert`] - create-or-update reconciliation of imported Looks
//! - [`export`] - fetching and trimming Looks for export
//! - [`user`] - user export

pub mod export;
pub mod fields;
pub mod palette;
pub mod resolve;
pub mod upsert;
pub mod user;

pub use export::{cat_look, trim};
pub use fields::{project, project_keeping};
pub use palette::{PaletteRewriter, for_each_color_palette_reference};
pub use resolve::{MatchPolicy, Resolver};
pub use upsert::Reconciler;
pub use user::{cat_user, current_user_id, trim_user};

use crate::api::Remote;
use crate::error::Result;

/// Delete a Look.
///
/// # Errors
///
/// Returns [`Error::NotFound`](crate::Error::NotFound) for an unknown Look
/// and [`Error::RemoteWrite`](crate::Error::RemoteWrite) if the delete fails.
pub fn delete_look(remote: Remote<'_>, id: &str) -> Result<()> {
    remote.write(|| format!("Error deleting look({id})"), |s| s.delete_look(id))?;
    remote.out().ok(&format!("Deleted look {id}"));
    Ok(())
}
