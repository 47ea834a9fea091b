//! Portable Look snapshots.

use serde_json::Value;

use super::fields::project_keeping;
use super::palette::PaletteRewriter;
use crate::api::Remote;
use crate::error::Result;
use crate::model::Attrs;

/// Fetch a Look for export.
///
/// Palette references the destination cannot resolve are inlined. With
/// `with_plans`, the Look's scheduled plans (of every user) are attached as
/// `scheduled_plans`.
///
/// # Errors
///
/// Returns [`Error::NotFound`](crate::Error::NotFound) for an unknown Look
/// and remote errors from any read.
pub fn cat_look(remote: Remote<'_>, id: &str, with_plans: bool) -> Result<Attrs> {
    let mut look = remote.read(|| format!("Error querying look({id})"), |s| s.look(id))?;

    PaletteRewriter::new(remote).canonicalize(&mut look)?;

    if with_plans {
        let plans = remote.read(
            || format!("Error querying scheduled plans for look({id})"),
            |s| s.scheduled_plans_for_look(id, true),
        )?;
        look.insert(
            "scheduled_plans".to_string(),
            Value::Array(plans.into_iter().map(Value::Object).collect()),
        );
    }
    Ok(look)
}

/// Cut an exported Look down to the fields an import can write.
///
/// Keeps the Look's and its query's ids for reference. Does not touch the
/// store.
///
/// # Errors
///
/// Only fails if an allow-list is missing, which is a bug.
pub fn trim(data: &Attrs) -> Result<Attrs> {
    let mut trimmed = project_keeping(data, "update_look", &["id"])?;

    if let Some(query) = data.get("query").and_then(Value::as_object) {
        trimmed.insert(
            "query".to_string(),
            Value::Object(project_keeping(query, "create_query", &["id"])?),
        );
    }

    if let Some(plans) = data.get("scheduled_plans").and_then(Value::as_array) {
        let plans = plans
            .iter()
            .filter_map(Value::as_object)
            .map(|plan| project_keeping(plan, "create_scheduled_plan", &["id"]).map(Value::Object))
            .collect::<Result<Vec<_>>>()?;
        trimmed.insert("scheduled_plans".to_string(), Value::Array(plans));
    }

    Ok(trimmed)
}
