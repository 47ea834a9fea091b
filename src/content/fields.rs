//! Field allow-lists and projection.
//!
//! The remote API rejects (or silently misapplies) fields it does not accept
//! for an operation, and some accepted fields are instance-specific. Every
//! payload sent to the store, and every portable export, is therefore cut
//! down to the fields registered for the operation at hand.
//!
//! The table below is data: one entry per operation of API
//! [`API_VERSION`], built into a lookup registry on first use and never
//! modified afterwards.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::model::Attrs;

/// API version the allow-lists describe.
pub const API_VERSION: &str = "4.0";

/// Writable fields per operation.
const ALLOW_LISTS: &[(&str, &[&str])] = &[
    (
        "create_look",
        &[
            "title",
            "slug",
            "description",
            "is_run_on_load",
            "public",
            "deleted",
            "user_id",
            "query_id",
            "folder_id",
            "space_id",
        ],
    ),
    (
        "update_look",
        &[
            "title",
            "slug",
            "description",
            "is_run_on_load",
            "public",
            "deleted",
            "user_id",
            "query_id",
            "folder_id",
            "space_id",
        ],
    ),
    (
        "create_query",
        &[
            "model",
            "view",
            "fields",
            "pivots",
            "fill_fields",
            "filters",
            "filter_expression",
            "sorts",
            "limit",
            "column_limit",
            "total",
            "row_total",
            "subtotals",
            "vis_config",
            "filter_config",
            "visible_ui_sections",
            "dynamic_fields",
            "client_id",
            "query_timezone",
        ],
    ),
    (
        "create_merge_query",
        &[
            "client_id",
            "column_limit",
            "dynamic_fields",
            "pivots",
            "sorts",
            "source_queries",
            "total",
            "vis_config",
        ],
    ),
    (
        "create_scheduled_plan",
        &[
            "name",
            "user_id",
            "run_as_recipient",
            "enabled",
            "look_id",
            "dashboard_id",
            "lookml_dashboard_id",
            "filters_string",
            "dashboard_filters",
            "require_results",
            "require_no_results",
            "require_change",
            "send_all_results",
            "crontab",
            "datagroup",
            "timezone",
            "query_id",
            "scheduled_plan_destination",
            "run_once",
            "include_links",
            "custom_url_base",
            "custom_url_params",
            "custom_url_label",
            "show_custom_url",
            "pdf_paper_size",
            "pdf_landscape",
            "embed",
            "color_theme",
            "long_tables",
            "inline_table_width",
        ],
    ),
    (
        "create_color_collection",
        &[
            "label",
            "categoricalPalettes",
            "sequentialPalettes",
            "divergingPalettes",
        ],
    ),
    (
        "update_user",
        &[
            "first_name",
            "last_name",
            "home_folder_id",
            "is_disabled",
            "locale",
            "models_dir_validated",
            "ui_state",
        ],
    ),
];

static REGISTRY: LazyLock<FieldRegistry> =
    LazyLock::new(|| FieldRegistry::from_table(API_VERSION, ALLOW_LISTS));

/// Process-wide allow-list registry.
#[must_use]
pub fn registry() -> &'static FieldRegistry {
    &REGISTRY
}

/// Operation name to allowed field names.
#[derive(Debug)]
pub struct FieldRegistry {
    version: &'static str,
    operations: HashMap<&'static str, HashSet<&'static str>>,
}

impl FieldRegistry {
    /// Build a registry from a static table.
    #[must_use]
    pub fn from_table(version: &'static str, table: &[(&'static str, &[&'static str])]) -> Self {
        let operations = table
            .iter()
            .map(|(op, fields)| (*op, fields.iter().copied().collect()))
            .collect();
        Self {
            version,
            operations,
        }
    }

    /// API version of this registry.
    #[must_use]
    pub fn version(&self) -> &'static str {
        self.version
    }

    /// Fields allowed for `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOperation`] for an unregistered operation.
    pub fn allowed(&self, operation: &str) -> Result<&HashSet<&'static str>> {
        self.operations
            .get(operation)
            .ok_or_else(|| Error::UnknownOperation(operation.to_string()))
    }

    /// Keys of `source` allowed for `operation`, minus `exclude`.
    ///
    /// Key order follows `source`. `source` is not modified.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOperation`] for an unregistered operation.
    pub fn project(&self, source: &Attrs, operation: &str, exclude: &[&str]) -> Result<Attrs> {
        let allowed = self.allowed(operation)?;
        Ok(select(source, |key| {
            allowed.contains(key) && !exclude.contains(&key)
        }))
    }

    /// Keys of `source` allowed for `operation`, plus the `keep` keys.
    ///
    /// Used for export snapshots, which carry identity fields (`id`) that no
    /// write operation accepts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOperation`] for an unregistered operation.
    pub fn project_keeping(&self, source: &Attrs, operation: &str, keep: &[&str]) -> Result<Attrs> {
        let allowed = self.allowed(operation)?;
        Ok(select(source, |key| allowed.contains(key) || keep.contains(&key)))
    }
}

fn select(source: &Attrs, mut wanted: impl FnMut(&str) -> bool) -> Attrs {
    source
        .iter()
        .filter(|(key, _)| wanted(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// [`FieldRegistry::project`] on the process-wide registry.
///
/// # Errors
///
/// Returns [`Error::UnknownOperation`] for an unregistered operation.
pub fn project(source: &Attrs, operation: &str, exclude: &[&str]) -> Result<Attrs> {
    registry().project(source, operation, exclude)
}

/// [`FieldRegistry::project_keeping`] on the process-wide registry.
///
/// # Errors
///
/// Returns [`Error::UnknownOperation`] for an unregistered operation.
pub fn project_keeping(source: &Attrs, operation: &str, keep: &[&str]) -> Result<Attrs> {
    registry().project_keeping(source, operation, keep)
}
