//! Creating or updating a Look at the destination.
//!
//! An imported Look is matched against the destination folder by slug and
//! by title. Slugs are unique across the instance, titles only within a
//! folder, so the reconciler checks both before deciding:
//!
//! - no match: create, keeping the slug unless another Look owns it
//! - one match (by slug, by title, or both on the same Look): update it,
//!   but only with `force`
//! - slug and title matching two different Looks: conflict, whatever `force`
//!   says, since the update would leave two Looks with the same title
//!
//! Only fields the API accepts for the write are sent; identity fields
//! (`folder_id`, `user_id`, `query_id`, `slug`) are set by the reconciler.

use serde_json::{Value, json};
use tracing::{debug, info};

use super::fields;
use super::palette::PaletteRewriter;
use super::resolve::{MatchPolicy, Resolver};
use crate::api::{ContentStore, Remote};
use crate::error::{Error, Result};
use crate::model::{Attrs, id_of, is_deleted, same_id, str_field, text_field};
use crate::output::Messenger;

/// Fields never copied from the source Look.
const IDENTITY_FIELDS: [&str; 5] = ["space_id", "folder_id", "user_id", "query_id", "slug"];

/// Imports Looks, queries and merge results into one store.
pub struct Reconciler<'a> {
    remote: Remote<'a>,
    resolver: Resolver<'a>,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(store: &'a dyn ContentStore, out: &'a dyn Messenger) -> Self {
        let remote = Remote::new(store, out);
        Self {
            remote,
            resolver: Resolver::new(remote, MatchPolicy::default()),
        }
    }

    /// Use `policy` to pick among several matching Looks.
    #[must_use]
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.resolver = Resolver::new(self.remote, policy);
        self
    }

    /// Import an exported Look into `folder_id`.
    ///
    /// Creates the Look's query, then upserts the Look as the current user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the Look has no query, and
    /// any error from [`create_fetch_query`](Self::create_fetch_query) or
    /// [`upsert`](Self::upsert).
    pub fn import_look(&self, folder_id: &str, source: &Attrs, force: bool) -> Result<Attrs> {
        let query = source
            .get("query")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::InvalidArgument("Look has no query to import".to_string()))?;

        let user_id = super::current_user_id(self.remote)?;
        let query = self.create_fetch_query(query)?;
        let query_id = id_of(&query)
            .ok_or_else(|| Error::Other("created query has no id".to_string()))?;

        self.upsert(&user_id, &query_id, folder_id, source, force)
    }

    /// Create `source` in `folder_id`, or update the Look it matches there.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `source` has no title
    /// - [`Error::TitleConflict`] if the slug and the title match different
    ///   Looks
    /// - [`Error::AlreadyExists`] if a Look matches and `force` is false
    /// - remote errors from the lookups or the write
    pub fn upsert(
        &self,
        user_id: &str,
        query_id: &str,
        folder_id: &str,
        source: &Attrs,
        force: bool,
    ) -> Result<Attrs> {
        let title = str_field(source, "title")
            .ok_or_else(|| Error::InvalidArgument("Look has no title".to_string()))?;
        let slug = str_field(source, "slug");
        let folder = Some(folder_id);

        let existing_by_slug = match slug {
            Some(slug) => self.resolver.first_by_slug(slug, folder)?,
            None => None,
        };
        let title_used = self.resolver.first_by_title(title, folder)?;
        let existing = existing_by_slug.as_ref().or(title_used.as_ref());
        debug!(
            title,
            ?slug,
            existing = ?existing.and_then(id_of),
            title_used = ?title_used.as_ref().and_then(id_of),
            "reconciling look"
        );

        let slug_used = match slug {
            Some(slug) => self.resolver.first_by_slug(slug, None)?,
            None => None,
        };
        let slug_taken = slug_used
            .as_ref()
            .is_some_and(|used| !same_id(Some(used), existing));
        if let (Some(slug), Some(used)) = (slug, slug_used.as_ref().filter(|_| slug_taken)) {
            self.report_slug_taken(slug, used);
        }
        let new_slug = slug.filter(|_| !slug_taken);

        match existing {
            Some(existing) => {
                if title_used.is_some() && !same_id(title_used.as_ref(), Some(existing)) {
                    debug!(title, folder_id, "title held by another look");
                    return Err(Error::TitleConflict {
                        title: title.to_string(),
                        folder_id: folder_id.to_string(),
                        existing_id: title_used.as_ref().and_then(id_of).unwrap_or_default(),
                    });
                }
                if !force {
                    debug!(title, folder_id, "look exists and --force not given");
                    return Err(Error::AlreadyExists {
                        id: id_of(existing).unwrap_or_default(),
                        title: text_field(existing, "title"),
                        slug: text_field(existing, "slug"),
                        folder_id: folder_id.to_string(),
                    });
                }
                self.update(existing, query_id, folder_id, source, new_slug)
            }
            None => self.create(user_id, query_id, folder_id, source, new_slug),
        }
    }

    fn report_slug_taken(&self, slug: &str, used: &Attrs) {
        let out = self.remote.out();
        debug!(slug, owner = ?id_of(used), "slug already in use");
        out.warn(&format!(
            "slug {slug} already used for look {} in folder {}",
            text_field(used, "title"),
            text_field(used, "folder_id"),
        ));
        if is_deleted(used) {
            out.warn("That look is in the 'Trash' but not fully deleted yet");
        }
        out.warn("look will be imported with new slug");
    }

    fn update(
        &self,
        existing: &Attrs,
        query_id: &str,
        folder_id: &str,
        source: &Attrs,
        slug: Option<&str>,
    ) -> Result<Attrs> {
        let id = id_of(existing)
            .ok_or_else(|| Error::Other("matched look has no id".to_string()))?;

        let mut body = fields::project(source, "update_look", &IDENTITY_FIELDS)?;
        if let Some(slug) = slug {
            body.insert("slug".to_string(), json!(slug));
        }
        body.insert("deleted".to_string(), json!(false));
        body.insert("query_id".to_string(), json!(query_id));

        self.remote.out().ok(&format!(
            "Modifying existing Look {id} {} in folder {folder_id}",
            text_field(existing, "title"),
        ));
        info!(%id, restored = is_deleted(existing), "updating look");
        self.remote.write(
            || format!("Error updating look({id},{})", pretty(&body)),
            |s| s.update_look(&id, &body),
        )
    }

    fn create(
        &self,
        user_id: &str,
        query_id: &str,
        folder_id: &str,
        source: &Attrs,
        slug: Option<&str>,
    ) -> Result<Attrs> {
        let mut body = fields::project(source, "create_look", &IDENTITY_FIELDS)?;
        if let Some(slug) = slug {
            body.insert("slug".to_string(), json!(slug));
        }
        body.insert("query_id".to_string(), json!(query_id));
        body.insert("user_id".to_string(), json!(user_id));
        body.insert("folder_id".to_string(), json!(folder_id));
        let public = body.get("public").and_then(Value::as_bool).unwrap_or(false);
        body.insert("public".to_string(), json!(public));

        PaletteRewriter::new(self.remote).bind(&mut body)?;

        info!(folder_id, ?slug, "creating look");
        let created = self.remote.write(
            || format!("Error creating look({})", pretty(&body)),
            |s| s.create_look(&body),
        )?;
        self.remote.out().ok(&format!(
            "Created Look {} {} in folder {folder_id}",
            text_field(&created, "id"),
            text_field(&created, "title"),
        ));
        Ok(created)
    }

    /// Create a query from an exported one.
    ///
    /// The client id is dropped so the destination assigns its own, and
    /// inline palettes are bound to destination palettes.
    ///
    /// # Errors
    ///
    /// Returns remote errors from palette binding or the create.
    pub fn create_fetch_query(&self, query: &Attrs) -> Result<Attrs> {
        let mut body = fields::project(query, "create_query", &["client_id"])?;
        PaletteRewriter::new(self.remote).bind(&mut body)?;

        info!(model = %text_field(&body, "model"), view = %text_field(&body, "view"), "creating query");
        self.remote.write(
            || format!("Error creating query({})", pretty(&body)),
            |s| s.create_query(&body),
        )
    }

    /// Create a merge result from an exported one.
    ///
    /// Each source query is created first and referenced by its new id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a source query without a
    /// `query` object, and remote errors from any create.
    pub fn create_merge_result(&self, merge: &Attrs) -> Result<Attrs> {
        let mut body =
            fields::project(merge, "create_merge_query", &["client_id", "source_queries"])?;

        let sources = merge
            .get("source_queries")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut source_queries = Vec::with_capacity(sources.len());
        for (i, source) in sources.iter().enumerate() {
            let query = source
                .get("query")
                .and_then(Value::as_object)
                .ok_or_else(|| {
                    Error::InvalidArgument(format!("merge source query {i} has no query"))
                })?;
            let created = self.create_fetch_query(query)?;
            let query_id = id_of(&created)
                .ok_or_else(|| Error::Other("created query has no id".to_string()))?;

            let mut entry = Attrs::new();
            entry.insert("query_id".to_string(), json!(query_id));
            for key in ["name", "merge_fields"] {
                if let Some(value) = source.get(key) {
                    entry.insert(key.to_string(), value.clone());
                }
            }
            source_queries.push(Value::Object(entry));
        }
        body.insert("source_queries".to_string(), Value::Array(source_queries));

        PaletteRewriter::new(self.remote).bind(&mut body)?;

        info!(sources = sources.len(), "creating merge query");
        self.remote.write(
            || format!("Error creating merge query({})", pretty(&body)),
            |s| s.create_merge_query(&body),
        )
    }
}

fn pretty(body: &Attrs) -> String {
    serde_json::to_string_pretty(body).unwrap_or_default()
}
