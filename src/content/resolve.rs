//! Finding the destination Looks an import may correspond to.
//!
//! Lookups search live Looks first and fall back to the trash only when
//! nothing live matches, so a trashed Look never shadows a live one.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::{LookSearch, Remote};
use crate::error::Result;
use crate::model::{Attrs, str_field};

/// How to order several Looks matching the same slug or title.
///
/// Callers treat the first element as the best match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Keep the order the store returned.
    #[default]
    RemoteOrder,
    /// Newest `updated_at` first; Looks without a readable timestamp last.
    MostRecentlyUpdated,
}

impl MatchPolicy {
    /// Order `candidates` by this policy. The sort is stable.
    #[must_use]
    pub fn rank(self, mut candidates: Vec<Attrs>) -> Vec<Attrs> {
        if self == Self::MostRecentlyUpdated {
            candidates.sort_by_key(|look| Reverse(updated_at(look)));
        }
        candidates
    }
}

fn updated_at(look: &Attrs) -> Option<DateTime<Utc>> {
    str_field(look, "updated_at")
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

/// Slug and title lookups against one store.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    remote: Remote<'a>,
    policy: MatchPolicy,
}

impl<'a> Resolver<'a> {
    #[must_use]
    pub fn new(remote: Remote<'a>, policy: MatchPolicy) -> Self {
        Self { remote, policy }
    }

    /// Looks with `slug`, in `folder_id` or anywhere when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteQuery`](crate::Error::RemoteQuery) if a
    /// search fails.
    pub fn find_by_slug(&self, slug: &str, folder_id: Option<&str>) -> Result<Vec<Attrs>> {
        self.find(
            LookSearch::by_slug(slug).in_folder(folder_id),
            "search_looks_by_slug",
        )
    }

    /// Looks titled `title`, in `folder_id` or anywhere when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteQuery`](crate::Error::RemoteQuery) if a
    /// search fails.
    pub fn find_by_title(&self, title: &str, folder_id: Option<&str>) -> Result<Vec<Attrs>> {
        self.find(
            LookSearch::by_title(title).in_folder(folder_id),
            "search_looks_by_title",
        )
    }

    /// Best match for `slug`, if any.
    ///
    /// # Errors
    ///
    /// See [`find_by_slug`](Self::find_by_slug).
    pub fn first_by_slug(&self, slug: &str, folder_id: Option<&str>) -> Result<Option<Attrs>> {
        Ok(self.find_by_slug(slug, folder_id)?.into_iter().next())
    }

    /// Best match for `title`, if any.
    ///
    /// # Errors
    ///
    /// See [`find_by_title`](Self::find_by_title).
    pub fn first_by_title(&self, title: &str, folder_id: Option<&str>) -> Result<Option<Attrs>> {
        Ok(self.find_by_title(title, folder_id)?.into_iter().next())
    }

    fn find(&self, criteria: LookSearch, operation: &str) -> Result<Vec<Attrs>> {
        let live = self.search(&criteria, operation)?;
        let found = if live.is_empty() {
            self.search(&criteria.in_trash(), operation)?
        } else {
            live
        };
        debug!(operation, matches = found.len(), "look search");
        Ok(self.policy.rank(found))
    }

    fn search(&self, criteria: &LookSearch, operation: &str) -> Result<Vec<Attrs>> {
        self.remote.read(
            || {
                format!(
                    "Error {operation}({})",
                    serde_json::to_string_pretty(criteria).unwrap_or_default()
                )
            },
            |s| s.search_looks(criteria),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::api::memory::{Call, MemoryStore, attrs};
    use crate::model::id_of;
    use crate::output::{Level, Transcript};
    use serde_json::json;

    fn ids(looks: &[Attrs]) -> Vec<String> {
        looks.iter().filter_map(id_of).collect()
    }

    #[test]
    fn test_live_match_skips_trash_search() {
        let store = MemoryStore::new()
            .with_look(json!({"id": "1", "slug": "abc", "title": "Sales", "folder_id": "F"}))
            .with_look(json!({"id": "2", "slug": "abc", "title": "Sales", "folder_id": "F", "deleted": true}));
        let out = Transcript::new();
        let resolver = Resolver::new(Remote::new(&store, &out), MatchPolicy::default());

        let found = resolver.find_by_slug("abc", Some("F")).unwrap();

        assert_eq!(ids(&found), vec!["1"]);
        assert_eq!(
            store.calls(),
            vec![Call::SearchLooks(LookSearch::by_slug("abc").in_folder(Some("F")))]
        );
    }

    #[test]
    fn test_falls_back_to_trash() {
        let store = MemoryStore::new().with_look(
            json!({"id": "2", "title": "Sales", "folder_id": "F", "deleted": true}),
        );
        let out = Transcript::new();
        let resolver = Resolver::new(Remote::new(&store, &out), MatchPolicy::default());

        let found = resolver.find_by_title("Sales", Some("F")).unwrap();

        assert_eq!(ids(&found), vec!["2"]);
        assert_eq!(store.calls().len(), 2);
    }

    #[test]
    fn test_folder_scoping() {
        let store = MemoryStore::new()
            .with_look(json!({"id": "1", "slug": "abc", "folder_id": "G"}));
        let out = Transcript::new();
        let resolver = Resolver::new(Remote::new(&store, &out), MatchPolicy::default());

        assert!(resolver.first_by_slug("abc", Some("F")).unwrap().is_none());
        let anywhere = resolver.first_by_slug("abc", None).unwrap().unwrap();
        assert_eq!(anywhere["folder_id"], "G");
    }

    #[test]
    fn test_remote_order_keeps_store_order() {
        let store = MemoryStore::new()
            .with_look(json!({"id": "1", "title": "Sales", "updated_at": "2024-01-01T00:00:00Z"}))
            .with_look(json!({"id": "2", "title": "Sales", "updated_at": "2025-01-01T00:00:00Z"}));
        let out = Transcript::new();
        let resolver = Resolver::new(Remote::new(&store, &out), MatchPolicy::RemoteOrder);

        assert_eq!(ids(&resolver.find_by_title("Sales", None).unwrap()), vec!["1", "2"]);
    }

    #[test]
    fn test_most_recently_updated_policy() {
        let candidates = vec![
            attrs(json!({"id": "1", "updated_at": "2024-01-01T00:00:00Z"})),
            attrs(json!({"id": "2"})),
            attrs(json!({"id": "3", "updated_at": "2025-06-01T12:00:00+02:00"})),
            attrs(json!({"id": "4", "updated_at": "yesterday"})),
            attrs(json!({"id": "5", "updated_at": "2024-01-01T00:00:00Z"})),
        ];

        let ranked = MatchPolicy::MostRecentlyUpdated.rank(candidates);

        assert_eq!(ids(&ranked), vec!["3", "1", "5", "2", "4"]);
    }

    #[test]
    fn test_search_failure_propagates() {
        let store = MemoryStore::new();
        store.fail_with("500 Internal Server Error");
        let out = Transcript::new();
        let resolver = Resolver::new(Remote::new(&store, &out), MatchPolicy::default());

        let err = resolver.find_by_slug("abc", Some("F")).unwrap_err();

        assert!(matches!(err, Error::RemoteQuery { .. }));
        let errors = out.texts(Level::Error);
        assert!(errors[0].starts_with("Error search_looks_by_slug("));
        assert!(errors[0].contains("\"slug\": \"abc\""));
        assert_eq!(store.calls().len(), 1);
    }
}
