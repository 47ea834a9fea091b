//! In-process content store for tests.
//!
//! Mirrors the remote search semantics that reconciliation depends on:
//! exact slug/title/folder matching, and trashed Looks only returned when
//! `deleted=true` is asked for. Every call is recorded so tests can assert
//! on the writes that were (or were not) issued.

use std::cell::{Cell, RefCell};

use serde_json::{Value, json};

use super::{CollectionScope, ContentStore, LookSearch, StoreError, StoreResult};
use crate::model::{Attrs, id_of, is_deleted, text_field};

/// A recorded store call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Look(String),
    SearchLooks(LookSearch),
    CreateLook(Attrs),
    UpdateLook(String, Attrs),
    DeleteLook(String),
    CreateQuery(Attrs),
    CreateMergeQuery(Attrs),
    ScheduledPlans(String, bool),
    ColorCollections(CollectionScope),
    CreateColorCollection(Attrs),
    Me,
    User(String, Option<String>),
}

impl Call {
    pub(crate) fn is_write(&self) -> bool {
        matches!(
            self,
            Self::CreateLook(_)
                | Self::UpdateLook(..)
                | Self::DeleteLook(_)
                | Self::CreateQuery(_)
                | Self::CreateMergeQuery(_)
                | Self::CreateColorCollection(_)
        )
    }
}

pub(crate) struct MemoryStore {
    looks: RefCell<Vec<Attrs>>,
    plans: RefCell<Vec<Attrs>>,
    collections: RefCell<Vec<(Attrs, bool)>>,
    users: RefCell<Vec<Attrs>>,
    calls: RefCell<Vec<Call>>,
    next_id: Cell<u64>,
    failure: RefCell<Option<String>>,
    query_ids: Cell<bool>,
    brief_search: Cell<bool>,
}

pub(crate) fn attrs(value: Value) -> Attrs {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            looks: RefCell::new(Vec::new()),
            plans: RefCell::new(Vec::new()),
            collections: RefCell::new(Vec::new()),
            users: RefCell::new(vec![attrs(json!({
                "id": "1",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
            }))]),
            calls: RefCell::new(Vec::new()),
            next_id: Cell::new(100),
            failure: RefCell::new(None),
            query_ids: Cell::new(true),
            brief_search: Cell::new(false),
        }
    }

    pub(crate) fn with_look(self, look: Value) -> Self {
        self.looks.borrow_mut().push(attrs(look));
        self
    }

    pub(crate) fn with_plan(self, plan: Value) -> Self {
        self.plans.borrow_mut().push(attrs(plan));
        self
    }

    pub(crate) fn with_collection(self, collection: Value, custom: bool) -> Self {
        self.collections.borrow_mut().push((attrs(collection), custom));
        self
    }

    pub(crate) fn with_user(self, user: Value) -> Self {
        self.users.borrow_mut().push(attrs(user));
        self
    }

    /// Make every following call fail with a remote error.
    /// Created queries come back without an id.
    pub(crate) fn without_query_ids(self) -> Self {
        self.query_ids.set(false);
        self
    }

    /// Search results carry only `id`, `title`, `slug` and `deleted`.
    pub(crate) fn with_brief_search_results(self) -> Self {
        self.brief_search.set(true);
        self
    }

    pub(crate) fn fail_with(&self, message: &str) {
        *self.failure.borrow_mut() = Some(message.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    pub(crate) fn looks(&self) -> Vec<Attrs> {
        self.looks.borrow().clone()
    }

    pub(crate) fn collection_count(&self) -> usize {
        self.collections.borrow().len()
    }

    fn record(&self, call: Call) -> StoreResult<()> {
        self.calls.borrow_mut().push(call);
        match self.failure.borrow().as_ref() {
            Some(message) => Err(StoreError::remote(message.clone())),
            None => Ok(()),
        }
    }

    fn assign_id(&self, body: &Attrs) -> Attrs {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let mut created = body.clone();
        created.insert("id".to_string(), json!(id.to_string()));
        created
    }
}

fn matches_criteria(look: &Attrs, criteria: &LookSearch) -> bool {
    let field_matches = |key: &str, wanted: &Option<String>| {
        wanted.as_ref().is_none_or(|w| text_field(look, key) == *w)
    };
    field_matches("slug", &criteria.slug)
        && field_matches("title", &criteria.title)
        && field_matches("folder_id", &criteria.folder_id)
        && is_deleted(look) == criteria.deleted.unwrap_or(false)
}

fn not_found(resource: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        resource,
        id: id.to_string(),
    }
}

impl ContentStore for MemoryStore {
    fn look(&self, id: &str) -> StoreResult<Attrs> {
        self.record(Call::Look(id.to_string()))?;
        self.looks
            .borrow()
            .iter()
            .find(|l| id_of(l).as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| not_found("look", id))
    }

    fn search_looks(&self, criteria: &LookSearch) -> StoreResult<Vec<Attrs>> {
        self.record(Call::SearchLooks(criteria.clone()))?;
        Ok(self
            .looks
            .borrow()
            .iter()
            .filter(|l| matches_criteria(l, criteria))
            .map(|l| {
                if !self.brief_search.get() {
                    return l.clone();
                }
                l.iter()
                    .filter(|(k, _)| ["id", "title", "slug", "deleted"].contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .collect())
    }

    fn create_look(&self, body: &Attrs) -> StoreResult<Attrs> {
        self.record(Call::CreateLook(body.clone()))?;
        let created = self.assign_id(body);
        self.looks.borrow_mut().push(created.clone());
        Ok(created)
    }

    fn update_look(&self, id: &str, body: &Attrs) -> StoreResult<Attrs> {
        self.record(Call::UpdateLook(id.to_string(), body.clone()))?;
        let mut looks = self.looks.borrow_mut();
        let look = looks
            .iter_mut()
            .find(|l| id_of(l).as_deref() == Some(id))
            .ok_or_else(|| not_found("look", id))?;
        for (key, value) in body {
            look.insert(key.clone(), value.clone());
        }
        Ok(look.clone())
    }

    fn delete_look(&self, id: &str) -> StoreResult<()> {
        self.record(Call::DeleteLook(id.to_string()))?;
        let mut looks = self.looks.borrow_mut();
        let before = looks.len();
        looks.retain(|l| id_of(l).as_deref() != Some(id));
        if looks.len() == before {
            return Err(not_found("look", id));
        }
        Ok(())
    }

    fn create_query(&self, body: &Attrs) -> StoreResult<Attrs> {
        self.record(Call::CreateQuery(body.clone()))?;
        if !self.query_ids.get() {
            return Ok(body.clone());
        }
        Ok(self.assign_id(body))
    }

    fn create_merge_query(&self, body: &Attrs) -> StoreResult<Attrs> {
        self.record(Call::CreateMergeQuery(body.clone()))?;
        Ok(self.assign_id(body))
    }

    fn scheduled_plans_for_look(
        &self,
        look_id: &str,
        all_users: bool,
    ) -> StoreResult<Vec<Attrs>> {
        self.record(Call::ScheduledPlans(look_id.to_string(), all_users))?;
        Ok(self
            .plans
            .borrow()
            .iter()
            .filter(|p| text_field(p, "look_id") == look_id)
            .cloned()
            .collect())
    }

    fn color_collections(&self, scope: CollectionScope) -> StoreResult<Vec<Attrs>> {
        self.record(Call::ColorCollections(scope))?;
        Ok(self
            .collections
            .borrow()
            .iter()
            .filter(|(_, custom)| scope == CollectionScope::All || *custom)
            .map(|(c, _)| c.clone())
            .collect())
    }

    fn create_color_collection(&self, body: &Attrs) -> StoreResult<Attrs> {
        self.record(Call::CreateColorCollection(body.clone()))?;
        let mut created = self.assign_id(body);
        // Palettes get ids from the store too.
        for key in ["categoricalPalettes", "sequentialPalettes", "divergingPalettes"] {
            if let Some(Value::Array(palettes)) = created.get_mut(key) {
                for palette in palettes.iter_mut().filter_map(Value::as_object_mut) {
                    let id = self.next_id.get();
                    self.next_id.set(id + 1);
                    palette.insert("id".to_string(), json!(format!("p{id}")));
                }
            }
        }
        self.collections.borrow_mut().push((created.clone(), true));
        Ok(created)
    }

    fn me(&self) -> StoreResult<Attrs> {
        self.record(Call::Me)?;
        self.users
            .borrow()
            .first()
            .cloned()
            .ok_or_else(|| StoreError::remote("not logged in"))
    }

    fn user(&self, id: &str, fields: Option<&str>) -> StoreResult<Attrs> {
        self.record(Call::User(id.to_string(), fields.map(String::from)))?;
        let user = self
            .users
            .borrow()
            .iter()
            .find(|u| id_of(u).as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| not_found("user", id))?;
        Ok(match fields {
            Some(fields) => {
                let wanted: Vec<&str> = fields.split(',').map(str::trim).collect();
                user.into_iter()
                    .filter(|(k, _)| wanted.contains(&k.as_str()))
                    .collect()
            }
            None => user,
        })
    }
}
