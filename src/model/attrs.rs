//! Attribute mappings exchanged with the remote content store.
//!
//! Looks, queries, scheduled plans and color collections all travel as
//! string-keyed JSON objects. The store decides which keys exist, so the
//! crate keeps them as [`Attrs`] and reads the few fields it reasons about
//! through the helpers below.

use serde_json::{Map, Value};

/// A content object: Look, query, merge result, scheduled plan, user.
pub type Attrs = Map<String, Value>;

/// Identifier of an object, in its textual form.
///
/// API 4.0 returns ids as strings while older exports carry numbers; both
/// compare equal when their text matches.
#[must_use]
pub fn id_of(attrs: &Attrs) -> Option<String> {
    attrs.get("id").and_then(value_text)
}

/// Whether two optional objects refer to the same remote id.
///
/// Two absent objects are the same; an object without an id is never the
/// same as anything else.
#[must_use]
pub fn same_id(a: Option<&Attrs>, b: Option<&Attrs>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => matches!((id_of(a), id_of(b)), (Some(x), Some(y)) if x == y),
        _ => false,
    }
}

/// Non-empty string field.
#[must_use]
pub fn str_field<'a>(attrs: &'a Attrs, key: &str) -> Option<&'a str> {
    attrs
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Field rendered as text, for operator messages.
///
/// Missing and null fields render as an empty string.
#[must_use]
pub fn text_field(attrs: &Attrs, key: &str) -> String {
    attrs.get(key).and_then(value_text).unwrap_or_default()
}

/// Soft-delete flag; absent means not deleted.
#[must_use]
pub fn is_deleted(attrs: &Attrs) -> bool {
    attrs.get("deleted").and_then(Value::as_bool).unwrap_or(false)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
