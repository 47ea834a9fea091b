//! Data models for lookport.
//!
//! Content objects stay schemaless ([`Attrs`]); only identity fields are
//! interpreted.

pub mod attrs;

pub use attrs::{Attrs, id_of, is_deleted, same_id, str_field, text_field};
