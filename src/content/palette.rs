//! Color palette references inside vis configs.
//!
//! A vis config may point at a shared palette:
//!
//! ```json
//! "color_application": {"collection_id": "brand", "palette_id": "brand-categorical-0"}
//! ```
//!
//! or carry one inline under `custom`. Palette ids are instance-specific, so
//! export replaces references to deletable (custom) palettes with their
//! colors, and import binds inline palettes back to a palette that exists at
//! the destination, creating one when nothing matches.
//!
//! Objects on the way down to a reference may carry `default_colors`; the
//! innermost such list is what the chart falls back to and is handed to the
//! visitor with the reference.

use std::collections::HashSet;

use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::fields;
use crate::api::{CollectionScope, Remote};
use crate::error::{Error, Result};
use crate::model::{Attrs, id_of, str_field, text_field};

const PALETTE_KINDS: [&str; 3] = ["categoricalPalettes", "sequentialPalettes", "divergingPalettes"];

/// Call `visit` for every color palette reference in the vis configs of
/// `object`.
///
/// Vis configs are found at any depth (`vis_config`, `query.vis_config`,
/// merge result source queries). Objects without a vis config, and vis
/// configs without references, are left alone. `visit` may rewrite the
/// reference in place; its first error stops the walk.
///
/// # Errors
///
/// Returns the first error returned by `visit`.
pub fn for_each_color_palette_reference<F>(object: &mut Attrs, mut visit: F) -> Result<()>
where
    F: FnMut(&mut Attrs, &[String]) -> Result<()>,
{
    for_each_vis_config(object, &mut |vis_config: &mut Attrs| {
        walk_references(vis_config, &[], &mut visit)
    })
}

/// `object.vis_config`, when present and an object.
fn vis_config_mut(object: &mut Attrs) -> Option<&mut Attrs> {
    object.get_mut("vis_config")?.as_object_mut()
}

fn for_each_vis_config(
    object: &mut Attrs,
    visit: &mut dyn FnMut(&mut Attrs) -> Result<()>,
) -> Result<()> {
    if let Some(vis_config) = vis_config_mut(object) {
        visit(vis_config)?;
    }
    for (key, child) in object.iter_mut() {
        if key != "vis_config" {
            descend(child, visit)?;
        }
    }
    Ok(())
}

fn descend(value: &mut Value, visit: &mut dyn FnMut(&mut Attrs) -> Result<()>) -> Result<()> {
    match value {
        Value::Object(map) => for_each_vis_config(map, visit),
        Value::Array(items) => items.iter_mut().try_for_each(|item| descend(item, visit)),
        _ => Ok(()),
    }
}

fn is_reference(node: &Attrs) -> bool {
    node.contains_key("collection_id")
        && (node.contains_key("palette_id") || node.contains_key("custom"))
}

fn default_colors(node: &Attrs) -> Option<Vec<String>> {
    let colors = node.get("default_colors")?.as_array()?;
    Some(
        colors
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
    )
}

fn walk_references(
    node: &mut Attrs,
    defaults: &[String],
    visit: &mut dyn FnMut(&mut Attrs, &[String]) -> Result<()>,
) -> Result<()> {
    if is_reference(node) {
        return visit(node, defaults);
    }
    let scoped = default_colors(node);
    let defaults = scoped.as_deref().unwrap_or(defaults);
    for child in node.values_mut() {
        match child {
            Value::Object(inner) => walk_references(inner, defaults, visit)?,
            Value::Array(items) => {
                for inner in items.iter_mut().filter_map(Value::as_object_mut) {
                    walk_references(inner, defaults, visit)?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// The colors of a palette, normalized for comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Signature {
    Colors(Vec<String>),
    /// `(color, offset)` pairs of a continuous palette.
    Stops(Vec<(String, String)>),
}

impl Signature {
    fn of(palette: &Attrs) -> Option<Self> {
        let colors: Vec<String> = palette
            .get("colors")
            .and_then(Value::as_array)
            .map(|c| c.iter().filter_map(Value::as_str).map(str::to_lowercase).collect())
            .unwrap_or_default();
        if !colors.is_empty() {
            return Some(Self::Colors(colors));
        }

        let stops: Vec<(String, String)> = palette
            .get("stops")
            .and_then(Value::as_array)
            .map(|s| {
                s.iter()
                    .filter_map(Value::as_object)
                    .map(|stop| {
                        (
                            str_field(stop, "color").unwrap_or_default().to_lowercase(),
                            stop.get("offset")
                                .and_then(Value::as_f64)
                                .map(|o| o.to_string())
                                .unwrap_or_default(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        if !stops.is_empty() {
            return Some(Self::Stops(stops));
        }
        None
    }

    fn from_colors(colors: &[String]) -> Option<Self> {
        if colors.is_empty() {
            None
        } else {
            Some(Self::Colors(colors.iter().map(|c| c.to_lowercase()).collect()))
        }
    }

    /// Short stable digest, used to label created collections.
    fn digest(&self) -> String {
        let text = match self {
            Self::Colors(colors) => colors.join(","),
            Self::Stops(stops) => stops
                .iter()
                .map(|(color, offset)| format!("{color}@{offset}"))
                .collect::<Vec<_>>()
                .join(","),
        };
        let hash = Sha256::digest(text.as_bytes());
        format!("{hash:x}")[..8].to_string()
    }
}

#[derive(Debug)]
struct Palette {
    id: String,
    attrs: Attrs,
    signature: Option<Signature>,
}

#[derive(Debug)]
struct Collection {
    id: String,
    custom: bool,
    palettes: Vec<Palette>,
}

impl Collection {
    fn from_attrs(attrs: &Attrs, custom: bool) -> Option<Self> {
        let palettes = PALETTE_KINDS
            .iter()
            .filter_map(|kind| attrs.get(*kind).and_then(Value::as_array))
            .flatten()
            .filter_map(Value::as_object)
            .filter_map(|palette| {
                Some(Palette {
                    id: id_of(palette)?,
                    attrs: palette.clone(),
                    signature: Signature::of(palette),
                })
            })
            .collect();
        Some(Self {
            id: id_of(attrs)?,
            custom,
            palettes,
        })
    }
}

/// Color collections of one instance, read once per rewrite pass.
#[derive(Debug, Default)]
struct Catalog {
    collections: Vec<Collection>,
}

impl Catalog {
    fn push(&mut self, attrs: &Attrs, custom: bool) -> Option<&Collection> {
        self.collections.push(Collection::from_attrs(attrs, custom)?);
        self.collections.last()
    }

    fn find_palette(&self, palette_id: &str) -> Option<(&Collection, &Palette)> {
        self.collections.iter().find_map(|collection| {
            collection
                .palettes
                .iter()
                .find(|p| p.id == palette_id)
                .map(|p| (collection, p))
        })
    }

    fn find_matching(&self, signature: &Signature) -> Option<(&Collection, &Palette)> {
        self.collections.iter().find_map(|collection| {
            collection
                .palettes
                .iter()
                .find(|p| p.signature.as_ref() == Some(signature))
                .map(|p| (collection, p))
        })
    }
}

/// Portable copy of a palette: everything but its id.
fn inline_palette(palette: &Attrs) -> Attrs {
    ["label", "type", "colors", "stops"]
        .iter()
        .filter_map(|key| palette.get(*key).map(|v| ((*key).to_string(), v.clone())))
        .collect()
}

fn default_palette(defaults: &[String]) -> Attrs {
    let mut palette = Attrs::new();
    palette.insert("label".to_string(), json!("Default"));
    palette.insert("type".to_string(), json!("Categorical"));
    palette.insert("colors".to_string(), json!(defaults));
    palette
}

fn palette_kind(custom: &Attrs, signature: &Signature) -> &'static str {
    match str_field(custom, "type").map(str::to_lowercase).as_deref() {
        Some("sequential") => "sequentialPalettes",
        Some("diverging") => "divergingPalettes",
        _ if matches!(signature, Signature::Stops(_)) => "sequentialPalettes",
        _ => "categoricalPalettes",
    }
}

/// Rewrites palette references against one instance's color collections.
pub struct PaletteRewriter<'a> {
    remote: Remote<'a>,
    catalog: Option<Catalog>,
}

impl<'a> PaletteRewriter<'a> {
    #[must_use]
    pub fn new(remote: Remote<'a>) -> Self {
        Self {
            remote,
            catalog: None,
        }
    }

    /// Export mode: inline palettes that may not survive on this instance.
    ///
    /// References to palettes of custom collections become `custom` inline
    /// palettes. References to palettes that no longer exist fall back to
    /// the chart's default colors when those are known. References to
    /// standard palettes are kept.
    ///
    /// # Errors
    ///
    /// Returns a remote error if the color collections cannot be read.
    pub fn canonicalize(&mut self, object: &mut Attrs) -> Result<()> {
        for_each_color_palette_reference(object, |reference, defaults| {
            self.canonicalize_reference(reference, defaults)
        })
    }

    /// Import mode: bind inline palettes to palettes of this instance.
    ///
    /// An inline palette matching an existing palette's colors is replaced
    /// by a reference to it; otherwise a custom collection holding the
    /// palette is created and referenced.
    ///
    /// # Errors
    ///
    /// Returns a remote error if collections cannot be read or created.
    pub fn bind(&mut self, object: &mut Attrs) -> Result<()> {
        for_each_color_palette_reference(object, |reference, defaults| {
            self.bind_reference(reference, defaults)
        })
    }

    fn catalog(&mut self) -> Result<&mut Catalog> {
        if self.catalog.is_none() {
            let all = self.remote.read(
                || "Error querying color collections".to_string(),
                |s| s.color_collections(CollectionScope::All),
            )?;
            let custom: HashSet<String> = self
                .remote
                .read(
                    || "Error querying custom color collections".to_string(),
                    |s| s.color_collections(CollectionScope::Custom),
                )?
                .iter()
                .filter_map(id_of)
                .collect();

            let mut catalog = Catalog::default();
            for collection in &all {
                let is_custom = id_of(collection).is_some_and(|id| custom.contains(&id));
                catalog.push(collection, is_custom);
            }
            debug!(collections = catalog.collections.len(), "loaded color collections");
            self.catalog = Some(catalog);
        }
        Ok(self.catalog.get_or_insert_with(Catalog::default))
    }

    fn canonicalize_reference(&mut self, reference: &mut Attrs, defaults: &[String]) -> Result<()> {
        let Some(palette_id) = str_field(reference, "palette_id").map(String::from) else {
            return Ok(());
        };

        let replacement = match self.catalog()?.find_palette(&palette_id) {
            Some((collection, palette)) if collection.custom => Some(inline_palette(&palette.attrs)),
            Some(_) => None,
            None if !defaults.is_empty() => Some(default_palette(defaults)),
            None => None,
        };

        if let Some(custom) = replacement {
            debug!(%palette_id, "inlining palette");
            reference.remove("palette_id");
            reference.insert("custom".to_string(), Value::Object(custom));
        }
        Ok(())
    }

    fn bind_reference(&mut self, reference: &mut Attrs, defaults: &[String]) -> Result<()> {
        let Some(custom) = reference.get("custom").and_then(Value::as_object).cloned() else {
            return Ok(());
        };
        let Some(signature) = Signature::of(&custom).or_else(|| Signature::from_colors(defaults))
        else {
            return Ok(());
        };

        let existing = self
            .catalog()?
            .find_matching(&signature)
            .map(|(c, p)| (c.id.clone(), p.id.clone()));
        let (collection_id, palette_id) = match existing {
            Some(ids) => ids,
            None => self.create_palette(&custom, &signature, defaults)?,
        };

        debug!(%collection_id, %palette_id, "binding palette");
        reference.insert("collection_id".to_string(), json!(collection_id));
        reference.insert("palette_id".to_string(), json!(palette_id));
        reference.remove("custom");
        Ok(())
    }

    fn create_palette(
        &mut self,
        custom: &Attrs,
        signature: &Signature,
        defaults: &[String],
    ) -> Result<(String, String)> {
        let mut palette = inline_palette(custom);
        if Signature::of(&palette).is_none() {
            palette.insert("colors".to_string(), json!(defaults));
        }
        palette
            .entry("label")
            .or_insert_with(|| json!("Custom"));

        let mut body = Attrs::new();
        body.insert(
            "label".to_string(),
            json!(format!("lookport {}", signature.digest())),
        );
        body.insert(
            palette_kind(custom, signature).to_string(),
            json!([palette]),
        );
        let body = fields::project(&body, "create_color_collection", &[])?;

        let created = self.remote.write(
            || {
                format!(
                    "Error creating color collection({})",
                    serde_json::to_string_pretty(&body).unwrap_or_default()
                )
            },
            |s| s.create_color_collection(&body),
        )?;
        info!(label = %text_field(&body, "label"), "created color collection");

        let collection = self
            .catalog()?
            .push(&created, true)
            .ok_or_else(|| Error::Other("created color collection has no id".to_string()))?;
        let palette = collection
            .palettes
            .iter()
            .find(|p| p.signature.as_ref() == Some(signature))
            .or_else(|| collection.palettes.first())
            .ok_or_else(|| {
                Error::Other(format!(
                    "color collection {} was created without palettes",
                    collection.id
                ))
            })?;
        Ok((collection.id.clone(), palette.id.clone()))
    }
}
