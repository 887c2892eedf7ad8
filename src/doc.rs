//! Design document model: views, image placements, and their transforms.
//!
//! Documents arrive as JSON from the product designer, keyed by view
//! (`"{variation}_{system}"` → view). Object key order is significant: the renderer
//! only draws the first view, so [`DesignDocument`] keeps views in document order.
//!
//! [`validate_design`] inspects the raw JSON rather than the typed model so it can
//! report problems (non-numeric transform fields, malformed URLs) that typed
//! deserialization would either reject outright or silently default.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::RenderError;

/// Position, scale, and rotation of a placement in logical units.
///
/// Missing or `null` fields take their defaults when deserialized:
/// `left = 0`, `top = 0`, `scaleX = 1`, `scaleY = 1`, `angle = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTransform")]
pub struct ElementTransform {
    pub left: f64,
    pub top: f64,
    #[serde(rename = "scaleX")]
    pub scale_x: f64,
    #[serde(rename = "scaleY")]
    pub scale_y: f64,
    /// Clockwise rotation in degrees around the placement origin.
    #[serde(rename = "angle")]
    pub angle_degrees: f64,
}

impl Default for ElementTransform {
    fn default() -> Self {
        Self { left: 0.0, top: 0.0, scale_x: 1.0, scale_y: 1.0, angle_degrees: 0.0 }
    }
}

impl ElementTransform {
    /// Rotation in radians, for the drawing surface.
    #[must_use]
    pub fn angle_radians(&self) -> f64 {
        self.angle_degrees.to_radians()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransform {
    #[serde(default, deserialize_with = "opt_lenient_f64")]
    left: Option<f64>,
    #[serde(default, deserialize_with = "opt_lenient_f64")]
    top: Option<f64>,
    #[serde(default, deserialize_with = "opt_lenient_f64")]
    scale_x: Option<f64>,
    #[serde(default, deserialize_with = "opt_lenient_f64")]
    scale_y: Option<f64>,
    #[serde(default, deserialize_with = "opt_lenient_f64")]
    angle: Option<f64>,
}

impl From<RawTransform> for ElementTransform {
    fn from(raw: RawTransform) -> Self {
        let defaults = Self::default();
        Self {
            left: raw.left.unwrap_or(defaults.left),
            top: raw.top.unwrap_or(defaults.top),
            scale_x: raw.scale_x.unwrap_or(defaults.scale_x),
            scale_y: raw.scale_y.unwrap_or(defaults.scale_y),
            angle_degrees: raw.angle.unwrap_or(defaults.angle_degrees),
        }
    }
}

/// One image placed on a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementPlacement {
    /// Identifier unique within its view. Empty when the source omitted it.
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    /// Image source. Empty when the source omitted it; such placements fail to load.
    #[serde(default, deserialize_with = "string_or_number")]
    pub url: String,
    /// `null` or missing means the default transform.
    #[serde(default, deserialize_with = "transform_or_default")]
    pub transform: ElementTransform,
}

/// One garment face (front, back, ...) with its placements in z-order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string_or_number")]
    pub system_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_string_or_number")]
    pub variation_id: Option<String>,
    /// Placements bottom-first: later entries draw on top.
    #[serde(default)]
    pub images: Vec<ElementPlacement>,
}

/// WooCommerce ids show up both as `"189542"` and `189542`.
fn opt_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(opt_string_or_number(deserializer)?.unwrap_or_default())
}

fn transform_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ElementTransform, D::Error> {
    Ok(Option::<ElementTransform>::deserialize(deserializer)?.unwrap_or_default())
}

/// Transform numbers sometimes arrive as strings (`"12.5"`); anything that is not a
/// finite number after that falls back to the field default.
fn opt_lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => None,
        },
        _ => None,
    })
}

/// Views keyed by name, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignDocument {
    views: Vec<(String, DesignView)>,
}

impl DesignDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Document`] if the text is not a valid document.
    pub fn from_json(raw: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Append a view, replacing any existing view with the same key in place.
    pub fn insert(&mut self, key: impl Into<String>, view: DesignView) {
        let key = key.into();
        if let Some(slot) = self.views.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = view;
        } else {
            self.views.push((key, view));
        }
    }

    /// The view the renderer draws.
    #[must_use]
    pub fn first_view(&self) -> Option<(&str, &DesignView)> {
        self.views.first().map(|(k, v)| (k.as_str(), v))
    }

    /// View keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.views.iter().map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl Serialize for DesignDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.views.len()))?;
        for (key, view) in &self.views {
            map.serialize_entry(key, view)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for DesignDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = DesignDocument;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of view keys to design views")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut doc = DesignDocument::new();
                while let Some((key, view)) = access.next_entry::<String, DesignView>()? {
                    doc.insert(key, view);
                }
                Ok(doc)
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}

// =============================================================
// Validation
// =============================================================

/// Outcome of [`validate_design`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DesignValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub image_count: usize,
}

/// Transform fields the designer always writes as numbers.
const NUMERIC_TRANSFORM_FIELDS: [&str; 4] = ["left", "top", "scaleX", "scaleY"];

/// Check a raw design document for problems before rendering it.
///
/// Errors make the document unrenderable as intended; warnings flag data the
/// renderer will default or ignore.
#[must_use]
pub fn validate_design(raw: &Value) -> DesignValidation {
    let mut out = DesignValidation::default();

    let Some(views) = raw.as_object() else {
        out.errors.push("design data is not an object".into());
        return out;
    };
    let Some((first_key, first_view)) = views.iter().next() else {
        out.errors.push("no design views found".into());
        return out;
    };
    if views.len() > 1 {
        out.warnings
            .push(format!("{} views present; only `{first_key}` is rendered", views.len()));
    }
    let Some(view) = first_view.as_object().filter(|v| !v.is_empty()) else {
        out.errors.push("first design view is empty".into());
        return out;
    };

    if !view.get("view_name").is_some_and(is_present) {
        out.warnings.push("view name is missing".into());
    }
    if !view.get("system_id").is_some_and(is_present) {
        out.warnings.push("system id is missing".into());
    }

    let Some(images) = view.get("images").and_then(Value::as_array) else {
        out.errors.push("images array is missing or invalid".into());
        return out;
    };
    out.image_count = images.len();

    for (index, image) in images.iter().enumerate() {
        validate_image(index, image, &mut out);
    }

    // Anything the renderer's own parser still refuses is fatal for the whole document.
    if let Err(e) = DesignDocument::deserialize(raw) {
        out.errors.push(format!("design does not parse: {e}"));
    }

    out.is_valid = out.errors.is_empty();
    out
}

fn validate_image(index: usize, image: &Value, out: &mut DesignValidation) {
    if !image.get("id").is_some_and(is_present) {
        out.warnings.push(format!("image {index}: missing id"));
    }

    let Some(url) = image.get("url").and_then(Value::as_str).filter(|u| !u.is_empty()) else {
        out.errors.push(format!("image {index}: missing url"));
        return;
    };
    if let Err(e) = url::Url::parse(url) {
        out.errors.push(format!("image {index}: invalid url ({e})"));
    }

    match image.get("transform").filter(|t| !t.is_null()) {
        Some(transform) if !transform.is_object() => {
            out.errors.push(format!("image {index}: transform is not an object"));
        }
        Some(transform) => {
            for field in NUMERIC_TRANSFORM_FIELDS {
                if !transform.get(field).is_some_and(Value::is_number) {
                    out.warnings
                        .push(format!("image {index}: transform {field} is not a number"));
                }
            }
        }
        None => out.warnings.push(format!("image {index}: no transform data")),
    }
}

/// JS-style truthiness for identifier fields: `null`, `""`, `0`, and `false` count as missing.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}
