//! Identity attribute parsing and accessor rendering.
//!
//! A model's identity attribute names the property used to key instances in
//! the normalized store. Three forms are accepted:
//!
//! | Declared value     | Meaning                                          | Accessor                              |
//! |--------------------|--------------------------------------------------|---------------------------------------|
//! | `id`               | key on the value                                 | `'id'`                                |
//! | `owner.id`         | dotted path on the value                         | `(value) => value.owner.id`           |
//! | `parent.ownerId`   | dotted path on the enclosing parent value        | `(value, parent) => parent.ownerId`   |

use serde_json::Value;

use crate::schema::SpecDocument;
use crate::settings::{AttributeCase, Settings};

const PARENT_PREFIX: &str = "parent.";

/// A parsed identity attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdAttribute {
    /// A single key on the value itself.
    Key(String),
    /// A dotted path on the value itself.
    Path(Vec<String>),
    /// A dotted path on the parent context rather than the value.
    Parent(Vec<String>),
}

impl IdAttribute {
    /// Parse a declared identity attribute. Empty names and empty path
    /// segments do not parse.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix(PARENT_PREFIX) {
            return split_path(rest).map(Self::Parent);
        }
        let segments = split_path(raw)?;
        if segments.len() == 1 {
            segments.into_iter().next().map(Self::Key)
        } else {
            Some(Self::Path(segments))
        }
    }

    /// Whether the attribute can be found in the model's declared properties.
    ///
    /// Parent-relative attributes cannot be checked against the model and are
    /// accepted as-is.
    pub fn resolves_in(&self, doc: &SpecDocument, schema: &Value) -> bool {
        let segments = match self {
            Self::Key(key) => std::slice::from_ref(key),
            Self::Path(segments) => segments.as_slice(),
            Self::Parent(_) => return true,
        };

        let mut node = schema;
        for segment in segments {
            let Ok(resolved) = doc.resolve(node) else {
                return false;
            };
            match resolved.get("properties").and_then(|p| p.get(segment)) {
                Some(next) => node = next,
                None => return false,
            }
        }
        true
    }

    /// Render the accessor expression consumed by the entity schema.
    pub fn accessor(&self, case: AttributeCase) -> String {
        match self {
            Self::Key(key) => format!("'{}'", case.apply(key)),
            Self::Path(segments) => format!("(value) => value.{}", join_path(segments, case)),
            Self::Parent(segments) => {
                format!("(value, parent) => parent.{}", join_path(segments, case))
            }
        }
    }
}

/// The identity attribute of `schema`, if one is declared (or defaulted) and
/// resolves against the schema's properties.
pub fn identity_attribute(
    doc: &SpecDocument,
    settings: &Settings,
    schema: &Value,
) -> Option<IdAttribute> {
    let declared = schema
        .get(&settings.id_attribute_key)
        .and_then(Value::as_str)
        .unwrap_or(&settings.default_id_attribute);
    IdAttribute::parse(declared).filter(|attr| attr.resolves_in(doc, schema))
}

fn split_path(raw: &str) -> Option<Vec<String>> {
    if raw.is_empty() {
        return None;
    }
    let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
    if segments.iter().any(String::is_empty) {
        return None;
    }
    Some(segments)
}

fn join_path(segments: &[String], case: AttributeCase) -> String {
    segments
        .iter()
        .map(|s| case.apply(s))
        .collect::<Vec<_>>()
        .join(".")
}
