//! Settings that control model discovery and artifact naming.
//!
//! Every schema-level marker key the compiler reads lives here so that specs
//! produced by different upstream tools (e.g. a dereferencing bundler that
//! stashes the original pointer under `$$ref`) can be handled without code
//! changes. Settings load from a JSON file whose keys mirror the field names;
//! missing keys keep their defaults.

use std::path::Path;

use heck::{ToLowerCamelCase, ToSnakeCase};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Naming transform applied to every emitted attribute name.
///
/// Applies to property names, dependency-tree keys, identity paths and
/// discriminator property names. Structural schema keys are never renamed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeCase {
    /// `owner_id` → `ownerId`.
    #[default]
    Camel,
    /// `ownerId` → `owner_id`.
    Snake,
    /// Names are emitted exactly as declared.
    Preserve,
}

impl AttributeCase {
    /// Apply the transform to a single attribute name.
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Camel => name.to_lower_camel_case(),
            Self::Snake => name.to_snake_case(),
            Self::Preserve => name.to_string(),
        }
    }
}

/// Generator settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Schema key carrying the model name (e.g. `x-model: Pet`).
    pub model_key: String,

    /// Schema key overriding the identity attribute of a model.
    pub id_attribute_key: String,

    /// Identity attribute used when a model does not override it.
    pub default_id_attribute: String,

    /// Schema key holding positional enum constant overrides.
    pub enum_keys_key: String,

    /// Keys checked, in order, after `$ref` when recovering a raw reference
    /// from an already-dereferenced node.
    pub alt_ref_keys: Vec<String>,

    /// Suffix appended to a model name to form its canonical schema name.
    pub schema_suffix: String,

    /// Suffix of the always-regenerated base artifact (`PetBase.js`).
    pub base_suffix: String,

    /// File extension of every emitted artifact, without the dot.
    pub extension: String,

    /// Stem of the index artifact.
    pub index_name: String,

    /// Naming transform for emitted attribute names.
    pub attribute_case: AttributeCase,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_key: "x-model".to_string(),
            id_attribute_key: "x-id-attribute".to_string(),
            default_id_attribute: "id".to_string(),
            enum_keys_key: "x-enum-keys".to_string(),
            alt_ref_keys: vec!["$$ref".to_string(), "x-$ref".to_string()],
            schema_suffix: "Schema".to_string(),
            base_suffix: "Base".to_string(),
            extension: "js".to_string(),
            index_name: "index".to_string(),
            attribute_case: AttributeCase::Camel,
        }
    }
}

impl Settings {
    /// Canonical schema name for a model: `Pet` → `PetSchema`.
    pub fn schema_name(&self, model: &str) -> String {
        format!("{model}{}", self.schema_suffix)
    }

    /// Module path another generated file uses to import `model`.
    pub fn import_path(&self, model: &str) -> String {
        format!("./{model}")
    }

    /// File name of the always-rewritten base artifact.
    pub fn base_file_name(&self, model: &str) -> String {
        format!("{model}{}.{}", self.base_suffix, self.extension)
    }

    /// File name of the write-once override artifact.
    pub fn override_file_name(&self, model: &str) -> String {
        format!("{model}.{}", self.extension)
    }

    /// File name of the index artifact.
    pub fn index_file_name(&self) -> String {
        format!("{}.{}", self.index_name, self.extension)
    }
}

/// Load settings from a JSON file. Keys absent from the file keep their defaults.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let settings: Settings = serde_json::from_str(&content)?;
    Ok(settings)
}
