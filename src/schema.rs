//! Spec document loading, format detection, and reference resolution.
//!
//! Specs are held as an untyped [`serde_json::Value`] tree (with key order
//! preserved) since the compiler only ever inspects a handful of keywords.
//! Both the OpenAPI 3 wrapping (`components.schemas`) and the Swagger 2 /
//! raw-mapping shape (`definitions`, or the root itself) are supported.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::settings::Settings;

/// Maximum number of `$ref` hops followed before a chain is treated as broken.
const MAX_REF_HOPS: usize = 32;

/// How model definitions are wrapped inside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    /// `{ components: { schemas: { ... } } }`.
    OpenApi3,
    /// `{ definitions: { ... } }`, or a bare mapping of schema nodes.
    Swagger2,
}

impl SpecFormat {
    /// Guess the wrapping from the root keys.
    pub fn detect(root: &Value) -> Self {
        if root.get("openapi").is_some() || root.get("components").is_some() {
            Self::OpenApi3
        } else {
            Self::Swagger2
        }
    }
}

/// A loaded spec document.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    root: Value,
    format: SpecFormat,
}

impl SpecDocument {
    /// Wrap a parsed document, detecting its format.
    pub fn new(root: Value) -> Self {
        let format = SpecFormat::detect(&root);
        Self { root, format }
    }

    /// Wrap a parsed document with an explicit format.
    pub fn with_format(root: Value, format: SpecFormat) -> Self {
        Self { root, format }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn into_root(self) -> Value {
        self.root
    }

    pub fn format(&self) -> SpecFormat {
        self.format
    }

    /// All schema definitions keyed by name, in declared order.
    ///
    /// A missing `components.schemas` on an OpenAPI 3 document is a hard error.
    pub fn schemas(&self) -> Result<&Map<String, Value>> {
        match self.format {
            SpecFormat::OpenApi3 => self
                .root
                .pointer("/components/schemas")
                .and_then(Value::as_object)
                .ok_or_else(|| {
                    Error::Spec("OpenAPI 3 document has no 'components.schemas' object".to_string())
                }),
            SpecFormat::Swagger2 => self
                .root
                .get("definitions")
                .and_then(Value::as_object)
                .or_else(|| self.root.as_object())
                .ok_or_else(|| Error::Spec("spec root is not an object".to_string())),
        }
    }

    /// Follow local `$ref` pointers until a concrete node is reached.
    ///
    /// Non-local references (`other.yaml#/...`) are returned untouched; the
    /// walker treats them as opaque.
    pub fn resolve<'a>(&'a self, node: &'a Value) -> Result<&'a Value> {
        let mut current = node;
        for _ in 0..MAX_REF_HOPS {
            let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
                return Ok(current);
            };
            let Some(pointer) = reference.strip_prefix('#') else {
                return Ok(current);
            };
            current = self
                .root
                .pointer(pointer)
                .ok_or_else(|| Error::UnresolvedRef(reference.to_string()))?;
        }
        Err(Error::UnresolvedRef(format!(
            "reference chain longer than {MAX_REF_HOPS} hops"
        )))
    }
}

/// Recover the raw reference string of a node.
///
/// Checks `$ref` first, then each of [`Settings::alt_ref_keys`] in order, so
/// both unresolved nodes and nodes inlined by an upstream dereferencer work.
pub fn raw_ref<'a>(node: &'a Value, settings: &Settings) -> Option<&'a str> {
    std::iter::once("$ref")
        .chain(settings.alt_ref_keys.iter().map(String::as_str))
        .find_map(|key| node.get(key).and_then(Value::as_str))
}

/// The model name carried by the model marker, if any.
pub fn model_name<'a>(node: &'a Value, settings: &Settings) -> Option<&'a str> {
    node.get(&settings.model_key)
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
}

/// Load a spec document from disk. `.yaml`/`.yml` files are parsed as YAML,
/// everything else as JSON.
pub fn load_spec(path: &Path) -> Result<SpecDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let root = parse_spec(&content, is_yaml(path))?;
    Ok(SpecDocument::new(root))
}

fn parse_spec(content: &str, yaml: bool) -> Result<Value> {
    if yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(serde_json::from_str(content)?)
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Download a spec document and save it to disk.
///
/// The body is parsed before writing so a broken download never replaces a
/// good cached copy.
#[cfg(feature = "download")]
pub async fn download_spec(url: &str, output_path: &Path) -> Result<()> {
    tracing::info!(%url, "downloading spec");

    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::Download(format!(
            "GET {url} returned {}",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::Download(format!("reading response body: {e}")))?;

    // Validate before writing.
    let root = parse_spec(&body, is_yaml(output_path))
        .map_err(|e| Error::Spec(format!("downloaded spec does not parse: {e}")))?;
    let document = SpecDocument::new(root);
    let definitions = document.schemas()?.len();

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::write(output_path, &body).map_err(|e| Error::Write {
        path: output_path.to_path_buf(),
        source: e,
    })?;

    tracing::info!(
        definitions,
        path = %output_path.display(),
        "saved spec"
    );
    Ok(())
}
