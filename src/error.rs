//! Error types for the openapi-model-gen crate.

use std::path::PathBuf;

/// Errors that can occur while compiling model descriptors or writing artifacts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The spec document has an unexpected shape (e.g. no `components.schemas`).
    #[error("spec error: {0}")]
    Spec(String),

    /// A local `$ref` pointer does not resolve inside the document.
    #[error("unresolved reference '{0}'")]
    UnresolvedRef(String),

    /// A `oneOf` discriminator is missing its `propertyName`.
    #[error("model '{model}': discriminator is missing 'propertyName'")]
    Discriminator { model: String },

    /// A discriminator mapping entry matched zero or several `oneOf` branches.
    #[error(
        "model '{model}': discriminator mapping '{value}' -> '{reference}' matched {matches} branches (expected exactly one)"
    )]
    DiscriminatorMapping {
        model: String,
        value: String,
        reference: String,
        matches: usize,
    },

    /// A discriminated `oneOf` branch is not a model.
    #[error("model '{model}': oneOf branch #{index} is not a model with a resolvable identity")]
    UnionBranch { model: String, index: usize },

    /// Failed to write a generated artifact.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read a file from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON parse error with context.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error.
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Formatting into an in-memory buffer failed.
    #[error("render error: {0}")]
    Render(#[from] std::fmt::Error),

    /// Network error during spec download.
    #[cfg(feature = "download")]
    #[error("download failed: {0}")]
    Download(String),
}

/// Convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
