//! Generate normalizr entity models from OpenAPI schemas.
//!
//! `openapi-model-gen` reads an OpenAPI 3 or Swagger 2 document (JSON or
//! YAML), finds every schema tagged with a model marker (`x-model` by
//! default), and emits JavaScript modules exposing:
//!
//! - a normalizr `schema.Entity` with its identity accessor and nested
//!   dependencies
//! - discriminated `schema.Union` definitions for `oneOf` properties
//! - Flow types and React PropTypes for every property
//! - named constants for enum values
//!
//! # Features
//!
//! - Local `$ref` resolution, including the `$$ref` and `x-$ref` forms
//! - Identity attributes as keys, nested paths, or parent-relative paths
//! - Self-referencing and cyclic model graphs
//! - Deterministic base modules: byte-identical across runs
//! - Hand-editable override modules that are never overwritten
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! use openapi_model_gen::settings::Settings;
//!
//! let doc = openapi_model_gen::schema::load_spec(Path::new("openapi.yaml"))?;
//! let settings = Settings::default();
//! let stats = openapi_model_gen::codegen::generate(&doc, &settings, Path::new("models/"))?;
//! eprintln!(
//!     "Generated {} models, skipped {}",
//!     stats.models_generated, stats.models_skipped
//! );
//! # Ok::<(), openapi_model_gen::error::Error>(())
//! ```

pub mod codegen;
pub mod descriptor;
pub mod emit;
pub mod error;
pub mod identity;
pub mod schema;
pub mod settings;
pub mod type_map;
pub mod union;
pub mod walker;
