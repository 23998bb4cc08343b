//! Renders model descriptors into JavaScript modules.
//!
//! Each model yields two artifacts:
//! - a base module (`PetBase.js`) holding the normalizr entity schema, the
//!   Flow type, the PropTypes and the enum constants; regenerated every run
//! - an override module (`Pet.js`) that subclasses the base and re-exports
//!   it; created once and then owned by the user
//!
//! An index module re-exports every model. Other renderers can be plugged
//! into the driver through the [`Renderer`] trait.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::descriptor::{ModelDescriptor, PropertyDescriptor};
use crate::error::Result;
use crate::settings::Settings;
use crate::type_map::{js_key, js_literal, js_string};
use crate::walker::DependencyNode;

const GENERATED_BANNER: &str = "// Generated by openapi-model-gen. Do not edit: changes are overwritten.";

/// One line of the index artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// File stem of the model's override module.
    pub file_name: String,
    pub name: String,
}

/// Turns descriptors into artifact text.
pub trait Renderer {
    /// Text of the always-regenerated base artifact.
    fn render_base(&self, model: &ModelDescriptor) -> Result<String>;

    /// Text of the write-once override artifact.
    fn render_override(&self, model: &ModelDescriptor, created: DateTime<Utc>) -> Result<String>;

    /// Text of the index artifact.
    fn render_index(&self, entries: &[IndexEntry]) -> Result<String>;
}

/// Emits ES modules with Flow annotations, normalizr schemas and PropTypes.
#[derive(Debug, Clone, Default)]
pub struct JsRenderer {
    settings: Settings,
}

impl JsRenderer {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    fn base_module(&self, model: &str) -> String {
        format!("./{model}{}", self.settings.base_suffix)
    }
}

impl Renderer for JsRenderer {
    fn render_base(&self, model: &ModelDescriptor) -> Result<String> {
        let name = &model.name;
        let base = format!("{name}{}", self.settings.base_suffix);
        let mut out = String::new();

        writeln!(out, "{GENERATED_BANNER}")?;
        writeln!(out, "// Customize this model in ./{name}.{}", self.settings.extension)?;
        writeln!(out, "// @flow")?;
        writeln!(out)?;
        writeln!(out, "import PropTypes from 'prop-types';")?;
        writeln!(out, "import {{ schema }} from 'normalizr';")?;
        if model.self_referencing {
            writeln!(out, "import {name} from './{name}';")?;
        }
        for import in &model.imports {
            writeln!(
                out,
                "import {}, {{ {} }} from '{}';",
                import.name, import.schema_name, import.import_path
            )?;
        }

        if !model.enums.is_empty() {
            writeln!(out)?;
            for (i, constant) in model.enums.iter().enumerate() {
                if model.enums[..i].iter().any(|e| e.name == constant.name) {
                    continue;
                }
                writeln!(
                    out,
                    "export const {} = {};",
                    constant.name,
                    js_literal(&constant.value)
                )?;
            }
        }

        writeln!(out)?;
        if let Some(description) = &model.description {
            write_doc_comment(&mut out, "", description)?;
        }
        writeln!(
            out,
            "export const {} = new schema.Entity({}, {{}}, {{ idAttribute: {} }});",
            model.schema_name,
            js_string(name),
            model.id_attribute
        )?;

        for union in &model.unions {
            let members = union
                .mapping
                .iter()
                .map(|(value, schema_name)| format!("{}: {schema_name}", js_key(value)))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                out,
                "const {} = new schema.Union({{ {members} }}, {});",
                union.key,
                js_string(&union.property_name)
            )?;
        }

        if let Some(dependencies) = &model.dependency_schema {
            writeln!(
                out,
                "{}.define({});",
                model.schema_name,
                render_dependency(dependencies)
            )?;
        }

        writeln!(out)?;
        writeln!(out, "export type {name}Type = {{")?;
        for property in &model.properties {
            let optional = if property.required { "" } else { "?" };
            writeln!(
                out,
                "  {}{optional}: {},",
                js_key(&property.name),
                property.flow_type
            )?;
        }
        writeln!(out, "}};")?;

        writeln!(out)?;
        writeln!(out, "export const {name}PropTypes = () => ({{")?;
        for property in &model.properties {
            if let Some(description) = &property.description {
                write_doc_comment(&mut out, "  ", description)?;
            }
            let required = if property.required { ".isRequired" } else { "" };
            writeln!(
                out,
                "  {}: {}{required},",
                js_key(&property.name),
                property.prop_type
            )?;
        }
        writeln!(out, "}});")?;

        let defaults: Vec<&PropertyDescriptor> = model
            .properties
            .iter()
            .filter(|p| p.default.is_some())
            .collect();
        writeln!(out)?;
        writeln!(out, "export const {name}DefaultProps = {{")?;
        for property in defaults {
            writeln!(
                out,
                "  {}: {},",
                js_key(&property.name),
                render_default(property)
            )?;
        }
        writeln!(out, "}};")?;

        writeln!(out)?;
        writeln!(out, "export default class {base} {{")?;
        writeln!(out, "  static schema = {};", model.schema_name)?;
        writeln!(out, "  static defaultProps = {name}DefaultProps;")?;
        writeln!(out)?;
        writeln!(out, "  static get propTypes() {{")?;
        writeln!(out, "    return {name}PropTypes();")?;
        writeln!(out, "  }}")?;
        writeln!(out, "}}")?;

        Ok(out)
    }

    fn render_override(&self, model: &ModelDescriptor, created: DateTime<Utc>) -> Result<String> {
        let name = &model.name;
        let base = format!("{name}{}", self.settings.base_suffix);
        let module = self.base_module(name);
        let mut out = String::new();

        writeln!(
            out,
            "// Created by openapi-model-gen on {}.",
            created.format("%Y-%m-%d")
        )?;
        writeln!(out, "// This file is never regenerated; edit it freely.")?;
        writeln!(out, "// @flow")?;
        writeln!(out)?;
        writeln!(out, "import {base} from '{module}';")?;
        writeln!(out)?;
        writeln!(out, "export * from '{module}';")?;
        writeln!(out)?;
        writeln!(out, "export default class {name} extends {base} {{}}")?;

        Ok(out)
    }

    fn render_index(&self, entries: &[IndexEntry]) -> Result<String> {
        let mut out = String::new();

        writeln!(out, "{GENERATED_BANNER}")?;
        writeln!(out, "// @flow")?;
        writeln!(out)?;
        for entry in entries {
            writeln!(
                out,
                "export {{ default as {}, {}{} }} from './{}';",
                entry.name, entry.name, self.settings.schema_suffix, entry.file_name
            )?;
        }

        Ok(out)
    }
}

/// Render a dependency tree as a normalizr schema definition literal.
pub fn render_dependency(node: &DependencyNode) -> String {
    match node {
        DependencyNode::Model { schema_name, .. } => schema_name.clone(),
        DependencyNode::Union { key, .. } => key.clone(),
        DependencyNode::List(inner) => format!("[{}]", render_dependency(inner)),
        DependencyNode::Object(entries) => {
            let body = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", js_key(k), render_dependency(v)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{ {body} }}")
        }
    }
}

fn render_default(property: &PropertyDescriptor) -> String {
    match &property.default {
        Some(serde_json::Value::String(s)) if property.default_is_string => js_string(s),
        Some(value) => js_literal(value),
        None => "undefined".to_string(),
    }
}

fn write_doc_comment(out: &mut String, indent: &str, text: &str) -> std::fmt::Result {
    writeln!(out, "{indent}/**")?;
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            writeln!(out, "{indent} *")?;
        } else {
            writeln!(out, "{indent} * {}", line.replace("*/", "*\\/"))?;
        }
    }
    writeln!(out, "{indent} */")
}
