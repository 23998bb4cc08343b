//! Builds the render-ready description of a single model.
//!
//! A [`ModelDescriptor`] is the only input a renderer receives for a model:
//! everything schema-specific (identity resolution, dependency walking, type
//! projection, enum constant naming) is settled here.

use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::identity::identity_attribute;
use crate::schema::{SpecDocument, model_name};
use crate::settings::Settings;
use crate::type_map::{Primitive, Projector, TypeExpr, enum_constant_name, enum_value_text};
use crate::union::UnionDescriptor;
use crate::walker::{DependencyNode, ModelImport, Walker};

/// Description of one model property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// Name after the attribute naming transform.
    pub name: String,
    /// Name as declared in the schema.
    pub source_name: String,
    pub required: bool,
    pub is_enum: bool,
    pub enum_values: Vec<Value>,
    /// Constant names, positionally matching `enum_values`.
    pub enum_constants: Vec<String>,
    pub items: Option<Value>,
    pub prop_type: String,
    pub flow_type: String,
    pub default: Option<Value>,
    /// Whether `default` must be emitted as a quoted string literal.
    pub default_is_string: bool,
    pub description: Option<String>,
}

/// A generated enum constant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumConstant {
    pub name: String,
    pub value: Value,
}

/// Everything a renderer needs to emit one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub name: String,
    pub schema_name: String,
    /// Identity accessor expression (`'id'`, or an arrow function).
    pub id_attribute: String,
    pub description: Option<String>,
    pub properties: Vec<PropertyDescriptor>,
    /// Dependency tree of the model's properties, keys already renamed.
    pub dependency_schema: Option<DependencyNode>,
    pub unions: Vec<UnionDescriptor>,
    pub imports: Vec<ModelImport>,
    /// Whether any property refers back to this model.
    pub self_referencing: bool,
    pub enums: Vec<EnumConstant>,
}

/// Build the descriptor of a model schema.
///
/// Returns `Ok(None)` (after logging a warning) when the schema is not a
/// model, has no `properties`, or has no resolvable identity attribute.
/// Discriminator mapping defects and dangling references are errors.
pub fn build_model_descriptor(
    doc: &SpecDocument,
    settings: &Settings,
    schema: &Value,
) -> Result<Option<ModelDescriptor>> {
    let schema = doc.resolve(schema)?;
    let Some(name) = model_name(schema, settings) else {
        tracing::warn!(
            marker = %settings.model_key,
            "schema has no model name marker, skipping"
        );
        return Ok(None);
    };
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        tracing::warn!(model = name, "model has no properties, skipping");
        return Ok(None);
    };
    let Some(id_attribute) = identity_attribute(doc, settings, schema) else {
        tracing::warn!(model = name, "model has no resolvable identity attribute, skipping");
        return Ok(None);
    };

    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let case = settings.attribute_case;
    let projector = Projector::new(doc, settings);
    let mut walker = Walker::new(doc, settings, name);
    let mut dependencies = Vec::new();
    let mut descriptors = Vec::with_capacity(properties.len());

    for (key, property) in properties {
        let dependency = walker.walk(property)?;
        let resolved = doc.resolve(property)?;

        let enum_values = resolved
            .get("enum")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let enum_constants = enum_constant_names(settings, name, key, resolved, &enum_values);

        let expr = projector
            .project(property, dependency.as_ref(), &enum_constants)?
            .unwrap_or(TypeExpr::Primitive(Primitive::Any));
        let default = resolved.get("default").cloned();

        descriptors.push(PropertyDescriptor {
            name: case.apply(key),
            source_name: key.clone(),
            required: required.contains(&key.as_str()),
            is_enum: !enum_values.is_empty(),
            enum_values,
            enum_constants,
            items: resolved.get("items").cloned(),
            prop_type: expr.prop_type(),
            flow_type: expr.flow_type(),
            default_is_string: matches!(default, Some(Value::String(_))),
            default,
            description: description(resolved),
        });

        if let Some(dependency) = dependency {
            dependencies.push((key.clone(), dependency));
        }
    }

    let discovered = walker.finish();
    let enums: Vec<EnumConstant> = descriptors
        .iter()
        .flat_map(|p| {
            p.enum_constants
                .iter()
                .zip(&p.enum_values)
                .map(|(name, value)| EnumConstant {
                    name: name.clone(),
                    value: value.clone(),
                })
        })
        .collect();
    for (i, constant) in enums.iter().enumerate() {
        if enums[..i].iter().any(|earlier| earlier.name == constant.name) {
            tracing::warn!(
                model = name,
                constant = %constant.name,
                "enum constant name is declared more than once"
            );
        }
    }
    let dependency_schema =
        (!dependencies.is_empty()).then(|| DependencyNode::Object(dependencies).renamed(case));

    tracing::debug!(
        model = name,
        properties = descriptors.len(),
        imports = discovered.imports.len(),
        unions = discovered.unions.len(),
        "built model descriptor"
    );

    Ok(Some(ModelDescriptor {
        name: name.to_string(),
        schema_name: settings.schema_name(name),
        id_attribute: id_attribute.accessor(case),
        description: description(schema),
        properties: descriptors,
        dependency_schema,
        unions: discovered.unions,
        imports: discovered.imports,
        self_referencing: discovered.self_reference,
        enums,
    }))
}

/// Constant names for a property's enum values, honoring a positional
/// override list when its length matches.
fn enum_constant_names(
    settings: &Settings,
    model: &str,
    property: &str,
    schema: &Value,
    values: &[Value],
) -> Vec<String> {
    let overrides: Option<Vec<String>> = schema
        .get(&settings.enum_keys_key)
        .and_then(Value::as_array)
        .map(|keys| keys.iter().map(enum_value_text).collect());

    match overrides {
        Some(keys) if keys.len() == values.len() => keys
            .iter()
            .map(|key| enum_constant_name(property, key))
            .collect(),
        Some(keys) => {
            tracing::warn!(
                model,
                property,
                keys = keys.len(),
                values = values.len(),
                "enum key override length does not match enum values, ignoring"
            );
            default_constant_names(property, values)
        }
        None => default_constant_names(property, values),
    }
}

fn default_constant_names(property: &str, values: &[Value]) -> Vec<String> {
    values
        .iter()
        .map(|value| enum_constant_name(property, &enum_value_text(value)))
        .collect()
}

fn description(schema: &Value) -> Option<String> {
    schema
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
}
