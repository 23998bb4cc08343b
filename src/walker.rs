//! Schema walking: builds the dependency tree of a model.
//!
//! Every schema node is classified once into a [`SchemaKind`] and then
//! dispatched. Model nodes become named leaves and are never entered, which
//! keeps cyclic model graphs finite. Discriminated unions become placeholder
//! leaves (`oneOfSchema1`, `oneOfSchema2`, ...). Primitive subtrees are pruned.
//!
//! Models and unions found along the way accumulate in the [`Walker`] and
//! are handed back by [`Walker::finish`].

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identity::identity_attribute;
use crate::schema::{SpecDocument, model_name, raw_ref};
use crate::settings::{AttributeCase, Settings};
use crate::union::{Branch, UnionDescriptor, resolve_one_of};

/// Prefix of synthesized union placeholder keys.
const UNION_KEY_PREFIX: &str = "oneOfSchema";

/// Shape of a schema node, decided once per visit.
#[derive(Debug)]
pub enum SchemaKind<'a> {
    /// A named model with a resolvable identity attribute.
    Model { name: &'a str, schema: &'a Value },
    /// `oneOf` with a `discriminator`.
    DiscriminatedUnion {
        branches: &'a [Value],
        discriminator: &'a Value,
    },
    /// `oneOf` without a discriminator.
    PolymorphicRefList(&'a [Value]),
    /// `type: object` (or untyped) with a `properties` block.
    Object(&'a Map<String, Value>),
    /// `type: array` (or untyped) with an `items` schema.
    Array(&'a Value),
    /// Any other mapping; its own keys are walked generically.
    Implicit(&'a Map<String, Value>),
    /// Scalars, arrays of values, and schemas with nothing to contribute.
    Primitive,
}

/// Classify a node, following local `$ref`s first.
pub fn classify<'a>(
    doc: &'a SpecDocument,
    settings: &Settings,
    node: &'a Value,
) -> Result<SchemaKind<'a>> {
    let node = doc.resolve(node)?;
    let Some(map) = node.as_object() else {
        return Ok(SchemaKind::Primitive);
    };

    if let Some(name) = model_name(node, settings) {
        if identity_attribute(doc, settings, node).is_some() {
            return Ok(SchemaKind::Model { name, schema: node });
        }
        tracing::debug!(model = name, "model marker without identity attribute, walking inline");
    }

    if let Some(branches) = map.get("oneOf").and_then(Value::as_array) {
        return Ok(match map.get("discriminator") {
            Some(discriminator) if discriminator.is_object() => SchemaKind::DiscriminatedUnion {
                branches,
                discriminator,
            },
            _ => SchemaKind::PolymorphicRefList(branches),
        });
    }

    let properties = map.get("properties").and_then(Value::as_object);
    let items = map.get("items").filter(|items| items.is_object());

    if has_type(node, "object") {
        return Ok(properties.map_or(SchemaKind::Primitive, SchemaKind::Object));
    }
    if has_type(node, "array") {
        return Ok(items.map_or(SchemaKind::Primitive, SchemaKind::Array));
    }
    if map.contains_key("type") {
        return Ok(SchemaKind::Primitive);
    }

    Ok(match (properties, items) {
        (Some(properties), _) => SchemaKind::Object(properties),
        (None, Some(items)) => SchemaKind::Array(items),
        (None, None) => SchemaKind::Implicit(map),
    })
}

/// Whether a schema's `type` is (or, for type lists, includes) `expected`.
pub fn has_type(node: &Value, expected: &str) -> bool {
    match node.get("type") {
        Some(Value::String(t)) => t == expected,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(expected)),
        _ => false,
    }
}

/// A pruned mirror of a schema whose leaves reference models and unions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyNode {
    /// Reference to another model.
    Model { name: String, schema_name: String },
    /// Reference to a union placeholder declared by the owning model.
    Union { key: String, members: Vec<String> },
    /// List of the inner dependency.
    List(Box<DependencyNode>),
    /// Object whose listed keys carry dependencies, in declared order.
    Object(Vec<(String, DependencyNode)>),
}

impl DependencyNode {
    /// Child of an object node.
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Copy of the tree with every object key passed through `case`.
    pub fn renamed(&self, case: AttributeCase) -> Self {
        match self {
            Self::Model { .. } | Self::Union { .. } => self.clone(),
            Self::List(inner) => Self::List(Box::new(inner.renamed(case))),
            Self::Object(entries) => Self::Object(
                entries
                    .iter()
                    .map(|(k, v)| (case.apply(k), v.renamed(case)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for DependencyNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Model { schema_name, .. } => serializer.serialize_str(schema_name),
            Self::Union { key, .. } => serializer.serialize_str(key),
            Self::List(inner) => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(inner.as_ref())?;
                seq.end()
            }
            Self::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

/// A model another model must import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelImport {
    pub name: String,
    pub schema_name: String,
    pub import_path: String,
}

/// Everything a walk discovered besides the dependency tree itself.
#[derive(Debug, Default)]
pub struct Discovered {
    /// Referenced models, deduplicated by name, in first-encounter order.
    pub imports: Vec<ModelImport>,
    /// Unions in first-encounter order; keys are numbered from 1.
    pub unions: Vec<UnionDescriptor>,
    /// Whether the owning model references itself.
    pub self_reference: bool,
}

/// Walks the schemas of one model, accumulating imports and unions.
pub struct Walker<'a> {
    doc: &'a SpecDocument,
    settings: &'a Settings,
    owner: &'a str,
    discovered: Discovered,
    ref_stack: Vec<String>,
}

impl<'a> Walker<'a> {
    /// Create a walker for the model named `owner`. References to `owner`
    /// itself are not recorded as imports.
    pub fn new(doc: &'a SpecDocument, settings: &'a Settings, owner: &'a str) -> Self {
        Self {
            doc,
            settings,
            owner,
            discovered: Discovered::default(),
            ref_stack: Vec::new(),
        }
    }

    /// Walk one schema node.
    pub fn walk(&mut self, node: &'a Value) -> Result<Option<DependencyNode>> {
        let Some(reference) = node
            .get("$ref")
            .and_then(Value::as_str)
            .filter(|r| r.starts_with('#'))
        else {
            return self.walk_resolved(node);
        };

        if self.ref_stack.iter().any(|seen| seen == reference) {
            tracing::warn!(
                model = self.owner,
                reference,
                "cyclic reference to a non-model schema, pruning"
            );
            return Ok(None);
        }

        self.ref_stack.push(reference.to_string());
        let result = self.walk_resolved(node);
        self.ref_stack.pop();
        result
    }

    /// Consume the walker, returning what it discovered.
    pub fn finish(self) -> Discovered {
        self.discovered
    }

    fn walk_resolved(&mut self, node: &'a Value) -> Result<Option<DependencyNode>> {
        match classify(self.doc, self.settings, node)? {
            SchemaKind::Primitive => Ok(None),
            SchemaKind::Model { name, .. } => Ok(Some(self.register_model(name))),
            SchemaKind::DiscriminatedUnion {
                branches,
                discriminator,
            } => self.walk_union(branches, discriminator).map(Some),
            SchemaKind::PolymorphicRefList(branches) => {
                for branch in branches {
                    if let SchemaKind::Model { name, .. } =
                        classify(self.doc, self.settings, branch)?
                    {
                        self.register_model(name);
                    }
                }
                Ok(None)
            }
            SchemaKind::Object(properties) => self.walk_entries(properties),
            SchemaKind::Array(items) => Ok(self
                .walk(items)?
                .map(|inner| DependencyNode::List(Box::new(inner)))),
            SchemaKind::Implicit(map) => self.walk_entries(map),
        }
    }

    fn walk_entries(&mut self, map: &'a Map<String, Value>) -> Result<Option<DependencyNode>> {
        let mut entries = Vec::new();
        for (key, value) in map {
            if let Some(dependency) = self.walk(value)? {
                entries.push((key.clone(), dependency));
            }
        }
        Ok((!entries.is_empty()).then_some(DependencyNode::Object(entries)))
    }

    fn walk_union(
        &mut self,
        branches: &'a [Value],
        discriminator: &'a Value,
    ) -> Result<DependencyNode> {
        let mut resolved = Vec::with_capacity(branches.len());
        for (index, branch) in branches.iter().enumerate() {
            let SchemaKind::Model { name, schema } = classify(self.doc, self.settings, branch)?
            else {
                return Err(Error::UnionBranch {
                    model: self.owner.to_string(),
                    index,
                });
            };
            resolved.push(Branch {
                name: name.to_string(),
                schema_name: self.settings.schema_name(name),
                raw_ref: raw_ref(branch, self.settings).or_else(|| raw_ref(schema, self.settings)),
            });
        }

        let mapping = resolve_one_of(self.owner, discriminator, &resolved)?;
        for branch in &resolved {
            self.register_model(&branch.name);
        }

        let key = format!("{UNION_KEY_PREFIX}{}", self.discovered.unions.len() + 1);
        self.discovered.unions.push(UnionDescriptor {
            key: key.clone(),
            property_name: self.settings.attribute_case.apply(&mapping.property_name),
            mapping: mapping.mapping,
        });

        Ok(DependencyNode::Union {
            key,
            members: resolved.into_iter().map(|b| b.name).collect(),
        })
    }

    fn register_model(&mut self, name: &str) -> DependencyNode {
        let schema_name = self.settings.schema_name(name);
        let known = self.discovered.imports.iter().any(|i| i.name == name);
        if name == self.owner {
            self.discovered.self_reference = true;
        } else if !known {
            self.discovered.imports.push(ModelImport {
                name: name.to_string(),
                schema_name: schema_name.clone(),
                import_path: self.settings.import_path(name),
            });
        }
        DependencyNode::Model {
            name: name.to_string(),
            schema_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pets_doc() -> SpecDocument {
        SpecDocument::new(json!({
            "openapi": "3.0.0",
            "components": {"schemas": {
                "Cat": {
                    "x-model": "Cat",
                    "type": "object",
                    "properties": {"id": {"type": "integer"}, "type": {"type": "string"}}
                },
                "Dog": {
                    "x-model": "Dog",
                    "type": "object",
                    "properties": {"id": {"type": "integer"}, "type": {"type": "string"}}
                },
                "Owner": {
                    "x-model": "Owner",
                    "type": "object",
                    "properties": {
                        "id": {"type": "integer"},
                        "pets": {"type": "array", "items": {"$ref": "#/components/schemas/Cat"}}
                    }
                },
                "Address": {
                    "type": "object",
                    "properties": {"street": {"type": "string"}, "zip": {"type": "string"}}
                },
                "Anonymous": {
                    "x-model": "Anonymous",
                    "type": "object",
                    "properties": {"name": {"type": "string"}}
                },
                "Tree": {
                    "type": "object",
                    "properties": {
                        "children": {"type": "array", "items": {"$ref": "#/components/schemas/Tree"}},
                        "owner": {"$ref": "#/components/schemas/Owner"}
                    }
                }
            }}
        }))
    }

    fn model_leaf(name: &str) -> DependencyNode {
        DependencyNode::Model {
            name: name.to_string(),
            schema_name: format!("{name}Schema"),
        }
    }

    #[test]
    fn classify_dispatches_each_shape() {
        let doc = pets_doc();
        let settings = Settings::default();

        let model = json!({"$ref": "#/components/schemas/Cat"});
        assert!(matches!(
            classify(&doc, &settings, &model).unwrap(),
            SchemaKind::Model { name: "Cat", .. }
        ));

        let union = json!({"oneOf": [], "discriminator": {"propertyName": "type"}});
        assert!(matches!(
            classify(&doc, &settings, &union).unwrap(),
            SchemaKind::DiscriminatedUnion { .. }
        ));

        let plain = json!({"oneOf": []});
        assert!(matches!(
            classify(&doc, &settings, &plain).unwrap(),
            SchemaKind::PolymorphicRefList(_)
        ));

        let array = json!({"type": "array", "items": {"type": "string"}});
        assert!(matches!(
            classify(&doc, &settings, &array).unwrap(),
            SchemaKind::Array(_)
        ));

        let untyped = json!({"properties": {}});
        assert!(matches!(
            classify(&doc, &settings, &untyped).unwrap(),
            SchemaKind::Object(_)
        ));

        let implicit = json!({"nested": {}});
        assert!(matches!(
            classify(&doc, &settings, &implicit).unwrap(),
            SchemaKind::Implicit(_)
        ));

        for primitive in [json!("text"), json!({"type": "string"}), json!({"type": "object"})] {
            assert!(matches!(
                classify(&doc, &settings, &primitive).unwrap(),
                SchemaKind::Primitive
            ));
        }
    }

    #[test]
    fn marker_without_identity_is_not_a_model() {
        let doc = pets_doc();
        let settings = Settings::default();
        let node = json!({"$ref": "#/components/schemas/Anonymous"});
        assert!(matches!(
            classify(&doc, &settings, &node).unwrap(),
            SchemaKind::Object(_)
        ));
    }

    #[test]
    fn type_lists_are_recognized() {
        assert!(has_type(&json!({"type": ["object", "null"]}), "object"));
        assert!(!has_type(&json!({"type": "string"}), "object"));
        assert!(!has_type(&json!({}), "object"));
    }

    #[test]
    fn model_refs_become_leaves_without_recursion() {
        let doc = pets_doc();
        let settings = Settings::default();
        let mut walker = Walker::new(&doc, &settings, "Root");

        let node = json!({"$ref": "#/components/schemas/Owner"});
        assert_eq!(walker.walk(&node).unwrap(), Some(model_leaf("Owner")));

        let discovered = walker.finish();
        let names: Vec<&str> = discovered.imports.iter().map(|i| i.name.as_str()).collect();
        // Owner's own Cat reference is not discovered: models are not entered.
        assert_eq!(names, ["Owner"]);
        assert_eq!(discovered.imports[0].schema_name, "OwnerSchema");
        assert_eq!(discovered.imports[0].import_path, "./Owner");
    }

    #[test]
    fn primitive_subtrees_are_pruned() {
        let doc = pets_doc();
        let settings = Settings::default();
        let mut walker = Walker::new(&doc, &settings, "Root");

        let node = json!({"$ref": "#/components/schemas/Address"});
        assert_eq!(walker.walk(&node).unwrap(), None);

        let list = json!({"type": "array", "items": {"type": "integer"}});
        assert_eq!(walker.walk(&list).unwrap(), None);
    }

    #[test]
    fn arrays_and_objects_wrap_dependencies() {
        let doc = pets_doc();
        let settings = Settings::default();
        let mut walker = Walker::new(&doc, &settings, "Root");

        let node = json!({
            "type": "object",
            "properties": {
                "label": {"type": "string"},
                "cats": {"type": "array", "items": {"$ref": "#/components/schemas/Cat"}},
                "best": {"$ref": "#/components/schemas/Dog"}
            }
        });
        let expected = DependencyNode::Object(vec![
            (
                "cats".to_string(),
                DependencyNode::List(Box::new(model_leaf("Cat"))),
            ),
            ("best".to_string(), model_leaf("Dog")),
        ]);
        assert_eq!(walker.walk(&node).unwrap(), Some(expected));
    }

    #[test]
    fn implicit_shapes_are_walked_generically() {
        let doc = pets_doc();
        let settings = Settings::default();
        let mut walker = Walker::new(&doc, &settings, "Root");

        let node = json!({
            "description": "loose bag",
            "primary": {"$ref": "#/components/schemas/Cat"}
        });
        assert_eq!(
            walker.walk(&node).unwrap(),
            Some(DependencyNode::Object(vec![(
                "primary".to_string(),
                model_leaf("Cat")
            )]))
        );
    }

    #[test]
    fn discriminated_unions_get_numbered_placeholders() {
        let doc = pets_doc();
        let settings = Settings::default();
        let mut walker = Walker::new(&doc, &settings, "Pet");

        let union = json!({
            "oneOf": [
                {"$ref": "#/components/schemas/Cat"},
                {"$ref": "#/components/schemas/Dog"}
            ],
            "discriminator": {"propertyName": "pet_type"}
        });
        let first = walker.walk(&union).unwrap();
        let second = walker.walk(&union).unwrap();

        assert_eq!(
            first,
            Some(DependencyNode::Union {
                key: "oneOfSchema1".into(),
                members: vec!["Cat".into(), "Dog".into()],
            })
        );
        assert!(matches!(
            second,
            Some(DependencyNode::Union { ref key, .. }) if key == "oneOfSchema2"
        ));

        let discovered = walker.finish();
        assert_eq!(discovered.unions.len(), 2);
        assert_eq!(discovered.unions[0].property_name, "petType");
        assert_eq!(
            discovered.unions[0].mapping,
            vec![
                ("Cat".to_string(), "CatSchema".to_string()),
                ("Dog".to_string(), "DogSchema".to_string()),
            ]
        );
        // Branches are registered once each.
        assert_eq!(discovered.imports.len(), 2);
    }

    #[test]
    fn union_branch_must_be_a_model() {
        let doc = pets_doc();
        let settings = Settings::default();
        let mut walker = Walker::new(&doc, &settings, "Pet");

        let union = json!({
            "oneOf": [
                {"$ref": "#/components/schemas/Cat"},
                {"$ref": "#/components/schemas/Address"}
            ],
            "discriminator": {"propertyName": "type"}
        });
        let err = walker.walk(&union).unwrap_err();
        assert!(matches!(err, Error::UnionBranch { index: 1, .. }));
    }

    #[test]
    fn dereferenced_branches_use_alternate_ref_keys() {
        let doc = pets_doc();
        let settings = Settings::default();
        let mut walker = Walker::new(&doc, &settings, "Pet");

        let union = json!({
            "oneOf": [
                {
                    "$$ref": "#/components/schemas/Cat",
                    "x-model": "Cat",
                    "properties": {"id": {"type": "integer"}}
                },
                {
                    "x-$ref": "#/components/schemas/Dog",
                    "x-model": "Dog",
                    "properties": {"id": {"type": "integer"}}
                }
            ],
            "discriminator": {
                "propertyName": "type",
                "mapping": {
                    "cat": "#/components/schemas/Cat",
                    "dog": "#/components/schemas/Dog"
                }
            }
        });
        walker.walk(&union).unwrap();
        let discovered = walker.finish();
        assert_eq!(
            discovered.unions[0].mapping,
            vec![
                ("cat".to_string(), "CatSchema".to_string()),
                ("dog".to_string(), "DogSchema".to_string()),
            ]
        );
    }

    #[test]
    fn plain_one_of_registers_imports_only() {
        let doc = pets_doc();
        let settings = Settings::default();
        let mut walker = Walker::new(&doc, &settings, "Pet");

        let node = json!({"oneOf": [
            {"$ref": "#/components/schemas/Cat"},
            {"type": "string"}
        ]});
        assert_eq!(walker.walk(&node).unwrap(), None);
        assert_eq!(walker.finish().imports.len(), 1);
    }

    #[test]
    fn self_references_and_non_model_cycles_terminate() {
        let doc = pets_doc();
        let settings = Settings::default();
        let mut walker = Walker::new(&doc, &settings, "Owner");

        let node = json!({"$ref": "#/components/schemas/Tree"});
        let dependency = walker.walk(&node).unwrap();
        assert_eq!(
            dependency,
            Some(DependencyNode::Object(vec![(
                "owner".to_string(),
                model_leaf("Owner")
            )]))
        );
        // The owner itself never shows up as an import.
        let discovered = walker.finish();
        assert!(discovered.imports.is_empty());
        assert!(discovered.self_reference);
    }

    #[test]
    fn serializes_and_renames_tree() {
        let tree = DependencyNode::Object(vec![
            (
                "best_friend".to_string(),
                DependencyNode::Union {
                    key: "oneOfSchema1".into(),
                    members: vec!["Cat".into()],
                },
            ),
            (
                "other_pets".to_string(),
                DependencyNode::List(Box::new(model_leaf("Dog"))),
            ),
        ]);
        let renamed = tree.renamed(AttributeCase::Camel);
        assert_eq!(
            serde_json::to_value(&renamed).unwrap(),
            json!({"bestFriend": "oneOfSchema1", "otherPets": ["DogSchema"]})
        );
        assert!(renamed.get("otherPets").is_some());
        assert!(renamed.get("other_pets").is_none());
    }
}
