//! Projects property schemas onto PropTypes and Flow type expressions.
//!
//! # Primitive Mapping Table
//!
//! | Schema type           | PropTypes           | Flow         | Notes |
//! |-----------------------|---------------------|--------------|-------|
//! | `integer`, `number`   | `PropTypes.number`  | `number`     | |
//! | `string`              | `PropTypes.string`  | `string`     | |
//! | `boolean`             | `PropTypes.bool`    | `boolean`    | |
//! | `array` (no items)    | `PropTypes.array`   | `Array<any>` | |
//! | anything else         | `PropTypes.any`     | `any`        | Escape hatch |
//!
//! Structured shapes (model references, unions, lists, inline objects and
//! enums) are described by [`TypeExpr`] and rendered into both systems.

use std::cell::RefCell;

use serde_json::Value;

use crate::error::Result;
use crate::schema::SpecDocument;
use crate::settings::Settings;
use crate::walker::{DependencyNode, SchemaKind, classify, has_type};

/// A primitive schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Number,
    String,
    Boolean,
    Array,
    Any,
}

impl Primitive {
    /// Map a schema `type` name to a primitive.
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name {
            "integer" | "number" => Self::Number,
            "string" => Self::String,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            _ => Self::Any,
        }
    }

    /// Primitive of a schema's `type`, skipping `null` in type lists.
    pub fn of_schema(schema: &Value) -> Option<Self> {
        match schema.get("type")? {
            Value::String(t) => Some(Self::from_type_name(t)),
            Value::Array(types) => types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
                .map(Self::from_type_name),
            _ => Some(Self::Any),
        }
    }

    pub fn prop_type(self) -> &'static str {
        match self {
            Self::Number => "PropTypes.number",
            Self::String => "PropTypes.string",
            Self::Boolean => "PropTypes.bool",
            Self::Array => "PropTypes.array",
            Self::Any => "PropTypes.any",
        }
    }

    pub fn flow_type(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Array => "Array<any>",
            Self::Any => "any",
        }
    }
}

/// One allowed enum value, optionally named by a generated constant.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumLiteral {
    pub value: Value,
    pub constant: Option<String>,
}

impl EnumLiteral {
    fn prop_type(&self) -> String {
        self.constant.clone().unwrap_or_else(|| js_literal(&self.value))
    }

    fn flow_type(&self) -> String {
        match &self.constant {
            Some(constant) => format!("typeof {constant}"),
            None => js_literal(&self.value),
        }
    }
}

/// A structural type, renderable as a PropTypes or a Flow expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Primitive(Primitive),
    /// Shape of another model.
    Model(String),
    /// List of the inner type.
    List(Box<TypeExpr>),
    /// Object with named members, in declared order.
    Shape(Vec<(String, TypeExpr)>),
    /// Exactly one of several model shapes.
    OneOfModels(Vec<String>),
    /// Exactly one of several literal values.
    OneOfValues(Vec<EnumLiteral>),
}

impl TypeExpr {
    /// Render as a PropTypes validator expression.
    pub fn prop_type(&self) -> String {
        match self {
            Self::Primitive(p) => p.prop_type().to_string(),
            Self::Model(name) => model_prop_type(name),
            Self::List(inner) => format!("PropTypes.arrayOf({})", inner.prop_type()),
            Self::Shape(members) => {
                let body = members
                    .iter()
                    .map(|(k, v)| format!("{}: {}", js_key(k), v.prop_type()))
                    .collect::<Vec<_>>();
                format!("PropTypes.shape({})", braced(&body))
            }
            Self::OneOfModels(names) if names.len() == 1 => model_prop_type(&names[0]),
            Self::OneOfModels(names) => format!(
                "PropTypes.oneOfType([{}])",
                names
                    .iter()
                    .map(|n| model_prop_type(n))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::OneOfValues(values) => format!(
                "PropTypes.oneOf([{}])",
                values
                    .iter()
                    .map(EnumLiteral::prop_type)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Render as a Flow type annotation.
    pub fn flow_type(&self) -> String {
        match self {
            Self::Primitive(p) => p.flow_type().to_string(),
            Self::Model(name) => name.clone(),
            Self::List(inner) => format!("Array<{}>", inner.flow_type()),
            Self::Shape(members) => {
                let body = members
                    .iter()
                    .map(|(k, v)| format!("{}: {}", js_key(k), v.flow_type()))
                    .collect::<Vec<_>>();
                braced(&body)
            }
            Self::OneOfModels(names) => names.join(" | "),
            Self::OneOfValues(values) => values
                .iter()
                .map(EnumLiteral::flow_type)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

fn model_prop_type(name: &str) -> String {
    format!("PropTypes.shape({name}.propTypes)")
}

fn braced(members: &[String]) -> String {
    if members.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", members.join(", "))
    }
}

/// Projects property schemas for one document.
pub struct Projector<'a> {
    doc: &'a SpecDocument,
    settings: &'a Settings,
    ref_stack: RefCell<Vec<String>>,
}

impl<'a> Projector<'a> {
    pub fn new(doc: &'a SpecDocument, settings: &'a Settings) -> Self {
        Self {
            doc,
            settings,
            ref_stack: RefCell::new(Vec::new()),
        }
    }

    /// Project a property schema, given its dependency leaf from the walker.
    ///
    /// `enum_constants` names the enum values positionally, if the property
    /// declares any. `None` means no type could be projected; callers render
    /// it as the `any` escape hatch, which is also what a reference back
    /// into a schema already being projected yields.
    pub fn project(
        &self,
        schema: &'a Value,
        dependency: Option<&DependencyNode>,
        enum_constants: &[String],
    ) -> Result<Option<TypeExpr>> {
        let Some(reference) = schema
            .get("$ref")
            .and_then(Value::as_str)
            .filter(|r| r.starts_with('#'))
        else {
            return self.project_resolved(schema, dependency, enum_constants);
        };

        if self.ref_stack.borrow().iter().any(|seen| seen == reference) {
            tracing::warn!(reference, "cyclic reference while projecting type, using any");
            return Ok(None);
        }

        self.ref_stack.borrow_mut().push(reference.to_string());
        let result = self.project_resolved(schema, dependency, enum_constants);
        self.ref_stack.borrow_mut().pop();
        result
    }

    fn project_resolved(
        &self,
        schema: &'a Value,
        dependency: Option<&DependencyNode>,
        enum_constants: &[String],
    ) -> Result<Option<TypeExpr>> {
        let schema = self.doc.resolve(schema)?;

        if let Some(values) = schema.get("enum").and_then(Value::as_array) {
            return Ok(Some(enum_type(values, enum_constants)));
        }

        if let Some(models) = self.model_ref_list(schema)? {
            return Ok(Some(TypeExpr::OneOfModels(models)));
        }

        if let Some(dependency) = dependency {
            return self.from_dependency(Some(schema), dependency).map(Some);
        }

        if has_type(schema, "array") {
            let inner = match schema.get("items") {
                Some(items) if items.is_object() => self.project(items, None, &[])?,
                _ => None,
            };
            return Ok(Some(match inner {
                Some(inner) => TypeExpr::List(Box::new(inner)),
                None => TypeExpr::Primitive(Primitive::Array),
            }));
        }

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            let mut members = Vec::with_capacity(properties.len());
            for (key, property) in properties {
                let member = self.project(property, None, &[])?.unwrap_or(ANY);
                members.push((self.settings.attribute_case.apply(key), member));
            }
            return Ok(Some(TypeExpr::Shape(members)));
        }

        Ok(Primitive::of_schema(schema).map(TypeExpr::Primitive))
    }

    /// Candidate models of a `oneOf` whose branches are all model references.
    fn model_ref_list(&self, schema: &'a Value) -> Result<Option<Vec<String>>> {
        let Some(branches) = schema.get("oneOf").and_then(Value::as_array) else {
            return Ok(None);
        };
        let mut names: Vec<String> = Vec::with_capacity(branches.len());
        for branch in branches {
            let SchemaKind::Model { name, .. } = classify(self.doc, self.settings, branch)? else {
                return Ok(None);
            };
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        Ok((!names.is_empty()).then_some(names))
    }

    fn from_dependency(
        &self,
        schema: Option<&'a Value>,
        dependency: &DependencyNode,
    ) -> Result<TypeExpr> {
        let schema = match schema {
            Some(schema) => Some(self.doc.resolve(schema)?),
            None => None,
        };

        Ok(match dependency {
            DependencyNode::Model { name, .. } => TypeExpr::Model(name.clone()),
            DependencyNode::Union { members, .. } => TypeExpr::OneOfModels(members.clone()),
            DependencyNode::List(inner) => {
                let items = schema.and_then(|s| s.get("items"));
                TypeExpr::List(Box::new(self.from_dependency(items, inner)?))
            }
            DependencyNode::Object(entries) => {
                let case = self.settings.attribute_case;
                let mut members = Vec::new();
                match schema
                    .and_then(|s| s.get("properties"))
                    .and_then(Value::as_object)
                {
                    Some(properties) => {
                        for (key, property) in properties {
                            let member = self
                                .project(property, dependency.get(key), &[])?
                                .unwrap_or(ANY);
                            members.push((case.apply(key), member));
                        }
                    }
                    None => {
                        for (key, inner) in entries {
                            let raw = schema.and_then(|s| s.get(key.as_str()));
                            members.push((case.apply(key), self.from_dependency(raw, inner)?));
                        }
                    }
                }
                TypeExpr::Shape(members)
            }
        })
    }
}

const ANY: TypeExpr = TypeExpr::Primitive(Primitive::Any);

fn enum_type(values: &[Value], constants: &[String]) -> TypeExpr {
    TypeExpr::OneOfValues(
        values
            .iter()
            .enumerate()
            .map(|(i, value)| EnumLiteral {
                value: value.clone(),
                constant: constants.get(i).cloned(),
            })
            .collect(),
    )
}

/// Name of the constant generated for one enum value of a property.
///
/// - `("status", "active")` → `"STATUS_ACTIVE"`
/// - `("status", "in progress")` → `"STATUS_IN_PROGRESS"`
/// - `("locale", "en-US")` → `"LOCALE_EN_US"`
///
/// Runs of characters outside `[A-Za-z0-9_]` become a single `_`.
pub fn enum_constant_name(property: &str, value: &str) -> String {
    format!("{property} {value}")
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

/// Text of an enum value as used inside a constant name.
pub fn enum_value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a JSON value as a JavaScript literal.
pub fn js_literal(value: &Value) -> String {
    match value {
        Value::String(s) => js_string(s),
        other => other.to_string(),
    }
}

/// Render a single-quoted JavaScript string literal.
pub fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('\'');
    out
}

/// Render an object key, quoting it unless it is a plain identifier.
pub fn js_key(key: &str) -> String {
    let mut chars = key.chars();
    let is_ident = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_ident {
        key.to_string()
    } else {
        js_string(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> SpecDocument {
        SpecDocument::new(json!({
            "components": {"schemas": {
                "Cat": {"x-model": "Cat", "properties": {"id": {"type": "integer"}}},
                "Dog": {"x-model": "Dog", "properties": {"id": {"type": "integer"}}}
            }}
        }))
    }

    fn project(schema: &Value, dependency: Option<&DependencyNode>) -> Option<TypeExpr> {
        let doc = doc();
        let settings = Settings::default();
        Projector::new(&doc, &settings)
            .project(schema, dependency, &[])
            .unwrap()
    }

    fn model_leaf(name: &str) -> DependencyNode {
        DependencyNode::Model {
            name: name.into(),
            schema_name: format!("{name}Schema"),
        }
    }

    #[test]
    fn primitive_type_mapping() {
        assert_eq!(Primitive::from_type_name("integer"), Primitive::Number);
        assert_eq!(Primitive::from_type_name("number"), Primitive::Number);
        assert_eq!(Primitive::from_type_name("string"), Primitive::String);
        assert_eq!(Primitive::from_type_name("boolean"), Primitive::Boolean);
        assert_eq!(Primitive::from_type_name("array"), Primitive::Array);
        assert_eq!(Primitive::from_type_name("uuid"), Primitive::Any);

        assert_eq!(Primitive::Boolean.prop_type(), "PropTypes.bool");
        assert_eq!(Primitive::Array.flow_type(), "Array<any>");
        assert_eq!(Primitive::Any.flow_type(), "any");
    }

    #[test]
    fn nullable_type_lists_use_first_non_null() {
        assert_eq!(
            Primitive::of_schema(&json!({"type": ["null", "string"]})),
            Some(Primitive::String)
        );
        assert_eq!(Primitive::of_schema(&json!({})), None);
    }

    #[test]
    fn recursive_non_model_refs_project_to_any() {
        let doc = SpecDocument::new(json!({
            "components": {"schemas": {
                "Node": {
                    "type": "object",
                    "properties": {
                        "label": {"type": "string"},
                        "children": {"type": "array", "items": {"$ref": "#/components/schemas/Node"}},
                        "parent": {"$ref": "#/components/schemas/Node"}
                    }
                }
            }}
        }));
        let settings = Settings::default();
        let projector = Projector::new(&doc, &settings);
        let node = json!({"$ref": "#/components/schemas/Node"});

        let expr = projector.project(&node, None, &[]).unwrap().unwrap();
        assert_eq!(
            expr.flow_type(),
            "{ label: string, children: Array<any>, parent: any }"
        );
        assert_eq!(
            expr.prop_type(),
            "PropTypes.shape({ label: PropTypes.string, children: PropTypes.array, parent: PropTypes.any })"
        );

        // The stack unwinds, so sibling projections start fresh.
        let again = projector.project(&node, None, &[]).unwrap().unwrap();
        assert_eq!(again, expr);
    }

    #[test]
    fn plain_primitives_project_directly() {
        let expr = project(&json!({"type": "integer"}), None).unwrap();
        assert_eq!(expr.prop_type(), "PropTypes.number");
        assert_eq!(expr.flow_type(), "number");
        assert_eq!(project(&json!({"description": "opaque"}), None), None);
    }

    #[test]
    fn one_of_model_refs_take_priority() {
        let schema = json!({"oneOf": [
            {"$ref": "#/components/schemas/Cat"},
            {"$ref": "#/components/schemas/Dog"},
            {"$ref": "#/components/schemas/Cat"}
        ]});
        let expr = project(&schema, Some(&model_leaf("Cat"))).unwrap();
        assert_eq!(expr, TypeExpr::OneOfModels(vec!["Cat".into(), "Dog".into()]));
        assert_eq!(
            expr.prop_type(),
            "PropTypes.oneOfType([PropTypes.shape(Cat.propTypes), PropTypes.shape(Dog.propTypes)])"
        );
        assert_eq!(expr.flow_type(), "Cat | Dog");
    }

    #[test]
    fn mixed_one_of_falls_through() {
        let schema = json!({"oneOf": [{"$ref": "#/components/schemas/Cat"}, {"type": "string"}]});
        assert_eq!(project(&schema, None), None);
    }

    #[test]
    fn dependency_leaves_unwrap_recursively() {
        let schema = json!({"type": "array", "items": {"$ref": "#/components/schemas/Dog"}});
        let leaf = DependencyNode::List(Box::new(model_leaf("Dog")));
        let expr = project(&schema, Some(&leaf)).unwrap();
        assert_eq!(expr.prop_type(), "PropTypes.arrayOf(PropTypes.shape(Dog.propTypes))");
        assert_eq!(expr.flow_type(), "Array<Dog>");

        let union = DependencyNode::Union {
            key: "oneOfSchema1".into(),
            members: vec!["Cat".into(), "Dog".into()],
        };
        let expr = project(&json!({"oneOf": []}), Some(&union)).unwrap();
        assert_eq!(expr.flow_type(), "Cat | Dog");
    }

    #[test]
    fn object_leaves_keep_primitive_siblings() {
        let schema = json!({
            "type": "object",
            "properties": {
                "nick_name": {"type": "string"},
                "best_friend": {"$ref": "#/components/schemas/Cat"}
            }
        });
        let leaf = DependencyNode::Object(vec![("best_friend".into(), model_leaf("Cat"))]);
        let expr = project(&schema, Some(&leaf)).unwrap();
        assert_eq!(
            expr.prop_type(),
            "PropTypes.shape({ nickName: PropTypes.string, bestFriend: PropTypes.shape(Cat.propTypes) })"
        );
        assert_eq!(expr.flow_type(), "{ nickName: string, bestFriend: Cat }");
    }

    #[test]
    fn object_leaves_without_raw_properties_use_entries() {
        let leaf = DependencyNode::Object(vec![(
            "friends".into(),
            DependencyNode::List(Box::new(model_leaf("Dog"))),
        )]);
        let expr = project(&json!({"friends": {}}), Some(&leaf)).unwrap();
        assert_eq!(expr.flow_type(), "{ friends: Array<Dog> }");
    }

    #[test]
    fn primitive_arrays_project_item_type() {
        let expr = project(&json!({"type": "array", "items": {"type": "string"}}), None).unwrap();
        assert_eq!(expr.prop_type(), "PropTypes.arrayOf(PropTypes.string)");
        assert_eq!(expr.flow_type(), "Array<string>");

        let bare = project(&json!({"type": "array"}), None).unwrap();
        assert_eq!(bare.prop_type(), "PropTypes.array");
        assert_eq!(bare.flow_type(), "Array<any>");
    }

    #[test]
    fn inline_primitive_objects_become_shapes() {
        let schema = json!({
            "type": "object",
            "properties": {
                "street": {"type": "string"},
                "zip_code": {"type": "integer"},
                "geo": {"type": "object", "properties": {"lat": {"type": "number"}}}
            }
        });
        let expr = project(&schema, None).unwrap();
        assert_eq!(
            expr.flow_type(),
            "{ street: string, zipCode: number, geo: { lat: number } }"
        );
    }

    #[test]
    fn enums_use_constants_when_present() {
        let doc = doc();
        let settings = Settings::default();
        let projector = Projector::new(&doc, &settings);
        let schema = json!({"type": "string", "enum": ["active", "banned"]});

        let named = projector
            .project(
                &schema,
                None,
                &["STATUS_ACTIVE".to_string(), "STATUS_BANNED".to_string()],
            )
            .unwrap()
            .unwrap();
        assert_eq!(named.prop_type(), "PropTypes.oneOf([STATUS_ACTIVE, STATUS_BANNED])");
        assert_eq!(named.flow_type(), "typeof STATUS_ACTIVE | typeof STATUS_BANNED");

        let raw = projector.project(&schema, None, &[]).unwrap().unwrap();
        assert_eq!(raw.prop_type(), "PropTypes.oneOf(['active', 'banned'])");
        assert_eq!(raw.flow_type(), "'active' | 'banned'");
    }

    #[test]
    fn enum_constant_names() {
        assert_eq!(enum_constant_name("status", "active"), "STATUS_ACTIVE");
        assert_eq!(enum_constant_name("status", "in progress"), "STATUS_IN_PROGRESS");
        assert_eq!(enum_constant_name("level", "2"), "LEVEL_2");
        assert_eq!(enum_constant_name("status", "in-progress"), "STATUS_IN_PROGRESS");
        assert_eq!(enum_constant_name("locale", "en-US"), "LOCALE_EN_US");
        assert_eq!(enum_constant_name("ratio", "1.5"), "RATIO_1_5");
        assert_eq!(enum_constant_name("mode", "read/write (all)"), "MODE_READ_WRITE_ALL");
        assert_eq!(enum_value_text(&json!(2)), "2");
        assert_eq!(enum_value_text(&json!("x")), "x");
    }

    #[test]
    fn js_literals_and_keys() {
        assert_eq!(js_string("it's"), r"'it\'s'");
        assert_eq!(js_literal(&json!(3)), "3");
        assert_eq!(js_literal(&json!(null)), "null");
        assert_eq!(js_key("petId"), "petId");
        assert_eq!(js_key("content-type"), "'content-type'");
        assert_eq!(js_key("1st"), "'1st'");
    }
}
