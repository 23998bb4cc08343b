//! Discriminated union (`oneOf` + `discriminator`) resolution.
//!
//! Builds the discriminator-value → schema-name table for one union. With an
//! explicit `discriminator.mapping`, every entry must point at exactly one
//! branch by its raw reference string; without one, each branch maps from its
//! own model name.

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// One `oneOf` branch, already classified as a model.
#[derive(Debug, Clone)]
pub struct Branch<'a> {
    /// Model name from the branch's model marker.
    pub name: String,
    /// Canonical schema name of the model.
    pub schema_name: String,
    /// Reference string the branch was declared with, if any.
    pub raw_ref: Option<&'a str>,
}

/// The resolved discriminator table of a union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionMapping {
    pub property_name: String,
    /// `(discriminator value, schema name)` pairs in declared order.
    pub mapping: Vec<(String, String)>,
}

/// A union as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnionDescriptor {
    /// Placeholder identifier, unique within the owning model (`oneOfSchema1`, ...).
    pub key: String,
    /// Discriminator property, after the attribute naming transform.
    pub property_name: String,
    #[serde(serialize_with = "serialize_pairs")]
    pub mapping: Vec<(String, String)>,
}

/// Resolve the discriminator table for a union declared inside model `owner`.
pub fn resolve_one_of(
    owner: &str,
    discriminator: &Value,
    branches: &[Branch<'_>],
) -> Result<UnionMapping> {
    let property_name = discriminator
        .get("propertyName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::Discriminator {
            model: owner.to_string(),
        })?
        .to_string();

    let mapping = match discriminator.get("mapping").and_then(Value::as_object) {
        Some(table) => {
            let mut mapping = Vec::with_capacity(table.len());
            for (value, reference) in table {
                let reference = reference.as_str().unwrap_or_default();
                let schema_name = unique_branch(owner, value, reference, branches)?;
                mapping.push((value.clone(), schema_name));
            }
            mapping
        }
        None => branches
            .iter()
            .map(|b| (b.name.clone(), b.schema_name.clone()))
            .collect(),
    };

    Ok(UnionMapping {
        property_name,
        mapping,
    })
}

fn unique_branch(
    owner: &str,
    value: &str,
    reference: &str,
    branches: &[Branch<'_>],
) -> Result<String> {
    let mut matches = branches.iter().filter(|b| b.raw_ref == Some(reference));
    match (matches.next(), matches.count()) {
        (Some(branch), 0) => Ok(branch.schema_name.clone()),
        (first, rest) => Err(Error::DiscriminatorMapping {
            model: owner.to_string(),
            value: value.to_string(),
            reference: reference.to_string(),
            matches: usize::from(first.is_some()) + rest,
        }),
    }
}

fn serialize_pairs<S: Serializer>(
    pairs: &[(String, String)],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(pairs.iter().map(|(k, v)| (k, v)))
}
