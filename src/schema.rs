//! Schema module: describes the physical layout of indexed thing documents.
//!
//! This module provides the IndexSchema type and builder. Every compiled path is derived from
//! these names, so the indexer and the compiler only have to agree on one schema value.
//!
//! An indexed document looks like this with the default layout:
//!
//! ```text
//! {
//!   "_id": "<thing id>",
//!   "t": { "attributes": {..}, "features": {..}, "_metadata": {..}, .. },
//!   "p": { "g": [..], "attributes": { "g": [..], "r": [..], "a1": { "g": [..], .. } }, .. },
//!   "s": { "attributes": { "a1": .. }, .. },
//!   "f": [ { "id": "f1", "properties": {..}, "desiredProperties": {..}, "p": {..} }, .. ]
//! }
//! ```

use crate::{Result, ThingSearchError};
use serde::{Serialize, Deserialize};
use std::collections::HashSet;

const DEFAULT_ID: &str = "_id";
const DEFAULT_THING: &str = "t";
const DEFAULT_POLICY: &str = "p";
const DEFAULT_GRANTED: &str = "g";
const DEFAULT_REVOKED: &str = "r";
const DEFAULT_SORTING: &str = "s";
const DEFAULT_FEATURES: &str = "f";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct IndexSchema {
    id: String,
    thing: String,
    policy: String,
    granted: String,
    revoked: String,
    sorting: String,
    features: String,
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self {
            id: DEFAULT_ID.to_string(),
            thing: DEFAULT_THING.to_string(),
            policy: DEFAULT_POLICY.to_string(),
            granted: DEFAULT_GRANTED.to_string(),
            revoked: DEFAULT_REVOKED.to_string(),
            sorting: DEFAULT_SORTING.to_string(),
            features: DEFAULT_FEATURES.to_string(),
        }
    }
}

impl IndexSchema {
    /// Load a schema from its JSON form. Missing keys fall back to the default layout.
    pub fn from_json(json: &str) -> Result<Self> {
        let builder: IndexSchemaBuilder = serde_json::from_str(json)
            .map_err(|e| ThingSearchError::Config(format!("Invalid index schema: {e}")))?;
        builder.build()
    }

    pub fn id_field(&self) -> &str {
        &self.id
    }
    pub fn features_field(&self) -> &str {
        &self.features
    }

    /// Physical path of a thing value, e.g. `t.attributes.a1`.
    pub fn thing_path(&self, relative: &str) -> String {
        join(&self.thing, relative)
    }

    /// Physical path inside the sorting projection, e.g. `s.attributes.a1`.
    pub fn sorting_path(&self, relative: &str) -> String {
        join(&self.sorting, relative)
    }

    /// Policy field listing the subjects granted at an ancestor level. The root level is `""`.
    pub fn granted_path(&self, level: &str) -> String {
        join(&join(&self.policy, level), &self.granted)
    }

    /// Policy field listing the subjects revoked at an ancestor level.
    pub fn revoked_path(&self, level: &str) -> String {
        join(&join(&self.policy, level), &self.revoked)
    }

    fn validate(&self) -> Result<()> {
        let names = [
            ("id", &self.id),
            ("thing", &self.thing),
            ("policy", &self.policy),
            ("granted", &self.granted),
            ("revoked", &self.revoked),
            ("sorting", &self.sorting),
            ("features", &self.features),
        ];
        for (key, name) in names {
            if name.is_empty() {
                return Err(ThingSearchError::Config(format!("Schema name '{key}' must not be empty")));
            }
            if name.contains('.') || name.starts_with('$') {
                return Err(ThingSearchError::Config(format!(
                    "Schema name '{key}' is not a plain field name: '{name}'"
                )));
            }
        }
        let top_level = [&self.id, &self.thing, &self.policy, &self.sorting, &self.features];
        let distinct: HashSet<_> = top_level.iter().collect();
        if distinct.len() != top_level.len() {
            return Err(ThingSearchError::Config("Top-level schema names must be distinct".to_string()));
        }
        if self.granted == self.revoked {
            return Err(ThingSearchError::Config("Granted and revoked names must differ".to_string()));
        }
        Ok(())
    }
}

fn join(prefix: &str, relative: &str) -> String {
    if relative.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}.{relative}")
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexSchemaBuilder {
    id: Option<String>,
    thing: Option<String>,
    policy: Option<String>,
    granted: Option<String>,
    revoked: Option<String>,
    sorting: Option<String>,
    features: Option<String>,
}

impl IndexSchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn id(mut self, name: impl Into<String>) -> Self {
        self.id = Some(name.into());
        self
    }
    pub fn thing(mut self, name: impl Into<String>) -> Self {
        self.thing = Some(name.into());
        self
    }
    pub fn policy(mut self, name: impl Into<String>) -> Self {
        self.policy = Some(name.into());
        self
    }
    pub fn granted(mut self, name: impl Into<String>) -> Self {
        self.granted = Some(name.into());
        self
    }
    pub fn revoked(mut self, name: impl Into<String>) -> Self {
        self.revoked = Some(name.into());
        self
    }
    pub fn sorting(mut self, name: impl Into<String>) -> Self {
        self.sorting = Some(name.into());
        self
    }
    pub fn features(mut self, name: impl Into<String>) -> Self {
        self.features = Some(name.into());
        self
    }
    pub fn build(self) -> Result<IndexSchema> {
        let defaults = IndexSchema::default();
        let schema = IndexSchema {
            id: self.id.unwrap_or(defaults.id),
            thing: self.thing.unwrap_or(defaults.thing),
            policy: self.policy.unwrap_or(defaults.policy),
            granted: self.granted.unwrap_or(defaults.granted),
            revoked: self.revoked.unwrap_or(defaults.revoked),
            sorting: self.sorting.unwrap_or(defaults.sorting),
            features: self.features.unwrap_or(defaults.features),
        };
        schema.validate()?;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let schema = IndexSchema::default();
        assert_eq!(schema.thing_path("attributes.a1"), "t.attributes.a1");
        assert_eq!(schema.sorting_path("attributes.a1"), "s.attributes.a1");
        assert_eq!(schema.granted_path("attributes.a1"), "p.attributes.a1.g");
        assert_eq!(schema.revoked_path("attributes"), "p.attributes.r");
        assert_eq!(schema.granted_path(""), "p.g");
        assert_eq!(schema.id_field(), "_id");
        assert_eq!(schema.features_field(), "f");
    }

    #[test]
    fn test_builder_overrides() {
        let schema = IndexSchemaBuilder::new()
            .thing("thing")
            .policy("policy")
            .granted("grants")
            .build()
            .unwrap();
        assert_eq!(schema.thing_path("attributes"), "thing.attributes");
        assert_eq!(schema.granted_path(""), "policy.grants");
        assert_eq!(schema.revoked_path("features"), "policy.features.r");
    }

    #[test]
    fn test_builder_rejects_invalid_names() {
        assert!(matches!(IndexSchemaBuilder::new().thing("").build(), Err(ThingSearchError::Config(_))));
        assert!(matches!(IndexSchemaBuilder::new().policy("a.b").build(), Err(ThingSearchError::Config(_))));
        assert!(matches!(IndexSchemaBuilder::new().sorting("$s").build(), Err(ThingSearchError::Config(_))));
        assert!(matches!(IndexSchemaBuilder::new().sorting("t").build(), Err(ThingSearchError::Config(_))));
        assert!(matches!(IndexSchemaBuilder::new().revoked("g").build(), Err(ThingSearchError::Config(_))));
    }

    #[test]
    fn test_schema_from_json() {
        let schema = IndexSchema::from_json(r#"{ "thing": "thing", "features": "feats" }"#).unwrap();
        assert_eq!(schema.thing_path("x"), "thing.x");
        assert_eq!(schema.features_field(), "feats");
        assert_eq!(schema.granted_path(""), "p.g");
        assert_eq!(IndexSchema::from_json("{}").unwrap(), IndexSchema::default());
    }

    #[test]
    fn test_schema_from_json_rejects_unknown_keys() {
        assert!(matches!(IndexSchema::from_json(r#"{ "thnig": "x" }"#), Err(ThingSearchError::Config(_))));
        assert!(matches!(IndexSchema::from_json("not json"), Err(ThingSearchError::Config(_))));
    }

    #[test]
    fn test_schema_serialization_deserialization() {
        let schema = IndexSchemaBuilder::new().sorting("sort").build().unwrap();
        let json = serde_json::to_string(&schema).unwrap();
        let deserialized: IndexSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(schema, deserialized);
    }
}
