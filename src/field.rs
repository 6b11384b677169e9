//! Field module: maps logical thing paths to physical storage paths and authorization chains.
//!
//! A field expression names one location in a thing, e.g. `attributes/location/lat` or
//! `features/f1/properties/temperature`. Compilers never look at the variant directly; they ask
//! for its [`FieldTarget`], which says where the value lives and which ancestor levels of the
//! policy projection decide whether the caller may see it.

use crate::{Result, ThingSearchError};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

/// Feature id matching every element of the features array.
pub const WILDCARD: &str = "*";

/// Logical name of the thing id, the only field compared without authorization.
pub const THING_ID: &str = "_id";

const ATTRIBUTES: &str = "attributes";
const FEATURES: &str = "features";
const PROPERTIES: &str = "properties";
const DESIRED_PROPERTIES: &str = "desiredProperties";
const METADATA: &str = "_metadata";
const FEATURE_ID: &str = "id";
const SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldExpression {
    Attribute(String),
    Feature(String),
    FeatureProperties(String),
    FeatureDesiredProperties(String),
    FeatureIdProperty(String, String),
    FeatureIdDesiredProperty(String, String),
    Metadata(String),
    Simple(String),
}

/// Where a field lives in an indexed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTarget {
    /// A thing field checked against the policy projection of the document itself.
    Document { path: String, chain: AncestorChain },
    /// The thing id. Its physical name comes from the index schema and it is compared without
    /// authorization.
    ThingId,
    /// A field inside some element of the features array. `path` is relative to the element.
    ///
    /// A whole wildcard feature has no value of its own inside the element, so it targets the
    /// element's `id` key: `exists` asks for any visible feature and a value predicate selects
    /// visible features by id. A named feature instead compares its whole object.
    FeatureElement { path: String, chain: AncestorChain },
}

/// Ancestor levels of a field from the field itself up to the policy root `""`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AncestorChain {
    levels: Vec<String>,
}

impl AncestorChain {
    /// Chain of a document path given as escaped segments, e.g. `[attributes, a1]` becomes
    /// `[attributes.a1, attributes, ""]`.
    pub fn of_segments(segments: &[String]) -> Self {
        Self { levels: prefixes(segments) }
    }

    /// Chain of a path relative to a features array element. The element stands for one feature,
    /// so the levels continue through the fixed `id` level and `features` up to the root.
    pub fn within_feature(segments: &[String]) -> Self {
        let mut levels = prefixes(segments);
        levels.pop();
        levels.push(FEATURE_ID.to_string());
        levels.push(FEATURES.to_string());
        levels.push(String::new());
        Self { levels }
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// The queried level itself, or `""` for the root.
    pub fn leaf(&self) -> &str {
        self.levels.first().map_or("", String::as_str)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

fn prefixes(segments: &[String]) -> Vec<String> {
    let mut levels: Vec<String> = (1..=segments.len())
        .rev()
        .map(|n| segments[..n].join("."))
        .collect();
    levels.push(String::new());
    levels
}

/// Escapes one logical key segment so it is a single, operator-free physical path segment.
pub fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '~' => escaped.push_str("~0"),
            '$' => escaped.push_str("~1"),
            '.' => escaped.push_str("~2"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn key_segments(key: &str) -> impl Iterator<Item = String> + '_ {
    key.split(SEPARATOR).filter(|s| !s.is_empty()).map(escape_key)
}

impl FieldExpression {
    pub fn attribute(key: impl Into<String>) -> Self {
        FieldExpression::Attribute(key.into())
    }
    pub fn feature(id: impl Into<String>) -> Self {
        FieldExpression::Feature(id.into())
    }
    pub fn feature_properties(id: impl Into<String>) -> Self {
        FieldExpression::FeatureProperties(id.into())
    }
    pub fn feature_desired_properties(id: impl Into<String>) -> Self {
        FieldExpression::FeatureDesiredProperties(id.into())
    }
    pub fn feature_property(id: impl Into<String>, property: impl Into<String>) -> Self {
        FieldExpression::FeatureIdProperty(id.into(), property.into())
    }
    pub fn feature_desired_property(id: impl Into<String>, property: impl Into<String>) -> Self {
        FieldExpression::FeatureIdDesiredProperty(id.into(), property.into())
    }
    pub fn metadata(key: impl Into<String>) -> Self {
        FieldExpression::Metadata(key.into())
    }
    pub fn simple(name: impl Into<String>) -> Self {
        FieldExpression::Simple(name.into())
    }

    /// Parses a logical field path such as `features/*/properties/temperature`.
    pub fn parse(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(ThingSearchError::MissingArgument("field path".to_string()));
        }
        let (head, rest) = match path.split_once(SEPARATOR) {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        match (head, rest) {
            (ATTRIBUTES, rest) => Ok(FieldExpression::Attribute(required_key(path, rest)?.to_string())),
            (METADATA, rest) => Ok(FieldExpression::Metadata(required_key(path, rest)?.to_string())),
            (FEATURES, rest) => parse_feature(path, required_key(path, rest)?),
            _ => plain_name(path).map(|name| FieldExpression::Simple(name.to_string())),
        }
    }

    /// Feature id of a feature-scoped expression.
    pub fn feature_id(&self) -> Option<&str> {
        match self {
            FieldExpression::Feature(id)
            | FieldExpression::FeatureProperties(id)
            | FieldExpression::FeatureDesiredProperties(id)
            | FieldExpression::FeatureIdProperty(id, _)
            | FieldExpression::FeatureIdDesiredProperty(id, _) => Some(id),
            FieldExpression::Attribute(_) | FieldExpression::Metadata(_) | FieldExpression::Simple(_) => None,
        }
    }

    /// Whether the expression matches against any element of the features array.
    pub fn is_wildcard(&self) -> bool {
        self.feature_id() == Some(WILDCARD)
    }

    /// Whether the sorting projection mirrors this field.
    pub fn is_sortable(&self) -> bool {
        match self {
            FieldExpression::Attribute(_) | FieldExpression::Metadata(_) | FieldExpression::Simple(_) => true,
            FieldExpression::FeatureIdProperty(id, _) | FieldExpression::FeatureIdDesiredProperty(id, _) => {
                id != WILDCARD
            }
            FieldExpression::Feature(_)
            | FieldExpression::FeatureProperties(_)
            | FieldExpression::FeatureDesiredProperties(_) => false,
        }
    }

    /// Escaped path segments below the feature level, e.g. `[properties, temperature]`.
    fn feature_segments(&self) -> Vec<String> {
        match self {
            FieldExpression::Feature(_) => Vec::new(),
            FieldExpression::FeatureProperties(_) => vec![PROPERTIES.to_string()],
            FieldExpression::FeatureDesiredProperties(_) => vec![DESIRED_PROPERTIES.to_string()],
            FieldExpression::FeatureIdProperty(_, property) => {
                std::iter::once(PROPERTIES.to_string()).chain(key_segments(property)).collect()
            }
            FieldExpression::FeatureIdDesiredProperty(_, property) => {
                std::iter::once(DESIRED_PROPERTIES.to_string()).chain(key_segments(property)).collect()
            }
            FieldExpression::Attribute(_) | FieldExpression::Metadata(_) | FieldExpression::Simple(_) => Vec::new(),
        }
    }

    /// Escaped segments of the field below the thing namespace, e.g. `[attributes, a1]`.
    pub fn segments(&self) -> Vec<String> {
        match self {
            FieldExpression::Attribute(key) => {
                std::iter::once(ATTRIBUTES.to_string()).chain(key_segments(key)).collect()
            }
            FieldExpression::Metadata(key) => {
                std::iter::once(METADATA.to_string()).chain(key_segments(key)).collect()
            }
            FieldExpression::Simple(name) => key_segments(name).collect(),
            FieldExpression::Feature(id)
            | FieldExpression::FeatureProperties(id)
            | FieldExpression::FeatureDesiredProperties(id)
            | FieldExpression::FeatureIdProperty(id, _)
            | FieldExpression::FeatureIdDesiredProperty(id, _) => {
                let mut segments = vec![FEATURES.to_string(), escape_key(id)];
                segments.extend(self.feature_segments());
                segments
            }
        }
    }

    /// Resolves where the field lives and which chain authorizes it.
    pub fn target(&self) -> FieldTarget {
        match self {
            FieldExpression::Simple(name) if name == THING_ID => FieldTarget::ThingId,
            _ if self.is_wildcard() => {
                let segments = self.feature_segments();
                let path = if segments.is_empty() {
                    FEATURE_ID.to_string()
                } else {
                    segments.join(".")
                };
                FieldTarget::FeatureElement { path, chain: AncestorChain::within_feature(&segments) }
            }
            _ => {
                let segments = self.segments();
                FieldTarget::Document { path: segments.join("."), chain: AncestorChain::of_segments(&segments) }
            }
        }
    }
}

fn required_key<'a>(path: &str, rest: Option<&'a str>) -> Result<&'a str> {
    match rest {
        Some(key) if !key.is_empty() && !key.split(SEPARATOR).any(str::is_empty) => Ok(key),
        _ => Err(ThingSearchError::InvalidArgument(format!("Field path '{path}' is missing a key"))),
    }
}

fn plain_name(path: &str) -> Result<&str> {
    let invalid = path
        .split(SEPARATOR)
        .any(|segment| segment.starts_with('$') || segment.contains('.'));
    if invalid {
        return Err(ThingSearchError::InvalidArgument(format!("Field path '{path}' is not a plain field name")));
    }
    Ok(path)
}

fn parse_feature(path: &str, rest: &str) -> Result<FieldExpression> {
    let mut parts = rest.splitn(3, SEPARATOR);
    let id = parts.next().unwrap_or_default().to_string();
    match (parts.next(), parts.next()) {
        (None, _) => Ok(FieldExpression::Feature(id)),
        (Some(PROPERTIES), None) => Ok(FieldExpression::FeatureProperties(id)),
        (Some(DESIRED_PROPERTIES), None) => Ok(FieldExpression::FeatureDesiredProperties(id)),
        (Some(PROPERTIES), Some(property)) => Ok(FieldExpression::FeatureIdProperty(id, property.to_string())),
        (Some(DESIRED_PROPERTIES), Some(property)) => {
            Ok(FieldExpression::FeatureIdDesiredProperty(id, property.to_string()))
        }
        (Some(other), _) => Err(ThingSearchError::InvalidArgument(format!(
            "Unknown feature field '{other}' in path '{path}'"
        ))),
    }
}

impl FromStr for FieldExpression {
    type Err = ThingSearchError;

    fn from_str(s: &str) -> Result<Self> {
        FieldExpression::parse(s)
    }
}

impl fmt::Display for FieldExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldExpression::Attribute(key) => write!(f, "{ATTRIBUTES}/{key}"),
            FieldExpression::Feature(id) => write!(f, "{FEATURES}/{id}"),
            FieldExpression::FeatureProperties(id) => write!(f, "{FEATURES}/{id}/{PROPERTIES}"),
            FieldExpression::FeatureDesiredProperties(id) => write!(f, "{FEATURES}/{id}/{DESIRED_PROPERTIES}"),
            FieldExpression::FeatureIdProperty(id, p) => write!(f, "{FEATURES}/{id}/{PROPERTIES}/{p}"),
            FieldExpression::FeatureIdDesiredProperty(id, p) => {
                write!(f, "{FEATURES}/{id}/{DESIRED_PROPERTIES}/{p}")
            }
            FieldExpression::Metadata(key) => write!(f, "{METADATA}/{key}"),
            FieldExpression::Simple(name) => write!(f, "{name}"),
        }
    }
}
