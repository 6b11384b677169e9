//! Sort module: compiles sort options into native sort documents over the sorting projection.
//!
//! The indexer mirrors every sortable field into a flat sorting namespace that carries no policy
//! data, so sort keys never depend on the caller's authorization. Documents missing a sort field
//! order as if the field were null.

use crate::field::{FieldExpression, FieldTarget};
use crate::schema::IndexSchema;
use crate::{Result, ThingSearchError};
use bson::{Bson, Document};
use serde::{Serialize, Deserialize};
use std::collections::HashSet;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Native sort-key value: `1` ascending, `-1` descending.
    pub fn to_bson(self) -> Bson {
        match self {
            SortDirection::Ascending => Bson::Int32(1),
            SortDirection::Descending => Bson::Int32(-1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    field: FieldExpression,
    direction: SortDirection,
}

impl SortOption {
    /// Sort option on a field the sorting projection mirrors.
    pub fn new(field: FieldExpression, direction: SortDirection) -> Result<Self> {
        if !field.is_sortable() {
            return Err(ThingSearchError::InvalidArgument(format!("Field '{field}' is not sortable")));
        }
        Ok(Self { field, direction })
    }

    pub fn ascending(field: FieldExpression) -> Result<Self> {
        Self::new(field, SortDirection::Ascending)
    }

    pub fn descending(field: FieldExpression) -> Result<Self> {
        Self::new(field, SortDirection::Descending)
    }

    pub fn field(&self) -> &FieldExpression {
        &self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

pub struct SortCompiler<'a> {
    schema: &'a IndexSchema,
}

impl<'a> SortCompiler<'a> {
    pub fn new(schema: &'a IndexSchema) -> Self {
        Self { schema }
    }

    /// Physical path a sort option orders by.
    pub fn sort_path(&self, option: &SortOption) -> String {
        match option.field.target() {
            FieldTarget::ThingId => self.schema.id_field().to_string(),
            FieldTarget::Document { path, .. } | FieldTarget::FeatureElement { path, .. } => {
                self.schema.sorting_path(&path)
            }
        }
    }

    /// Sort keys in order. A repeated path keeps its first direction and the id field always
    /// closes the list so the order is total.
    pub fn sort_keys(&self, options: &[SortOption]) -> Vec<(String, SortDirection)> {
        let mut keys: Vec<(String, SortDirection)> = Vec::with_capacity(options.len() + 1);
        let mut seen = HashSet::new();
        for option in options {
            let path = self.sort_path(option);
            if !seen.insert(path.clone()) {
                trace!(%path, "skipping repeated sort key");
                continue;
            }
            keys.push((path, option.direction));
        }
        let id = self.schema.id_field();
        if !seen.contains(id) {
            keys.push((id.to_string(), SortDirection::Ascending));
        }
        keys
    }

    /// Native sort document.
    pub fn compile(&self, options: &[SortOption]) -> Document {
        self.sort_keys(options)
            .into_iter()
            .map(|(path, direction)| (path, direction.to_bson()))
            .collect()
    }

    /// Values of the sort keys in a result document, for resuming a sorted scan after it. One
    /// value per key of the compiled sort document; absent fields yield `Null`.
    pub fn sort_values(&self, document: &Document, options: &[SortOption]) -> Vec<Bson> {
        self.sort_keys(options)
            .iter()
            .map(|(path, _)| lookup(document, path))
            .collect()
    }
}

fn lookup(document: &Document, path: &str) -> Bson {
    let mut current = document;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        match (current.get(segment), segments.peek()) {
            (Some(value), None) => return value.clone(),
            (Some(Bson::Document(inner)), Some(_)) => current = inner,
            _ => break,
        }
    }
    Bson::Null
}
