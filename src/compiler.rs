//! Compiler module: compiles criteria trees into native BSON filters.
//!
//! Every field and existence check is conjoined with the authorization filter of the field's
//! ancestor chain. Checks on a wildcard feature are scoped to one features array element with
//! `$elemMatch`, so the value and its authorization are evaluated against the same element.

use crate::auth::AuthorizationFilterBuilder;
use crate::context::AuthorizationContext;
use crate::criteria::Criteria;
use crate::field::{FieldExpression, FieldTarget};
use crate::predicate::{self, Predicate};
use crate::schema::IndexSchema;
use bson::{doc, Document};
use tracing::trace;

/// Filter matching every document.
pub fn always_true() -> Document {
    Document::new()
}

/// Filter matching no document: the negation of an always-true disjunct.
pub fn always_false() -> Document {
    doc! { "$nor": [always_true()] }
}

pub struct CriteriaCompiler<'a> {
    schema: &'a IndexSchema,
    authorization: Option<AuthorizationFilterBuilder<'a>>,
}

impl<'a> CriteriaCompiler<'a> {
    /// Compiler enforcing field-level authorization for the given subjects.
    pub fn new(schema: &'a IndexSchema, context: &AuthorizationContext) -> Self {
        Self {
            schema,
            authorization: Some(AuthorizationFilterBuilder::new(schema, context)),
        }
    }

    /// Compiler for administrative queries that see every field.
    pub fn unrestricted(schema: &'a IndexSchema) -> Self {
        Self { schema, authorization: None }
    }

    pub fn compile(&self, criteria: &Criteria) -> Document {
        match criteria {
            Criteria::Any => always_true(),
            Criteria::And(children) if children.is_empty() => always_true(),
            Criteria::And(children) => doc! { "$and": self.compile_all(children) },
            Criteria::Or(children) if children.is_empty() => always_false(),
            Criteria::Or(children) => doc! { "$or": self.compile_all(children) },
            // nor of nothing negates the empty disjunction
            Criteria::Nor(children) if children.is_empty() => always_true(),
            Criteria::Nor(children) => doc! { "$nor": self.compile_all(children) },
            Criteria::Field(field, predicate) => self.compile_field(field, predicate),
            Criteria::Exists(field) => self.compile_exists(field),
        }
    }

    fn compile_all(&self, children: &[Criteria]) -> Vec<Document> {
        children.iter().map(|c| self.compile(c)).collect()
    }

    fn compile_field(&self, field: &FieldExpression, predicate: &Predicate) -> Document {
        let path_filter = predicate::compile(predicate);
        self.compile_check(field, |path| path_filter(path))
    }

    fn compile_exists(&self, field: &FieldExpression) -> Document {
        self.compile_check(field, predicate::exists)
    }

    fn compile_check<F>(&self, field: &FieldExpression, check: F) -> Document
    where
        F: Fn(&str) -> Document,
    {
        match field.target() {
            FieldTarget::ThingId => {
                trace!(field = %field, "thing id compiled without authorization");
                check(self.schema.id_field())
            }
            FieldTarget::Document { path, chain } => {
                let value = check(&self.schema.thing_path(&path));
                match &self.authorization {
                    Some(auth) => doc! { "$and": [value, auth.build(&chain)] },
                    None => value,
                }
            }
            FieldTarget::FeatureElement { path, chain } => {
                trace!(field = %field, "scoping check to a single feature element");
                let value = check(&path);
                let element = match &self.authorization {
                    Some(auth) => doc! { "$and": [value, auth.build(&chain)] },
                    None => value,
                };
                let mut filter = Document::new();
                filter.insert(self.schema.features_field(), doc! { "$elemMatch": element });
                filter
            }
        }
    }
}
