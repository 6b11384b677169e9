//! Filter module: the main compilation API handed to store executors.
//!
//! This module provides the QueryCompiler and CompiledQuery types.

use crate::compiler::CriteriaCompiler;
use crate::context::AuthorizationContext;
use crate::criteria::Criteria;
use crate::schema::IndexSchema;
use crate::sort::{SortCompiler, SortOption};
use bson::{Bson, Document};
use std::sync::Arc;
use tracing::{debug, warn};

/// A compiled query, ready for a store executor.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub filter: Document,
    pub sort: Document,
}

/// Compiles criteria and sort options against one index schema. Holds no per-query state and
/// can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    schema: Arc<IndexSchema>,
}

impl QueryCompiler {
    pub fn new(schema: Arc<IndexSchema>) -> Self {
        Self { schema }
    }

    /// Compile a query executed on behalf of the subjects in `context`.
    pub fn compile(&self, criteria: &Criteria, context: &AuthorizationContext, sort: &[SortOption]) -> CompiledQuery {
        debug!(subjects = context.len(), nodes = criteria.size(), sort_keys = sort.len(), "compiling query");
        if context.is_empty() {
            warn!("authorization context has no subjects; no authorized field can match");
        }
        CompiledQuery {
            filter: CriteriaCompiler::new(&self.schema, context).compile(criteria),
            sort: SortCompiler::new(&self.schema).compile(sort),
        }
    }

    /// Compile a query that bypasses field-level authorization.
    pub fn compile_unrestricted(&self, criteria: &Criteria, sort: &[SortOption]) -> CompiledQuery {
        debug!(nodes = criteria.size(), sort_keys = sort.len(), "compiling unrestricted query");
        CompiledQuery {
            filter: CriteriaCompiler::unrestricted(&self.schema).compile(criteria),
            sort: SortCompiler::new(&self.schema).compile(sort),
        }
    }

    /// Sort-key values of a result document, used as the cursor for the next page.
    pub fn sort_values(&self, document: &Document, sort: &[SortOption]) -> Vec<Bson> {
        SortCompiler::new(&self.schema).sort_values(document, sort)
    }

    /// Get a reference to the schema used by this compiler.
    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldExpression;
    use crate::predicate::Predicate;
    use crate::schema::IndexSchemaBuilder;
    use bson::doc;

    fn criteria() -> Criteria {
        Criteria::field(FieldExpression::simple("_id"), Predicate::eq("ns:t1"))
    }

    #[test]
    fn test_compile_filter_and_sort() {
        let compiler = QueryCompiler::default();
        let sort = vec![SortOption::descending(FieldExpression::attribute("a")).unwrap()];
        let query = compiler.compile(&criteria(), &AuthorizationContext::new(["s"]), &sort);
        assert_eq!(query.filter, doc! { "_id": { "$eq": "ns:t1" } });
        assert_eq!(query.sort, doc! { "s.attributes.a": -1, "_id": 1 });
    }

    #[test]
    fn test_compile_unrestricted() {
        let compiler = QueryCompiler::default();
        let query = compiler.compile_unrestricted(&Criteria::exists(FieldExpression::attribute("a")), &[]);
        assert_eq!(query.filter, doc! { "t.attributes.a": { "$exists": true } });
        assert_eq!(query.sort, doc! { "_id": 1 });
    }

    #[test]
    fn test_compiler_schema_access() {
        let schema = IndexSchemaBuilder::new().id("thingId").build().unwrap();
        let compiler = QueryCompiler::new(Arc::new(schema));
        assert_eq!(compiler.schema().id_field(), "thingId");
        assert_eq!(compiler.compile_unrestricted(&Criteria::Any, &[]).sort, doc! { "thingId": 1 });
    }

    #[test]
    fn test_compiler_is_shareable_across_threads() {
        let compiler = Arc::new(QueryCompiler::default());
        let context = AuthorizationContext::new(["s"]);
        let expected = compiler.compile(&criteria(), &context, &[]);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let compiler = Arc::clone(&compiler);
                let context = context.clone();
                std::thread::spawn(move || compiler.compile(&criteria(), &context, &[]))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
