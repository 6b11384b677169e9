//! Authorization module: synthesizes field-level authorization filters.
//!
//! The indexer projects the policy of every thing into the document: for each resource level it
//! stores the subjects granted and the subjects revoked at exactly that level. A field is visible
//! to the caller if, walking from the field up its ancestor chain, the first level that mentions
//! any caller subject grants rather than revokes. For a chain `[p0, p1, .., ""]`:
//!
//! ```text
//! auth([""])        = OR( granted("") IN S )
//! auth([p, rest..]) = AND( revoked(p) NIN S, OR( granted(p) IN S, auth(rest) ) )
//! ```
//!
//! A revoke at any level on the way up therefore denies, and the root carries no revoke check.

use crate::context::AuthorizationContext;
use crate::field::AncestorChain;
use crate::schema::IndexSchema;
use bson::{doc, Bson, Document};

pub struct AuthorizationFilterBuilder<'a> {
    schema: &'a IndexSchema,
    subjects: Bson,
}

impl<'a> AuthorizationFilterBuilder<'a> {
    pub fn new(schema: &'a IndexSchema, context: &AuthorizationContext) -> Self {
        Self {
            schema,
            subjects: context.to_bson(),
        }
    }

    /// Authorization filter for a field with the given ancestor chain.
    pub fn build(&self, chain: &AncestorChain) -> Document {
        self.build_levels(chain.levels())
    }

    fn build_levels(&self, levels: &[String]) -> Document {
        match levels {
            [] | [_] => doc! { "$or": [self.granted(levels.first().map_or("", String::as_str))] },
            [level, rest @ ..] => doc! {
                "$and": [
                    self.revoked(level),
                    { "$or": [self.granted(level), self.build_levels(rest)] },
                ]
            },
        }
    }

    fn granted(&self, level: &str) -> Document {
        let mut filter = Document::new();
        filter.insert(self.schema.granted_path(level), doc! { "$in": self.subjects.clone() });
        filter
    }

    fn revoked(&self, level: &str) -> Document {
        let mut filter = Document::new();
        filter.insert(self.schema.revoked_path(level), doc! { "$nin": self.subjects.clone() });
        filter
    }
}
