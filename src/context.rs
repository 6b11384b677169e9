//! Context module: holds the subject ids a query executes on behalf of.
//!
//! This module provides the AuthorizationContext type. It is resolved by the caller for every
//! request and only read during compilation.

use std::collections::BTreeSet;
use bson::Bson;
use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationContext {
    subjects: BTreeSet<String>,
}

impl AuthorizationContext {
    pub fn new<I, S>(subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subjects: subjects.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, subject: &str) -> bool {
        self.subjects.contains(subject)
    }

    /// Subject ids in their canonical (sorted) order.
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.subjects.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// The subject ids as the BSON array operand of `$in`/`$nin`.
    pub fn to_bson(&self) -> Bson {
        Bson::Array(self.subjects.iter().cloned().map(Bson::String).collect())
    }
}
