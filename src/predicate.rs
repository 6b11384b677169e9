//! Predicate module: single-field comparisons and their compilation into BSON fragments.
//!
//! A predicate knows nothing about where its field lives. [`compile`] turns it into a
//! [`PathFilter`] that is applied to a physical path later, either a top-level document path or a
//! path relative to an array element inside `$elemMatch`.

use crate::types::Value;
use crate::{Result, ThingSearchError};
use bson::{doc, Bson, Document};
use serde::{Serialize, Deserialize};

/// Compiled predicate waiting for the physical path it applies to.
pub type PathFilter = Box<dyn Fn(&str) -> Document + Send + Sync + 'static>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Ge(Value),
    Lt(Value),
    Le(Value),
    Like(String),
    ILike(String),
    In(Vec<Value>),
}

impl Predicate {
    pub fn eq(value: impl Into<Value>) -> Self {
        Predicate::Eq(value.into())
    }
    pub fn ne(value: impl Into<Value>) -> Self {
        Predicate::Ne(value.into())
    }
    pub fn gt(value: impl Into<Value>) -> Self {
        Predicate::Gt(value.into())
    }
    pub fn ge(value: impl Into<Value>) -> Self {
        Predicate::Ge(value.into())
    }
    pub fn lt(value: impl Into<Value>) -> Self {
        Predicate::Lt(value.into())
    }
    pub fn le(value: impl Into<Value>) -> Self {
        Predicate::Le(value.into())
    }

    /// Case-sensitive wildcard match. Only string patterns are accepted.
    pub fn like(value: impl Into<Value>) -> Result<Self> {
        Ok(Predicate::Like(pattern_string("like", value.into())?))
    }

    /// Case-insensitive wildcard match. Only string patterns are accepted.
    pub fn ilike(value: impl Into<Value>) -> Result<Self> {
        Ok(Predicate::ILike(pattern_string("ilike", value.into())?))
    }

    pub fn in_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::In(values.into_iter().map(Into::into).collect())
    }
}

fn pattern_string(op: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(ThingSearchError::InvalidArgument(format!(
            "'{op}' requires a string pattern, got {}",
            other.type_name()
        ))),
    }
}

/// Translates a `*`/`?` wildcard pattern into an anchored regular expression.
pub fn like_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('^');
    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '*' | '?' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str(if c == '*' { ".*" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}

/// Compiles a predicate into the operator document it contributes, e.g. `{"$gt": 5}`.
pub fn operator_document(predicate: &Predicate) -> Document {
    match predicate {
        Predicate::Eq(v) => doc! { "$eq": v.to_bson() },
        Predicate::Ne(v) => doc! { "$ne": v.to_bson() },
        Predicate::Gt(v) => doc! { "$gt": v.to_bson() },
        Predicate::Ge(v) => doc! { "$gte": v.to_bson() },
        Predicate::Lt(v) => doc! { "$lt": v.to_bson() },
        Predicate::Le(v) => doc! { "$lte": v.to_bson() },
        Predicate::Like(pattern) => doc! { "$regex": like_to_regex(pattern) },
        Predicate::ILike(pattern) => doc! { "$regex": like_to_regex(pattern), "$options": "i" },
        Predicate::In(values) => {
            let values: Vec<Bson> = values.iter().map(Value::to_bson).collect();
            doc! { "$in": values }
        }
    }
}

pub fn compile(predicate: &Predicate) -> PathFilter {
    let operator = operator_document(predicate);
    Box::new(move |path| {
        let mut filter = Document::new();
        filter.insert(path, operator.clone());
        filter
    })
}

/// Existence check at a physical path.
pub fn exists(path: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(path, doc! { "$exists": true });
    filter
}
