//! Criteria module: the boolean query tree over field expressions and predicates.
//!
//! Criteria are built bottom-up by the query parser and never change afterwards.

use crate::field::FieldExpression;
use crate::predicate::Predicate;
use crate::{Result, ThingSearchError};
use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Criteria {
    /// Matches every thing.
    Any,
    And(Vec<Criteria>),
    Or(Vec<Criteria>),
    Nor(Vec<Criteria>),
    Field(FieldExpression, Predicate),
    Exists(FieldExpression),
}

impl Criteria {
    pub fn any() -> Self {
        Criteria::Any
    }

    pub fn and(criteria: impl IntoIterator<Item = Criteria>) -> Self {
        Criteria::And(criteria.into_iter().collect())
    }

    pub fn or(criteria: impl IntoIterator<Item = Criteria>) -> Self {
        Criteria::Or(criteria.into_iter().collect())
    }

    pub fn nor(criteria: impl IntoIterator<Item = Criteria>) -> Self {
        Criteria::Nor(criteria.into_iter().collect())
    }

    /// Negation, expressed as a single-element `nor`.
    pub fn not(criteria: Criteria) -> Self {
        Criteria::Nor(vec![criteria])
    }

    pub fn field(field: FieldExpression, predicate: Predicate) -> Self {
        Criteria::Field(field, predicate)
    }

    pub fn exists(field: FieldExpression) -> Self {
        Criteria::Exists(field)
    }

    /// Field criteria from parser output that may be missing either part.
    pub fn try_field(field: Option<FieldExpression>, predicate: Option<Predicate>) -> Result<Self> {
        let field = field.ok_or_else(|| ThingSearchError::MissingArgument("field expression".to_string()))?;
        let predicate = predicate.ok_or_else(|| ThingSearchError::MissingArgument("predicate".to_string()))?;
        Ok(Criteria::Field(field, predicate))
    }

    pub fn try_exists(field: Option<FieldExpression>) -> Result<Self> {
        field
            .map(Criteria::Exists)
            .ok_or_else(|| ThingSearchError::MissingArgument("field expression".to_string()))
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Criteria::And(children) | Criteria::Or(children) | Criteria::Nor(children) => {
                1 + children.iter().map(Criteria::size).sum::<usize>()
            }
            Criteria::Any | Criteria::Field(..) | Criteria::Exists(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[test]
    fn test_constructors() {
        let a1 = Criteria::field(FieldExpression::attribute("a1"), Predicate::eq(1));
        let tree = Criteria::and(vec![a1.clone(), Criteria::not(Criteria::exists(FieldExpression::feature("f1")))]);
        match &tree {
            Criteria::And(children) => {
                assert_eq!(children.len(), 2);
                assert_eq!(children[0], a1);
                assert!(matches!(&children[1], Criteria::Nor(inner) if inner.len() == 1));
            }
            other => panic!("Expected and, got {other:?}"),
        }
        assert_eq!(tree.size(), 4);
        assert_eq!(Criteria::or(Vec::new()), Criteria::Or(Vec::new()));
        assert_eq!(Criteria::any().size(), 1);
    }

    #[test]
    fn test_try_field_reports_missing_parts() {
        assert!(matches!(
            Criteria::try_field(None, Some(Predicate::eq(1))),
            Err(ThingSearchError::MissingArgument(_))
        ));
        assert!(matches!(
            Criteria::try_field(Some(FieldExpression::attribute("a")), None),
            Err(ThingSearchError::MissingArgument(_))
        ));
        assert!(matches!(Criteria::try_exists(None), Err(ThingSearchError::MissingArgument(_))));
        assert_eq!(
            Criteria::try_exists(Some(FieldExpression::attribute("a"))).unwrap(),
            Criteria::exists(FieldExpression::attribute("a"))
        );
    }

    #[test]
    fn test_serialization_deserialization() {
        let tree = Criteria::or(vec![
            Criteria::field(FieldExpression::feature_property("*", "temperature"), Predicate::gt(20.5)),
            Criteria::field(FieldExpression::simple("_id"), Predicate::in_values(vec!["a:b", "a:c"])),
            Criteria::field(FieldExpression::attribute("name"), Predicate::ilike("th*ng").unwrap()),
            Criteria::Any,
        ]);
        let json = serde_json::to_string(&tree).unwrap();
        let deserialized: Criteria = serde_json::from_str(&json).unwrap();
        assert_eq!(tree, deserialized);
    }
}
