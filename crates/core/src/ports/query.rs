//! Structured predicate model shared by every query engine.
//!
//! A [`FilterClause`] is an AND-list of `(field path, operator, parameter)`
//! triples plus the parameter values. Adapters translate it into SQL or
//! evaluate it in memory; both the row query and the count query of a
//! paged lookup are derived from the same clause.

use std::collections::BTreeMap;

use crate::error::{StorageError, StorageResult};

/// Comparison applied by a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `field = :param`
    Eq,
    /// `UPPER(field) LIKE UPPER('%' || :param || '%')`
    ContainsIgnoreCase,
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Int(i64),
    Text(String),
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One named condition of a WHERE clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate {
    /// Public field path, e.g. `name` or `category.id`.
    pub field: &'static str,
    pub operator: Operator,
    /// Name of the parameter holding the compared value.
    pub param: &'static str,
}

/// AND-combination of predicates with their parameter map.
///
/// An empty clause matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterClause {
    predicates: Vec<Predicate>,
    parameters: BTreeMap<&'static str, QueryValue>,
}

impl FilterClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `field <operator> :param` and bind `value` to `param`.
    pub fn and(
        mut self,
        field: &'static str,
        operator: Operator,
        param: &'static str,
        value: impl Into<QueryValue>,
    ) -> Self {
        self.predicates.push(Predicate {
            field,
            operator,
            param,
        });
        self.parameters.insert(param, value.into());
        self
    }

    /// Add the predicate only when `value` is present.
    pub fn and_some<V: Into<QueryValue>>(
        self,
        field: &'static str,
        operator: Operator,
        param: &'static str,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(value) => self.and(field, operator, param, value),
            None => self,
        }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn parameter(&self, name: &str) -> Option<&QueryValue> {
        self.parameters.get(name)
    }

    /// True when no predicate constrains the result.
    pub fn is_open(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Each predicate paired with its bound value.
    ///
    /// Fails if a predicate references a parameter that was never bound.
    pub fn bound(&self) -> StorageResult<Vec<(&Predicate, &QueryValue)>> {
        self.predicates
            .iter()
            .map(|predicate| {
                self.parameters
                    .get(predicate.param)
                    .map(|value| (predicate, value))
                    .ok_or_else(|| {
                        StorageError::InvalidQuery(format!(
                            "parameter :{} is not bound",
                            predicate.param
                        ))
                    })
            })
            .collect()
    }
}

/// Escape `%`, `_` and `\` so user text matches literally inside LIKE.
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
