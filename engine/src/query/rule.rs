//! Filter tree model
//!
//! A tree is a [`QueryGroup`] of [`QueryRule`]s, where each rule is either a
//! leaf [`QueryFilter`] or a nested group. Children are owned, so trees are
//! always acyclic.
//!
//! Persisted form (rules inside a group are tagged by `type`):
//!
//! ```json
//! {
//!   "logic": "and",
//!   "filters": [
//!     {"type": "filter", "field": "Rank", "operator": "greater-than", "value": ["int32", 5]},
//!     {"type": "group", "logic": "or", "filters": []}
//!   ]
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::operators::codes;
use super::value::ScalarValue;

/// Join keyword between the children of a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryLogic {
    #[default]
    And,
    Or,
}

impl QueryLogic {
    pub fn keyword(&self) -> &'static str {
        match self {
            QueryLogic::And => "and",
            QueryLogic::Or => "or",
        }
    }
}

impl fmt::Display for QueryLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A node of the filter tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryRule {
    Filter(QueryFilter),
    Group(QueryGroup),
}

impl QueryRule {
    /// Caller-assigned tag of the node
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Filter(filter) => filter.id.as_deref(),
            Self::Group(group) => group.id.as_deref(),
        }
    }
}

impl From<QueryFilter> for QueryRule {
    fn from(filter: QueryFilter) -> Self {
        Self::Filter(filter)
    }
}

impl From<QueryGroup> for QueryRule {
    fn from(group: QueryGroup) -> Self {
        Self::Group(group)
    }
}

/// Leaf predicate: `field <operator> value`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    #[serde(default)]
    pub field: String,
    /// Operator code; blank means [`codes::EQUAL`]
    #[serde(default)]
    pub operator: String,
    #[serde(default, skip_serializing_if = "ScalarValue::is_null")]
    pub value: ScalarValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl QueryFilter {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<ScalarValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Operator code with the blank default applied
    pub fn operator_code(&self) -> &str {
        let code = self.operator.trim();
        if code.is_empty() { codes::EQUAL } else { code }
    }
}

/// Composite node joining its children with one [`QueryLogic`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryGroup {
    #[serde(default)]
    pub logic: QueryLogic,
    #[serde(default)]
    pub filters: Vec<QueryRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl QueryGroup {
    pub fn new(logic: QueryLogic) -> Self {
        Self {
            logic,
            filters: Vec::new(),
            id: None,
        }
    }

    pub fn and() -> Self {
        Self::new(QueryLogic::And)
    }

    pub fn or() -> Self {
        Self::new(QueryLogic::Or)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_filters<I, R>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<QueryRule>,
    {
        self.filters.extend(rules.into_iter().map(Into::into));
        self
    }

    pub fn push(&mut self, rule: impl Into<QueryRule>) {
        self.filters.push(rule.into());
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// Find the first descendant with `id` (pre-order)
    pub fn find(&self, id: &str) -> Option<&QueryRule> {
        for rule in &self.filters {
            if rule.id() == Some(id) {
                return Some(rule);
            }
            if let QueryRule::Group(group) = rule
                && let Some(found) = group.find(id)
            {
                return Some(found);
            }
        }
        None
    }

    /// Remove every descendant tagged `id`; returns how many were removed
    ///
    /// A removed group takes its children with it.
    pub fn remove(&mut self, id: &str) -> usize {
        let before = self.filters.len();
        self.filters.retain(|rule| rule.id() != Some(id));
        let mut removed = before - self.filters.len();

        for rule in &mut self.filters {
            if let QueryRule::Group(group) = rule {
                removed += group.remove(id);
            }
        }
        removed
    }

    /// Nesting depth; a group with no child groups has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .filters
            .iter()
            .map(|rule| match rule {
                QueryRule::Group(group) => group.depth(),
                QueryRule::Filter(_) => 0,
            })
            .max()
            .unwrap_or(0)
    }
}
