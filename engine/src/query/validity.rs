//! Validity checks
//!
//! A tree is worth compiling when at least one filter names a field.
//! Values are not inspected: `is-null`, `is-not-null` and equality to null
//! are all legal.

use super::rule::{QueryFilter, QueryGroup, QueryRule};

/// True when the filter names a field
pub fn is_valid_filter(filter: &QueryFilter) -> bool {
    !filter.field.trim().is_empty()
}

/// True when some child, at any depth, is a valid filter
pub fn is_valid_group(group: &QueryGroup) -> bool {
    group.filters.iter().any(is_valid_rule)
}

pub fn is_valid_rule(rule: &QueryRule) -> bool {
    match rule {
        QueryRule::Filter(filter) => is_valid_filter(filter),
        QueryRule::Group(group) => is_valid_group(group),
    }
}

/// Entry point for optional roots; a missing tree is invalid
pub fn is_valid(rule: Option<&QueryRule>) -> bool {
    rule.is_some_and(is_valid_rule)
}

impl QueryFilter {
    pub fn is_valid(&self) -> bool {
        is_valid_filter(self)
    }
}

impl QueryGroup {
    pub fn is_valid(&self) -> bool {
        is_valid_group(self)
    }
}

impl QueryRule {
    pub fn is_valid(&self) -> bool {
        is_valid_rule(self)
    }
}
