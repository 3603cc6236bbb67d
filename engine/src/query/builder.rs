//! Expression compiler
//!
//! Walks a [`QueryRule`] tree depth-first and produces predicate text with
//! positional placeholders plus the values they bind:
//!
//! ```text
//! (Rank > @0 and (Name == @1 or Name == @2))   [5, "Strawberry", "Blueberry"]
//! ```
//!
//! Placeholder indices follow pre-order traversal. Building never fails:
//! blank-field filters and empty groups produce no text, so an invalid tree
//! compiles to an empty or partial expression. Gate execution with
//! [`is_valid`](super::is_valid) when that matters.

use std::sync::Arc;

use serde::Serialize;

use super::operators::OperatorRegistry;
use super::rule::{QueryFilter, QueryGroup, QueryRule};
use super::value::ScalarValue;

/// Case-insensitive comparison token passed to string methods
pub const DEFAULT_COMPARISON: &str = "StringComparison.OrdinalIgnoreCase";

/// Output buffer shared by the operator writers during one build
#[derive(Debug, Clone)]
pub struct ExpressionWriter {
    text: String,
    parameters: Vec<ScalarValue>,
    comparison: String,
}

impl ExpressionWriter {
    pub fn new(comparison: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            parameters: Vec::new(),
            comparison: comparison.into(),
        }
    }

    pub fn push_str(&mut self, s: &str) {
        self.text.push_str(s);
    }

    /// Bind a value and return its placeholder index
    pub fn push_parameter(&mut self, value: ScalarValue) -> usize {
        let index = self.parameters.len();
        self.parameters.push(value);
        index
    }

    /// Token for case-insensitive string comparisons
    pub fn comparison(&self) -> &str {
        &self.comparison
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parameters(&self) -> &[ScalarValue] {
        &self.parameters
    }

    pub fn into_parts(self) -> (String, Vec<ScalarValue>) {
        (self.text, self.parameters)
    }

    fn clear(&mut self) {
        self.text.clear();
        self.parameters.clear();
    }
}

/// Builder settings
#[derive(Debug, Clone)]
pub struct BuilderOptions {
    /// Token written as the second argument of string method calls
    pub comparison: String,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            comparison: DEFAULT_COMPARISON.to_string(),
        }
    }
}

/// Predicate text and the values its placeholders bind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub text: String,
    pub parameters: Vec<ScalarValue>,
}

impl CompiledQuery {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Reusable rule compiler
///
/// Each [`build`](Self::build) clears the previous output first. A builder
/// holds mutable state; give each caller its own instance and share the
/// [`OperatorRegistry`] instead.
#[derive(Debug)]
pub struct ExpressionBuilder {
    registry: Arc<OperatorRegistry>,
    out: ExpressionWriter,
}

impl Default for ExpressionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionBuilder {
    /// Builder with its own registry of built-in operators
    pub fn new() -> Self {
        Self::with_registry(Arc::new(OperatorRegistry::default()))
    }

    pub fn with_registry(registry: Arc<OperatorRegistry>) -> Self {
        Self::with_options(registry, BuilderOptions::default())
    }

    pub fn with_options(registry: Arc<OperatorRegistry>, options: BuilderOptions) -> Self {
        Self {
            registry,
            out: ExpressionWriter::new(options.comparison),
        }
    }

    pub fn registry(&self) -> &Arc<OperatorRegistry> {
        &self.registry
    }

    /// Compile `rule`, replacing any previous output
    ///
    /// `None` yields an empty expression with no parameters.
    pub fn build(&mut self, rule: Option<&QueryRule>) {
        self.reset();

        if let Some(rule) = rule {
            self.visit(rule);
        }

        tracing::trace!(
            expression = %self.out.text(),
            parameters = self.out.parameters().len(),
            "Compiled query rule"
        );
    }

    /// Compile a group root
    pub fn build_group(&mut self, group: &QueryGroup) {
        self.reset();
        self.visit_group(group);
    }

    /// Clear output without compiling
    pub fn reset(&mut self) {
        self.out.clear();
    }

    pub fn expression(&self) -> &str {
        self.out.text()
    }

    pub fn parameters(&self) -> &[ScalarValue] {
        self.out.parameters()
    }

    /// Copy of the current output
    pub fn compiled(&self) -> CompiledQuery {
        CompiledQuery {
            text: self.out.text().to_string(),
            parameters: self.out.parameters().to_vec(),
        }
    }

    /// Move the output out of the builder
    pub fn into_compiled(self) -> CompiledQuery {
        let (text, parameters) = self.out.into_parts();
        CompiledQuery { text, parameters }
    }

    fn visit(&mut self, rule: &QueryRule) {
        match rule {
            QueryRule::Group(group) => self.visit_group(group),
            QueryRule::Filter(filter) => self.visit_filter(filter),
        }
    }

    fn visit_group(&mut self, group: &QueryGroup) {
        if group.filters.is_empty() {
            return;
        }

        let start = self.out.text.len();
        let separator = format!(" {} ", group.logic.keyword());
        self.out.push_str("(");

        let mut wrote_child = false;
        for rule in &group.filters {
            let mark = self.out.text.len();
            if wrote_child {
                self.out.push_str(&separator);
            }

            let body = self.out.text.len();
            self.visit(rule);

            // Child emitted nothing: drop its separator too
            if self.out.text.len() == body {
                self.out.text.truncate(mark);
            } else {
                wrote_child = true;
            }
        }

        if wrote_child {
            self.out.push_str(")");
        } else {
            self.out.text.truncate(start);
        }
    }

    fn visit_filter(&mut self, filter: &QueryFilter) {
        if filter.field.trim().is_empty() {
            return;
        }

        let writer = self.registry.writer(filter.operator_code());
        let mark = self.out.text.len();
        let bound = self.out.parameters.len();
        writer.write(filter, &mut self.out);

        // No text means no placeholder can refer to what was bound
        if self.out.text.len() == mark {
            self.out.parameters.truncate(bound);
        }
    }
}

/// Compile `rule` with the built-in operators
pub fn compile(rule: &QueryRule) -> CompiledQuery {
    let mut builder = ExpressionBuilder::new();
    builder.build(Some(rule));
    builder.into_compiled()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::operators::{ComparisonWriter, codes};
    use crate::query::rule::QueryLogic;

    fn filter(field: &str, operator: &str, value: impl Into<ScalarValue>) -> QueryRule {
        QueryRule::Filter(QueryFilter::new(field, operator, value))
    }

    fn group(logic: QueryLogic, rules: Vec<QueryRule>) -> QueryRule {
        QueryRule::Group(QueryGroup::new(logic).with_filters(rules))
    }

    fn build(rule: &QueryRule) -> (String, Vec<ScalarValue>) {
        let compiled = compile(rule);
        (compiled.text, compiled.parameters)
    }

    #[test]
    fn single_filter() {
        let (text, parameters) = build(&filter("Rank", codes::EQUAL, 7));
        assert_eq!(text, "Rank == @0");
        assert_eq!(parameters, vec![ScalarValue::Int32(7)]);
    }

    #[test]
    fn or_group() {
        let rule = group(
            QueryLogic::Or,
            vec![
                filter("Rank", codes::EQUAL, 7),
                filter("Name", codes::EQUAL, "Apple"),
            ],
        );

        let (text, parameters) = build(&rule);
        assert_eq!(text, "(Rank == @0 or Name == @1)");
        assert_eq!(
            parameters,
            vec![ScalarValue::Int32(7), ScalarValue::from("Apple")]
        );
    }

    #[test]
    fn nested_group_numbers_in_traversal_order() {
        let rule = group(
            QueryLogic::And,
            vec![
                filter("Rank", codes::GREATER_THAN, 5),
                group(
                    QueryLogic::Or,
                    vec![
                        filter("Name", codes::EQUAL, "Strawberry"),
                        filter("Name", codes::EQUAL, "Blueberry"),
                    ],
                ),
            ],
        );

        let (text, parameters) = build(&rule);
        assert_eq!(text, "(Rank > @0 and (Name == @1 or Name == @2))");
        assert_eq!(
            parameters,
            vec![
                ScalarValue::Int32(5),
                ScalarValue::from("Strawberry"),
                ScalarValue::from("Blueberry"),
            ]
        );
    }

    #[test]
    fn nested_group_interleaves_with_siblings() {
        let rule = group(
            QueryLogic::And,
            vec![
                group(QueryLogic::Or, vec![filter("A", codes::EQUAL, 1)]),
                filter("B", codes::EQUAL, 2),
                group(QueryLogic::Or, vec![filter("C", codes::EQUAL, 3)]),
            ],
        );

        let (text, parameters) = build(&rule);
        assert_eq!(text, "((A == @0) and B == @1 and (C == @2))");
        assert_eq!(
            parameters,
            vec![
                ScalarValue::Int32(1),
                ScalarValue::Int32(2),
                ScalarValue::Int32(3)
            ]
        );
    }

    #[test]
    fn contains_and_not_contains() {
        let (text, parameters) = build(&filter("Name", codes::CONTAINS, "berry"));
        assert_eq!(text, "Name.Contains(@0, StringComparison.OrdinalIgnoreCase)");
        assert_eq!(parameters, vec![ScalarValue::from("berry")]);

        let (text, _) = build(&filter("Name", codes::NOT_CONTAINS, "berry"));
        assert_eq!(text, "!Name.Contains(@0, StringComparison.OrdinalIgnoreCase)");
    }

    #[test]
    fn is_null_binds_no_parameter() {
        let (text, parameters) = build(&filter("Description", codes::IS_NULL, ScalarValue::Null));
        assert_eq!(text, "Description == NULL");
        assert!(parameters.is_empty());
    }

    #[test]
    fn null_operator_between_parameters_keeps_numbering() {
        let rule = group(
            QueryLogic::And,
            vec![
                filter("Rank", codes::GREATER_THAN, 1),
                filter("Description", codes::IS_NOT_NULL, ScalarValue::Null),
                filter("Name", codes::STARTS_WITH, "B"),
            ],
        );

        let (text, parameters) = build(&rule);
        assert_eq!(
            text,
            "(Rank > @0 and Description != NULL and Name.StartsWith(@1, StringComparison.OrdinalIgnoreCase))"
        );
        assert_eq!(parameters.len(), 2);
    }

    #[test]
    fn equality_to_null_binds_null() {
        let (text, parameters) = build(&filter("Description", codes::EQUAL, ScalarValue::Null));
        assert_eq!(text, "Description == @0");
        assert_eq!(parameters, vec![ScalarValue::Null]);
    }

    #[test]
    fn blank_operator_is_equal() {
        let (text, _) = build(&filter("Rank", "", 7));
        assert_eq!(text, "Rank == @0");
    }

    #[test]
    fn none_root_is_empty() {
        let mut builder = ExpressionBuilder::new();
        builder.build(None);
        assert_eq!(builder.expression(), "");
        assert!(builder.parameters().is_empty());
        assert!(builder.compiled().is_empty());
    }

    #[test]
    fn empty_group_writes_nothing() {
        let (text, parameters) = build(&group(QueryLogic::And, vec![]));
        assert_eq!(text, "");
        assert!(parameters.is_empty());
    }

    #[test]
    fn blank_field_filter_is_skipped() {
        let (text, parameters) = build(&filter("", codes::EQUAL, 7));
        assert_eq!(text, "");
        assert!(parameters.is_empty());

        let (text, _) = build(&filter("   ", codes::EQUAL, 7));
        assert_eq!(text, "");
    }

    #[test]
    fn leading_blank_child_leaves_no_dangling_keyword() {
        let rule = group(
            QueryLogic::And,
            vec![
                filter("", codes::EQUAL, 1),
                filter("Rank", codes::EQUAL, 7),
                group(QueryLogic::Or, vec![]),
                filter("Name", codes::EQUAL, "Apple"),
            ],
        );

        let (text, parameters) = build(&rule);
        assert_eq!(text, "(Rank == @0 and Name == @1)");
        assert_eq!(parameters.len(), 2);
    }

    #[test]
    fn group_of_blank_children_contributes_nothing() {
        let rule = group(
            QueryLogic::And,
            vec![
                filter("Rank", codes::EQUAL, 7),
                group(QueryLogic::Or, vec![filter("", codes::EQUAL, 1)]),
            ],
        );

        let (text, _) = build(&rule);
        assert_eq!(text, "(Rank == @0)");

        let (text, _) = build(&group(QueryLogic::Or, vec![filter("", codes::EQUAL, 1)]));
        assert_eq!(text, "");
    }

    #[test]
    fn rebuild_is_idempotent() {
        let rule = group(
            QueryLogic::Or,
            vec![
                filter("Rank", codes::EQUAL, 7),
                filter("Name", codes::CONTAINS, "berry"),
            ],
        );

        let mut builder = ExpressionBuilder::new();
        builder.build(Some(&rule));
        let first = builder.compiled();
        builder.build(Some(&rule));
        let second = builder.compiled();

        assert_eq!(first, second);
        assert_eq!(second.parameters.len(), 2);
    }

    #[test]
    fn rebuild_replaces_previous_output() {
        let mut builder = ExpressionBuilder::new();
        builder.build(Some(&filter("Rank", codes::EQUAL, 7)));
        builder.build(Some(&filter("Name", codes::EQUAL, "Apple")));

        assert_eq!(builder.expression(), "Name == @0");
        assert_eq!(builder.parameters(), &[ScalarValue::from("Apple")]);

        builder.reset();
        assert_eq!(builder.expression(), "");
        assert!(builder.parameters().is_empty());
    }

    #[test]
    fn build_group_root() {
        let root = QueryGroup::and().with_filters([QueryFilter::new("Rank", codes::LESS_THAN, 3)]);
        let mut builder = ExpressionBuilder::new();
        builder.build_group(&root);
        assert_eq!(builder.expression(), "(Rank < @0)");
    }

    #[test]
    fn custom_comparison_token() {
        let options = BuilderOptions {
            comparison: "true".to_string(),
        };
        let mut builder =
            ExpressionBuilder::with_options(Arc::new(OperatorRegistry::default()), options);
        builder.build(Some(&filter("Name", codes::ENDS_WITH, "berry")));
        assert_eq!(builder.expression(), "Name.EndsWith(@0, true)");
    }

    #[test]
    fn shared_registry_sees_later_registrations() {
        let registry = Arc::new(OperatorRegistry::default());
        let mut first = ExpressionBuilder::with_registry(Arc::clone(&registry));
        let mut second = ExpressionBuilder::with_registry(Arc::clone(&registry));

        registry.register_writer("like", ComparisonWriter::new("LIKE"));

        let rule = filter("Name", "like", "A%");
        first.build(Some(&rule));
        second.build(Some(&rule));
        assert_eq!(first.expression(), "Name LIKE @0");
        assert_eq!(second.expression(), first.expression());
    }

    #[test]
    fn into_compiled_moves_output() {
        let mut builder = ExpressionBuilder::new();
        builder.build(Some(&group(
            QueryLogic::Or,
            vec![
                filter("Rank", codes::EQUAL, 7),
                filter("Name", codes::EQUAL, "Apple"),
            ],
        )));
        let copy = builder.compiled();

        let compiled = builder.into_compiled();
        assert_eq!(compiled, copy);
        assert_eq!(compiled.text, "(Rank == @0 or Name == @1)");
        assert_eq!(
            compiled.parameters,
            vec![ScalarValue::Int32(7), ScalarValue::from("Apple")]
        );
    }

    #[test]
    fn silent_writer_leaves_no_parameters() {
        let registry = Arc::new(OperatorRegistry::default());
        registry.register_writer("ignored", |filter: &QueryFilter, out: &mut ExpressionWriter| {
            out.push_parameter(filter.value.clone());
        });

        let rule = group(
            QueryLogic::And,
            vec![
                filter("Rank", "ignored", 1),
                filter("Name", codes::EQUAL, "Apple"),
            ],
        );
        let mut builder = ExpressionBuilder::with_registry(registry);
        builder.build(Some(&rule));

        assert_eq!(builder.expression(), "(Name == @0)");
        assert_eq!(builder.parameters(), &[ScalarValue::from("Apple")]);

        builder.build(Some(&filter("Rank", "ignored", 1)));
        assert_eq!(builder.expression(), "");
        assert!(builder.parameters().is_empty());
    }

    #[test]
    fn compiled_query_serializes_parameters_as_envelopes() {
        let compiled = compile(&filter("Rank", codes::EQUAL, 7));
        let json = serde_json::to_value(&compiled).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"text": "Rank == @0", "parameters": [["int32", 7]]})
        );
    }
}
