//! Operator registry
//!
//! Maps an operator code to the [`OperatorWriter`] that emits its predicate
//! text. Lookups are case-insensitive. Codes with no registered writer fall
//! back to an `==` comparison instead of failing.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::builder::ExpressionWriter;
use super::rule::QueryFilter;

/// Built-in operator codes
pub mod codes {
    pub const EQUAL: &str = "equal";
    pub const NOT_EQUAL: &str = "not-equal";
    pub const GREATER_THAN: &str = "greater-than";
    pub const GREATER_THAN_OR_EQUAL: &str = "greater-than-or-equal";
    pub const LESS_THAN: &str = "less-than";
    pub const LESS_THAN_OR_EQUAL: &str = "less-than-or-equal";

    pub const CONTAINS: &str = "contains";
    pub const NOT_CONTAINS: &str = "not-contains";
    pub const STARTS_WITH: &str = "starts-with";
    pub const NOT_STARTS_WITH: &str = "not-starts-with";
    pub const ENDS_WITH: &str = "ends-with";
    pub const NOT_ENDS_WITH: &str = "not-ends-with";

    pub const IS_NULL: &str = "is-null";
    pub const IS_NOT_NULL: &str = "is-not-null";
}

/// Emits the predicate text for one filter
///
/// Implemented by the built-in writers and by any closure taking
/// `(&QueryFilter, &mut ExpressionWriter)`. A writer that emits no text has
/// its bound parameters discarded.
pub trait OperatorWriter: Send + Sync {
    fn write(&self, filter: &QueryFilter, out: &mut ExpressionWriter);
}

impl<F> OperatorWriter for F
where
    F: Fn(&QueryFilter, &mut ExpressionWriter) + Send + Sync,
{
    fn write(&self, filter: &QueryFilter, out: &mut ExpressionWriter) {
        self(filter, out)
    }
}

/// `[!]field.Method(@N, <comparison>)`
#[derive(Debug, Clone, Copy)]
pub struct StringMethodWriter {
    method: &'static str,
    negate: bool,
}

impl StringMethodWriter {
    pub const fn new(method: &'static str, negate: bool) -> Self {
        Self { method, negate }
    }
}

impl OperatorWriter for StringMethodWriter {
    fn write(&self, filter: &QueryFilter, out: &mut ExpressionWriter) {
        let index = out.push_parameter(filter.value.clone());
        let prefix = if self.negate { "!" } else { "" };
        let clause = format!(
            "{}{}.{}(@{}, {})",
            prefix,
            filter.field,
            self.method,
            index,
            out.comparison()
        );
        out.push_str(&clause);
    }
}

/// `field <symbol> @N`
#[derive(Debug, Clone, Copy)]
pub struct ComparisonWriter {
    symbol: &'static str,
}

impl ComparisonWriter {
    pub const fn new(symbol: &'static str) -> Self {
        Self { symbol }
    }
}

impl OperatorWriter for ComparisonWriter {
    fn write(&self, filter: &QueryFilter, out: &mut ExpressionWriter) {
        let index = out.push_parameter(filter.value.clone());
        out.push_str(&format!("{} {} @{}", filter.field, self.symbol, index));
    }
}

/// `field <symbol> NULL`, binds no parameter
#[derive(Debug, Clone, Copy)]
pub struct NullWriter {
    symbol: &'static str,
}

impl NullWriter {
    pub const fn new(symbol: &'static str) -> Self {
        Self { symbol }
    }
}

impl OperatorWriter for NullWriter {
    fn write(&self, filter: &QueryFilter, out: &mut ExpressionWriter) {
        out.push_str(&format!("{} {} NULL", filter.field, self.symbol));
    }
}

/// Operator code to writer table
///
/// Share one registry between builders with `Arc`. Registration takes
/// `&self`; finish registering before the first build.
pub struct OperatorRegistry {
    writers: RwLock<HashMap<String, Arc<dyn OperatorWriter>>>,
    fallback: Arc<dyn OperatorWriter>,
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        let registry = Self::empty();

        registry.register_writer(codes::CONTAINS, StringMethodWriter::new("Contains", false));
        registry.register_writer(codes::NOT_CONTAINS, StringMethodWriter::new("Contains", true));
        registry.register_writer(codes::STARTS_WITH, StringMethodWriter::new("StartsWith", false));
        registry.register_writer(
            codes::NOT_STARTS_WITH,
            StringMethodWriter::new("StartsWith", true),
        );
        registry.register_writer(codes::ENDS_WITH, StringMethodWriter::new("EndsWith", false));
        registry.register_writer(codes::NOT_ENDS_WITH, StringMethodWriter::new("EndsWith", true));

        registry.register_writer(codes::EQUAL, ComparisonWriter::new("=="));
        registry.register_writer(codes::NOT_EQUAL, ComparisonWriter::new("!="));
        registry.register_writer(codes::GREATER_THAN, ComparisonWriter::new(">"));
        registry.register_writer(codes::GREATER_THAN_OR_EQUAL, ComparisonWriter::new(">="));
        registry.register_writer(codes::LESS_THAN, ComparisonWriter::new("<"));
        registry.register_writer(codes::LESS_THAN_OR_EQUAL, ComparisonWriter::new("<="));

        registry.register_writer(codes::IS_NULL, NullWriter::new("=="));
        registry.register_writer(codes::IS_NOT_NULL, NullWriter::new("!="));

        registry
    }
}

impl std::fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorRegistry")
            .field("codes", &self.codes())
            .finish()
    }
}

impl OperatorRegistry {
    /// Registry with no writers; every code uses the `==` fallback
    pub fn empty() -> Self {
        Self {
            writers: RwLock::new(HashMap::new()),
            fallback: Arc::new(ComparisonWriter::new("==")),
        }
    }

    /// Add or replace the writer for `code` (last registration wins)
    pub fn register_writer<W>(&self, code: &str, writer: W)
    where
        W: OperatorWriter + 'static,
    {
        let key = normalize(code);
        tracing::trace!(code = %key, "Registering operator writer");
        self.writers.write().insert(key, Arc::new(writer));
    }

    /// Writer for `code`, or the `==` comparison fallback
    pub fn writer(&self, code: &str) -> Arc<dyn OperatorWriter> {
        let key = normalize(code);
        match self.writers.read().get(&key) {
            Some(writer) => Arc::clone(writer),
            None => {
                tracing::debug!(code = %key, "Unknown operator, using equality fallback");
                Arc::clone(&self.fallback)
            }
        }
    }

    pub fn contains_operator(&self, code: &str) -> bool {
        self.writers.read().contains_key(&normalize(code))
    }

    /// Registered codes, sorted
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.writers.read().keys().cloned().collect();
        codes.sort();
        codes
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}
