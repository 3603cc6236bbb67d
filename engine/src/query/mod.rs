//! Query filter expression engine
//!
//! Compiles a filter tree into predicate text with positional parameters,
//! and persists filter values without losing their type.
//!
//! ## Usage
//!
//! ```
//! use sieve_engine::query::{ExpressionBuilder, QueryFilter, QueryGroup, QueryRule, codes};
//!
//! let rule = QueryRule::from(QueryGroup::or().with_filters([
//!     QueryFilter::new("Rank", codes::EQUAL, 7),
//!     QueryFilter::new("Name", codes::EQUAL, "Apple"),
//! ]));
//!
//! let mut builder = ExpressionBuilder::new();
//! builder.build(Some(&rule));
//! assert_eq!(builder.expression(), "(Rank == @0 or Name == @1)");
//! assert_eq!(builder.parameters().len(), 2);
//! ```

mod builder;
pub mod codec;
mod operators;
mod persist;
mod rule;
mod validity;
mod value;

pub use builder::{
    BuilderOptions, CompiledQuery, DEFAULT_COMPARISON, ExpressionBuilder, ExpressionWriter,
    compile,
};
pub use codec::DecodeError;
pub use operators::{
    ComparisonWriter, NullWriter, OperatorRegistry, OperatorWriter, StringMethodWriter, codes,
};
pub use persist::{
    MAX_DOCUMENT_SIZE, MAX_GROUP_DEPTH, PersistError, load_group, load_group_or_default,
    save_group, save_group_pretty,
};
pub use rule::{QueryFilter, QueryGroup, QueryLogic, QueryRule};
pub use validity::{is_valid, is_valid_filter, is_valid_group, is_valid_rule};
pub use value::ScalarValue;
