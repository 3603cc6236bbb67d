//! # Sieve
//!
//! Query filter expression engine: compiles a filter tree into a predicate
//! string with `@N` placeholders and the ordered values they bind, and
//! persists filter values with their type intact.

pub mod app;
pub mod core;
pub mod query;
