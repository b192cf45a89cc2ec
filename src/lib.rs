//! colsel - A strict, deterministic column selection resolver
//!
//! Resolves a list of selection terms (bare names, ranges, negations,
//! pattern matchers, renames) against an ordered column catalog and
//! produces the ordered `output <- source` mapping a data-frame select
//! or rename would apply.

pub mod cli;
pub mod config;
pub mod observability;
pub mod selection;
