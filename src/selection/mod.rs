//! Column selection subsystem
//!
//! Resolves an ordered list of selection terms against a catalog of column
//! names into an ordered output-name -> source-name mapping.
//!
//! # Components (leaves first)
//!
//! - Matcher library: `starts_with`, `ends_with`, `contains`, `matches`,
//!   `num_range`
//! - Binding environment: matcher names shadow catalog names
//! - Term evaluator: one term to signed index assignments
//! - Selection resolver: dedup, identity default, exclusion, naming
//!
//! # Guarantees
//!
//! - Deterministic: same catalog and terms give the same mapping
//! - Stateless: nothing is kept between calls
//! - All or nothing: an error never comes with a partial mapping

mod ast;
mod env;
mod errors;
mod evaluator;
mod explain;
mod matchers;
mod parser;
mod resolver;

pub use ast::{Arg, Expr, SelectionTerm, MAX_NESTING_DEPTH};
pub use env::{Binding, BindingEnv};
pub use errors::{SelectionError, SelectionErrorCode, SelectionResult};
pub use evaluator::{TermEvaluator, TermResult, Value, MAX_NUM_WIDTH, MAX_RANGE_LEN};
pub use explain::{explain_selection, SelectionExplain, TermExplain};
pub use matchers::{contains, ends_with, matches, num_range, starts_with, Matcher, MatcherCall};
pub use parser::parse_selection;
pub use resolver::{
    resolve_rename, resolve_selection, resolve_selection_with, MultiRenamePolicy,
    ResolvedSelection, SelectionEntry, SelectionOptions, SelectionResolver,
};
