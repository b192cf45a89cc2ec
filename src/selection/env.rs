//! Binding environment
//!
//! Two-level symbol table built fresh for each resolution call:
//!
//! 1. Matcher layer: the five matcher names (checked first)
//! 2. Catalog layer: every catalog name bound to its 1-based position
//!
//! A matcher name therefore shadows a catalog column of the same name.

use std::collections::HashMap;

use super::errors::{SelectionError, SelectionResult};
use super::matchers::{Matcher, MatcherCall};

/// What a name resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// A matcher function
    Matcher(Matcher),
    /// A catalog column at this 1-based position
    Position(usize),
}

/// Name resolution scope over one catalog
#[derive(Debug)]
pub struct BindingEnv<'a> {
    vars: &'a [String],
    positions: HashMap<&'a str, usize>,
}

impl<'a> BindingEnv<'a> {
    /// Builds the environment over `vars`
    ///
    /// Catalog names are expected to be distinct; on a duplicate the first
    /// position wins.
    pub fn new(vars: &'a [String]) -> Self {
        let mut positions = HashMap::with_capacity(vars.len());
        for (i, name) in vars.iter().enumerate() {
            positions.entry(name.as_str()).or_insert(i + 1);
        }
        Self { vars, positions }
    }

    /// Resolves `name`, matcher layer first
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        if let Some(matcher) = Matcher::from_name(name) {
            return Some(Binding::Matcher(matcher));
        }
        self.positions.get(name).map(|&p| Binding::Position(p))
    }

    /// Resolves `name` in the catalog layer only
    pub fn position_of(&self, name: &str) -> SelectionResult<usize> {
        self.positions
            .get(name)
            .copied()
            .ok_or_else(|| SelectionError::unknown_variable(name))
    }

    /// Catalog name at a 1-based position
    pub fn name_at(&self, position: usize) -> Option<&'a str> {
        position
            .checked_sub(1)
            .and_then(|i| self.vars.get(i))
            .map(String::as_str)
    }

    /// Invokes a bound matcher with the catalog closed over
    pub fn invoke(&self, call: &MatcherCall) -> SelectionResult<Vec<usize>> {
        call.apply(self.vars)
    }

    /// The catalog this environment was built from
    pub fn vars(&self) -> &'a [String] {
        self.vars
    }

    /// Number of catalog columns
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns true for an empty catalog
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_catalog_layer() {
        let v = vars(&["a", "b", "c"]);
        let env = BindingEnv::new(&v);
        assert_eq!(env.lookup("b"), Some(Binding::Position(2)));
        assert_eq!(env.lookup("zz"), None);
        assert_eq!(env.name_at(3), Some("c"));
        assert_eq!(env.name_at(0), None);
        assert_eq!(env.name_at(4), None);
    }

    #[test]
    fn test_matcher_layer_shadows_catalog() {
        let v = vars(&["contains", "x"]);
        let env = BindingEnv::new(&v);
        assert_eq!(
            env.lookup("contains"),
            Some(Binding::Matcher(Matcher::Contains))
        );
        // The catalog layer still knows the column
        assert_eq!(env.position_of("contains").unwrap(), 1);
    }

    #[test]
    fn test_position_of_unknown() {
        let v = vars(&["a"]);
        let env = BindingEnv::new(&v);
        let err = env.position_of("b").unwrap_err();
        assert_eq!(err.argument(), Some("b"));
    }

    #[test]
    fn test_invoke_closes_over_catalog() {
        let v = vars(&["abc", "acd", "bbc"]);
        let env = BindingEnv::new(&v);
        let call = MatcherCall::StartsWith {
            prefix: "a".into(),
            ignore_case: true,
        };
        assert_eq!(env.invoke(&call).unwrap(), vec![1, 2]);
    }
}
