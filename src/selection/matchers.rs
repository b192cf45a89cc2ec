//! Matcher library
//!
//! Pure predicates over the variable catalog. Each matcher returns the
//! 1-based positions it selects; none of them touch the catalog.

use regex::RegexBuilder;

use super::errors::{SelectionError, SelectionResult};

/// The five matcher functions available inside a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Matcher {
    StartsWith,
    EndsWith,
    Contains,
    Matches,
    NumRange,
}

impl Matcher {
    /// Every matcher, in lookup order
    pub const ALL: [Matcher; 5] = [
        Matcher::StartsWith,
        Matcher::EndsWith,
        Matcher::Contains,
        Matcher::Matches,
        Matcher::NumRange,
    ];

    /// Name the matcher is bound to
    pub fn name(&self) -> &'static str {
        match self {
            Matcher::StartsWith => "starts_with",
            Matcher::EndsWith => "ends_with",
            Matcher::Contains => "contains",
            Matcher::Matches => "matches",
            Matcher::NumRange => "num_range",
        }
    }

    /// Looks up a matcher by its bound name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Formal parameters, in positional order
    pub fn params(&self) -> &'static [&'static str] {
        match self {
            Matcher::NumRange => &["prefix", "range", "width"],
            _ => &["match", "ignore_case"],
        }
    }
}

/// A matcher with its arguments bound and type-checked
#[derive(Debug, Clone, PartialEq)]
pub enum MatcherCall {
    StartsWith { prefix: String, ignore_case: bool },
    EndsWith { suffix: String, ignore_case: bool },
    Contains { needle: String, ignore_case: bool },
    Matches { pattern: String, ignore_case: bool },
    NumRange {
        prefix: String,
        range: Vec<i64>,
        width: Option<usize>,
    },
}

impl MatcherCall {
    /// Runs the matcher against `vars`
    pub fn apply(&self, vars: &[String]) -> SelectionResult<Vec<usize>> {
        match self {
            MatcherCall::StartsWith {
                prefix,
                ignore_case,
            } => starts_with(vars, prefix, *ignore_case),
            MatcherCall::EndsWith {
                suffix,
                ignore_case,
            } => ends_with(vars, suffix, *ignore_case),
            MatcherCall::Contains {
                needle,
                ignore_case,
            } => contains(vars, needle, *ignore_case),
            MatcherCall::Matches {
                pattern,
                ignore_case,
            } => matches(vars, pattern, *ignore_case),
            MatcherCall::NumRange {
                prefix,
                range,
                width,
            } => Ok(num_range(vars, prefix, range, *width)),
        }
    }
}

/// Positions whose name begins with `prefix`
pub fn starts_with(vars: &[String], prefix: &str, ignore_case: bool) -> SelectionResult<Vec<usize>> {
    require_match(Matcher::StartsWith, prefix)?;
    let prefix = fold(prefix, ignore_case);
    Ok(positions(vars, |name| fold(name, ignore_case).starts_with(&prefix)))
}

/// Positions whose name ends with `suffix`
///
/// Names shorter than the suffix never match.
pub fn ends_with(vars: &[String], suffix: &str, ignore_case: bool) -> SelectionResult<Vec<usize>> {
    require_match(Matcher::EndsWith, suffix)?;
    let suffix = fold(suffix, ignore_case);
    Ok(positions(vars, |name| fold(name, ignore_case).ends_with(&suffix)))
}

/// Positions whose name contains `needle` as a plain substring
pub fn contains(vars: &[String], needle: &str, ignore_case: bool) -> SelectionResult<Vec<usize>> {
    require_match(Matcher::Contains, needle)?;
    let needle = fold(needle, ignore_case);
    Ok(positions(vars, |name| fold(name, ignore_case).contains(&needle)))
}

/// Positions whose name matches the regular expression `pattern`
pub fn matches(vars: &[String], pattern: &str, ignore_case: bool) -> SelectionResult<Vec<usize>> {
    require_match(Matcher::Matches, pattern)?;
    let re = RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| {
            SelectionError::invalid_argument(
                "match",
                format!("matches(): invalid regular expression: {}", e),
            )
        })?;
    Ok(positions(vars, |name| re.is_match(name)))
}

/// Positions of `prefix` followed by each number of `range`
///
/// Results follow the order of `range`, not catalog order. Numbers are
/// zero-padded to `width` digits when given. Candidates missing from the
/// catalog are skipped.
pub fn num_range(vars: &[String], prefix: &str, range: &[i64], width: Option<usize>) -> Vec<usize> {
    range
        .iter()
        .filter_map(|n| {
            let candidate = match width {
                Some(width) => format!("{}{:0width$}", prefix, n, width = width),
                None => format!("{}{}", prefix, n),
            };
            vars.iter().position(|v| *v == candidate).map(|i| i + 1)
        })
        .collect()
}

fn require_match(matcher: Matcher, value: &str) -> SelectionResult<()> {
    if value.is_empty() {
        return Err(SelectionError::invalid_argument(
            "match",
            format!("{}(): match string must not be empty", matcher.name()),
        ));
    }
    Ok(())
}

fn fold(s: &str, ignore_case: bool) -> String {
    if ignore_case {
        s.to_lowercase()
    } else {
        s.to_string()
    }
}

fn positions(vars: &[String], pred: impl Fn(&str) -> bool) -> Vec<usize> {
    vars.iter()
        .enumerate()
        .filter(|(_, name)| pred(name))
        .map(|(i, _)| i + 1)
        .collect()
}
