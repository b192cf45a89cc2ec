//! Selection explain output
//!
//! Shows how each term evaluated and how the final mapping was reached.

use std::fmt;

use serde::Serialize;

use super::ast::SelectionTerm;
use super::errors::SelectionError;
use super::resolver::{Resolution, ResolvedSelection, SelectionResolver};

/// Evaluation of a single term
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermExplain {
    /// 1-based term number
    pub term: usize,
    /// Rendered expression
    pub expr: String,
    /// Requested output name
    pub name: Option<String>,
    /// Signed positions the term evaluated to
    pub indices: Vec<i64>,
}

/// Explain output for one selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionExplain {
    /// Whether resolution succeeded
    pub accepted: bool,
    pub terms: Vec<TermExplain>,
    /// Included positions, deduplicated, before the identity default
    pub included: Vec<usize>,
    /// Excluded positions, ascending
    pub excluded: Vec<usize>,
    /// Whether every column was selected because no term included any
    pub identity_default: bool,
    pub selection: Option<ResolvedSelection>,
    pub rejection_code: Option<String>,
    pub rejection_reason: Option<String>,
}

impl SelectionExplain {
    pub(crate) fn from_resolution(terms: &[SelectionTerm], res: Resolution) -> Self {
        let terms = terms
            .iter()
            .zip(res.terms)
            .enumerate()
            .map(|(i, (term, result))| TermExplain {
                term: i + 1,
                expr: term.expr.to_string(),
                name: result.name,
                indices: result.indices,
            })
            .collect();

        Self {
            accepted: true,
            terms,
            included: res.included,
            excluded: res.excluded,
            identity_default: res.identity_default,
            selection: Some(res.selection),
            rejection_code: None,
            rejection_reason: None,
        }
    }

    /// Explain output for a rejected selection
    pub fn from_error(err: &SelectionError) -> Self {
        Self::rejected(err.code().code(), err.to_string())
    }

    /// Explain output for a selection rejected before resolution
    pub fn rejected(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            terms: Vec::new(),
            included: Vec::new(),
            excluded: Vec::new(),
            identity_default: false,
            selection: None,
            rejection_code: Some(code.into()),
            rejection_reason: Some(reason.into()),
        }
    }
}

impl fmt::Display for SelectionExplain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN SELECTION ===")?;

        if !self.accepted {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
            return Ok(());
        }

        writeln!(f, "Status: ACCEPTED")?;
        if !self.terms.is_empty() {
            writeln!(f, "Terms:")?;
            for t in &self.terms {
                match &t.name {
                    Some(name) => writeln!(f, "  {}. {} = {} -> {:?}", t.term, name, t.expr, t.indices)?,
                    None => writeln!(f, "  {}. {} -> {:?}", t.term, t.expr, t.indices)?,
                }
            }
        }
        writeln!(f, "Included: {:?}", self.included)?;
        writeln!(f, "Excluded: {:?}", self.excluded)?;
        if self.identity_default {
            writeln!(f, "Default: all columns")?;
        }
        if let Some(selection) = &self.selection {
            writeln!(f, "Selection:")?;
            for entry in selection {
                if entry.output == entry.source {
                    writeln!(f, "  {}", entry.output)?;
                } else {
                    writeln!(f, "  {} <- {}", entry.output, entry.source)?;
                }
            }
        }
        Ok(())
    }
}

impl SelectionResolver<'_> {
    /// Resolves `terms` and reports every intermediate step
    ///
    /// Never fails: a rejected selection is reported in the output.
    pub fn explain(&self, terms: &[SelectionTerm]) -> SelectionExplain {
        match self.run(terms) {
            Ok(res) => SelectionExplain::from_resolution(terms, res),
            Err(err) => SelectionExplain::from_error(&err),
        }
    }
}

/// Explains the resolution of `terms` against `vars` with default options
pub fn explain_selection(vars: &[String], terms: &[SelectionTerm]) -> SelectionExplain {
    SelectionResolver::new(vars).explain(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::parse_selection;

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_explain_accepted() {
        let v = vars(&["a", "b", "c"]);
        let terms = parse_selection("x = c, -b").unwrap();
        let explain = explain_selection(&v, &terms);

        assert!(explain.accepted);
        assert_eq!(explain.terms.len(), 2);
        assert_eq!(explain.terms[0].indices, vec![3]);
        assert_eq!(explain.terms[0].name.as_deref(), Some("x"));
        assert_eq!(explain.terms[1].expr, "-b");
        assert_eq!(explain.included, vec![3]);
        assert_eq!(explain.excluded, vec![2]);
        assert!(!explain.identity_default);
        assert_eq!(
            explain.selection.as_ref().unwrap().pairs(),
            vec![("x", "c")]
        );
    }

    #[test]
    fn test_explain_identity_default() {
        let v = vars(&["a", "b"]);
        let terms = parse_selection("-a").unwrap();
        let explain = explain_selection(&v, &terms);
        assert!(explain.identity_default);
        let text = explain.to_string();
        assert!(text.contains("Default: all columns"));
        assert!(text.contains("  b\n"));
    }

    #[test]
    fn test_explain_rejected() {
        let v = vars(&["a"]);
        let terms = parse_selection("a, zz").unwrap();
        let explain = explain_selection(&v, &terms);
        assert!(!explain.accepted);
        assert_eq!(explain.rejection_code.as_deref(), Some("SEL_UNKNOWN_VARIABLE"));
        assert!(explain.rejection_reason.unwrap().contains("term 2"));
    }

    #[test]
    fn test_explain_display_rename_arrow() {
        let v = vars(&["a", "b"]);
        let terms = parse_selection("z = b").unwrap();
        let text = explain_selection(&v, &terms).to_string();
        assert!(text.contains("Status: ACCEPTED"));
        assert!(text.contains("z <- b"));
    }
}
