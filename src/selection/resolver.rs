//! Selection resolver
//!
//! Drives the term evaluator across an ordered list of terms and reduces
//! the signed index assignments to the final output-name -> source-name
//! mapping.
//!
//! # Resolution rules (strict order)
//!
//! 1. Evaluate every term in input order, failing on the first error
//! 2. Positive indices are kept in order; duplicates keep first occurrence
//! 3. No positive index at all selects every catalog column
//! 4. Any negative index removes that column, regardless of term order
//! 5. Unnamed entries take their catalog name

use std::collections::HashSet;
use std::slice;

use serde::{Deserialize, Serialize};

use super::ast::{Expr, SelectionTerm};
use super::env::BindingEnv;
use super::errors::{SelectionError, SelectionResult};
use super::evaluator::{check_depth, TermEvaluator, TermResult};
use crate::observability::{log_event_with_fields, Event};

/// One output column: its output name and the catalog column it reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionEntry {
    pub output: String,
    pub source: String,
}

impl SelectionEntry {
    fn new(output: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            source: source.into(),
        }
    }
}

/// Ordered projection + rename instruction for a backend
///
/// Order is significant and must not be changed by the consumer. Output
/// names are not checked for uniqueness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedSelection {
    entries: Vec<SelectionEntry>,
}

impl ResolvedSelection {
    /// Every catalog name mapped to itself, in catalog order
    pub fn identity(vars: &[String]) -> Self {
        Self {
            entries: vars.iter().map(|v| SelectionEntry::new(v, v)).collect(),
        }
    }

    /// Number of output columns
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, SelectionEntry> {
        self.entries.iter()
    }

    /// Source column for the first entry named `output`
    pub fn get(&self, output: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.output == output)
            .map(|e| e.source.as_str())
    }

    /// Output names, in order
    pub fn outputs(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.output.as_str()).collect()
    }

    /// Source names, in order
    pub fn sources(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.source.as_str()).collect()
    }

    /// `(output, source)` pairs, in order
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.output.as_str(), e.source.as_str()))
            .collect()
    }

    pub fn into_entries(self) -> Vec<SelectionEntry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a ResolvedSelection {
    type Item = &'a SelectionEntry;
    type IntoIter = slice::Iter<'a, SelectionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// How a single requested name is applied to a term matching several
/// columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiRenamePolicy {
    /// `stem1`, `stem2`, ... in match order
    #[default]
    Numbered,
    /// Reject the term with `InvalidArgument`
    Reject,
}

impl MultiRenamePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MultiRenamePolicy::Numbered => "numbered",
            MultiRenamePolicy::Reject => "reject",
        }
    }
}

/// Options layered on top of the plain selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionOptions {
    /// Columns kept even when the terms do not select them (grouping keys).
    /// Prepended in the given order.
    pub include: Vec<String>,
    /// Columns removed from the final mapping by source name
    pub exclude: Vec<String>,
    pub multi_rename: MultiRenamePolicy,
}

impl SelectionOptions {
    pub fn with_include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_multi_rename(mut self, policy: MultiRenamePolicy) -> Self {
        self.multi_rename = policy;
        self
    }
}

/// Intermediate state of one resolution
#[derive(Debug, Clone)]
pub(crate) struct Resolution {
    /// Per-term evaluation results, in term order
    pub terms: Vec<TermResult>,
    /// Deduplicated positive positions before the identity default
    pub included: Vec<usize>,
    /// Excluded positions, ascending
    pub excluded: Vec<usize>,
    /// Whether no term included anything and every column was selected
    pub identity_default: bool,
    pub selection: ResolvedSelection,
}

/// Resolves selections against one catalog
///
/// Holds no state across calls beyond the catalog bindings; the same
/// resolver may be reused for any number of selections.
pub struct SelectionResolver<'a> {
    env: BindingEnv<'a>,
    options: SelectionOptions,
    trace: bool,
}

impl<'a> SelectionResolver<'a> {
    /// Creates a resolver over `vars`, which must hold distinct names
    pub fn new(vars: &'a [String]) -> Self {
        Self {
            env: BindingEnv::new(vars),
            options: SelectionOptions::default(),
            trace: false,
        }
    }

    pub fn with_options(mut self, options: SelectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Emits one structured log line per evaluated term
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn options(&self) -> &SelectionOptions {
        &self.options
    }

    /// Resolves `terms` to the ordered output mapping
    pub fn resolve(&self, terms: &[SelectionTerm]) -> SelectionResult<ResolvedSelection> {
        self.run(terms).map(|r| r.selection)
    }

    /// Renames columns while keeping every column in catalog order
    ///
    /// Each term must be `new = old` with `old` a bare catalog name.
    pub fn rename(&self, renames: &[SelectionTerm]) -> SelectionResult<ResolvedSelection> {
        let vars = self.env.vars();
        let mut outputs: Vec<String> = vars.to_vec();

        for (i, term) in renames.iter().enumerate() {
            let n = i + 1;
            check_depth(&term.expr).map_err(|e| e.with_term(n))?;
            let new_name = term.name.as_ref().ok_or_else(|| {
                SelectionError::invalid_argument(
                    term.expr.to_string(),
                    "every rename must be named, as in new = old",
                )
                .with_term(n)
            })?;
            let old_name = match &term.expr {
                Expr::Column(old) => old,
                other => {
                    return Err(SelectionError::invalid_argument(
                        other.to_string(),
                        "rename sources must be bare column names",
                    )
                    .with_term(n))
                }
            };
            let position = self.env.position_of(old_name).map_err(|e| e.with_term(n))?;
            outputs[position - 1] = new_name.clone();
        }

        let selection = ResolvedSelection {
            entries: outputs
                .into_iter()
                .zip(vars.iter())
                .map(|(output, source)| SelectionEntry::new(output, source))
                .collect(),
        };

        if self.trace {
            let columns = selection.len().to_string();
            let count = renames.len().to_string();
            log_event_with_fields(
                Event::RenameComplete,
                &[("columns", columns.as_str()), ("renames", count.as_str())],
            );
        }
        Ok(selection)
    }

    pub(crate) fn run(&self, terms: &[SelectionTerm]) -> SelectionResult<Resolution> {
        let result = self.run_inner(terms);
        if self.trace {
            match &result {
                Ok(res) => {
                    let columns = res.selection.len().to_string();
                    let count = terms.len().to_string();
                    log_event_with_fields(
                        Event::SelectionComplete,
                        &[("columns", columns.as_str()), ("terms", count.as_str())],
                    );
                }
                Err(err) => {
                    let reason = err.to_string();
                    log_event_with_fields(
                        Event::SelectionFailed,
                        &[("code", err.code().code()), ("reason", reason.as_str())],
                    );
                }
            }
        }
        result
    }

    fn run_inner(&self, terms: &[SelectionTerm]) -> SelectionResult<Resolution> {
        let evaluator = TermEvaluator::new(&self.env);
        let mut results = Vec::with_capacity(terms.len());
        let mut assignments: Vec<(i64, Option<String>)> = Vec::new();

        for (i, term) in terms.iter().enumerate() {
            let n = i + 1;
            let result = evaluator.evaluate(term).map_err(|e| e.with_term(n))?;
            self.assign_names(&result, n, &mut assignments)?;
            if self.trace {
                let expr = term.to_string();
                let indices = format!("{:?}", result.indices);
                let number = n.to_string();
                log_event_with_fields(
                    Event::TermEvaluated,
                    &[
                        ("expr", expr.as_str()),
                        ("indices", indices.as_str()),
                        ("term", number.as_str()),
                    ],
                );
            }
            results.push(result);
        }

        let mut seen = HashSet::new();
        let mut included: Vec<(usize, Option<String>)> = Vec::new();
        let mut excluded = HashSet::new();
        for (index, name) in assignments {
            let position = index.unsigned_abs() as usize;
            if index > 0 {
                if seen.insert(position) {
                    included.push((position, name));
                }
            } else {
                excluded.insert(position);
            }
        }

        let included_raw: Vec<usize> = included.iter().map(|(p, _)| *p).collect();
        let identity_default = included.is_empty();
        if identity_default {
            included = (1..=self.env.len()).map(|p| (p, None)).collect();
        }
        included.retain(|(p, _)| !excluded.contains(p));

        let entries = included
            .into_iter()
            .filter_map(|(p, name)| {
                let source = self.env.name_at(p)?;
                Some(SelectionEntry::new(
                    name.unwrap_or_else(|| source.to_string()),
                    source,
                ))
            })
            .collect();
        let selection = self.apply_options(ResolvedSelection { entries })?;

        let mut excluded: Vec<usize> = excluded.into_iter().collect();
        excluded.sort_unstable();

        Ok(Resolution {
            terms: results,
            included: included_raw,
            excluded,
            identity_default,
            selection,
        })
    }

    /// Pairs every index of a term with its output name, if any
    fn assign_names(
        &self,
        result: &TermResult,
        term: usize,
        out: &mut Vec<(i64, Option<String>)>,
    ) -> SelectionResult<()> {
        let stem = match &result.name {
            None => {
                out.extend(result.indices.iter().map(|&i| (i, None)));
                return Ok(());
            }
            Some(stem) => stem,
        };

        if result.indices.len() == 1 {
            out.push((result.indices[0], Some(stem.clone())));
            return Ok(());
        }

        match self.options.multi_rename {
            MultiRenamePolicy::Numbered => {
                out.extend(
                    result
                        .indices
                        .iter()
                        .enumerate()
                        .map(|(k, &i)| (i, Some(format!("{}{}", stem, k + 1)))),
                );
                Ok(())
            }
            MultiRenamePolicy::Reject => Err(SelectionError::invalid_argument(
                stem.as_str(),
                format!(
                    "term renames {} columns to the single name '{}'",
                    result.indices.len(),
                    stem
                ),
            )
            .with_term(term)),
        }
    }

    /// Prepends `include` columns that are not selected, then drops
    /// `exclude` columns by source name
    fn apply_options(&self, selection: ResolvedSelection) -> SelectionResult<ResolvedSelection> {
        let SelectionOptions {
            include, exclude, ..
        } = &self.options;
        if include.is_empty() && exclude.is_empty() {
            return Ok(selection);
        }

        for name in include.iter().chain(exclude.iter()) {
            self.env.position_of(name)?;
        }

        let mut entries = Vec::with_capacity(selection.len() + include.len());
        {
            let selected: HashSet<&str> = selection.iter().map(|e| e.source.as_str()).collect();
            let mut added = HashSet::new();
            for name in include {
                if !selected.contains(name.as_str()) && added.insert(name.as_str()) {
                    entries.push(SelectionEntry::new(name, name));
                }
            }
        }
        entries.extend(selection.into_entries());

        let excluded: HashSet<&str> = exclude.iter().map(String::as_str).collect();
        entries.retain(|e| !excluded.contains(e.source.as_str()));

        Ok(ResolvedSelection { entries })
    }
}

/// Resolves `terms` against `vars` with default options
///
/// An empty term list yields the identity mapping.
pub fn resolve_selection(
    vars: &[String],
    terms: &[SelectionTerm],
) -> SelectionResult<ResolvedSelection> {
    SelectionResolver::new(vars).resolve(terms)
}

/// Resolves `terms` against `vars` with include/exclude and rename options
pub fn resolve_selection_with(
    vars: &[String],
    terms: &[SelectionTerm],
    options: &SelectionOptions,
) -> SelectionResult<ResolvedSelection> {
    SelectionResolver::new(vars)
        .with_options(options.clone())
        .resolve(terms)
}

/// Renames columns of `vars`, keeping all of them in catalog order
pub fn resolve_rename(
    vars: &[String],
    renames: &[SelectionTerm],
) -> SelectionResult<ResolvedSelection> {
    SelectionResolver::new(vars).rename(renames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{Arg, SelectionErrorCode};

    fn vars(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn col(name: &str) -> SelectionTerm {
        SelectionTerm::column(name)
    }

    fn neg(name: &str) -> SelectionTerm {
        SelectionTerm::new(Expr::negate(Expr::column(name)))
    }

    fn range(a: &str, b: &str) -> Expr {
        Expr::range(Expr::column(a), Expr::column(b))
    }

    fn starts_with(prefix: &str) -> Expr {
        Expr::call("starts_with", vec![Arg::positional(Expr::string(prefix))])
    }

    #[test]
    fn test_empty_terms_identity() {
        let v = vars(&["a", "b", "c"]);
        let sel = resolve_selection(&v, &[]).unwrap();
        assert_eq!(sel, ResolvedSelection::identity(&v));
        assert_eq!(sel.pairs(), vec![("a", "a"), ("b", "b"), ("c", "c")]);
    }

    #[test]
    fn test_inclusion_order_follows_terms() {
        let v = vars(&["a", "b", "c"]);
        let sel = resolve_selection(&v, &[col("c"), col("a")]).unwrap();
        assert_eq!(sel.outputs(), vec!["c", "a"]);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let v = vars(&["a", "b", "c"]);
        let sel = resolve_selection(
            &v,
            &[col("b"), SelectionTerm::new(range("a", "c")), col("b")],
        )
        .unwrap();
        assert_eq!(sel.outputs(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_first_occurrence_keeps_its_name() {
        let v = vars(&["a", "b"]);
        let sel = resolve_selection(
            &v,
            &[SelectionTerm::named("x", Expr::column("a")), col("a")],
        )
        .unwrap();
        assert_eq!(sel.pairs(), vec![("x", "a")]);
    }

    #[test]
    fn test_exclusion_is_order_independent() {
        let v = vars(&["a", "b", "c"]);
        let expected = vec![("a", "a"), ("b", "b")];
        let cases: Vec<Vec<SelectionTerm>> = vec![
            vec![neg("c")],
            vec![SelectionTerm::new(range("a", "c")), neg("c")],
            vec![col("a"), col("b"), col("c"), neg("c")],
            vec![neg("c"), col("a"), col("b")],
        ];
        for terms in cases {
            let sel = resolve_selection(&v, &terms).unwrap();
            assert_eq!(sel.pairs(), expected);
        }
    }

    #[test]
    fn test_exclusion_wins_over_later_inclusion() {
        let v = vars(&["a", "b", "c"]);
        let sel = resolve_selection(&v, &[neg("a"), col("a"), col("c")]).unwrap();
        assert_eq!(sel.outputs(), vec!["c"]);
    }

    #[test]
    fn test_rename_swap() {
        let v = vars(&["a", "b"]);
        let sel = resolve_selection(
            &v,
            &[
                SelectionTerm::named("b", Expr::column("a")),
                SelectionTerm::named("a", Expr::column("b")),
            ],
        )
        .unwrap();
        assert_eq!(sel.pairs(), vec![("b", "a"), ("a", "b")]);
    }

    #[test]
    fn test_multi_rename_numbered() {
        let v = vars(&["Petal.Length", "Petal.Width", "Species"]);
        let sel = resolve_selection(
            &v,
            &[SelectionTerm::named("petal", starts_with("Petal"))],
        )
        .unwrap();
        assert_eq!(
            sel.pairs(),
            vec![("petal1", "Petal.Length"), ("petal2", "Petal.Width")]
        );
    }

    #[test]
    fn test_multi_rename_single_match_keeps_stem() {
        let v = vars(&["Petal.Length", "Species"]);
        let sel = resolve_selection(
            &v,
            &[SelectionTerm::named("petal", starts_with("Petal"))],
        )
        .unwrap();
        assert_eq!(sel.pairs(), vec![("petal", "Petal.Length")]);
    }

    #[test]
    fn test_multi_rename_reject() {
        let v = vars(&["Petal.Length", "Petal.Width"]);
        let options = SelectionOptions::default().with_multi_rename(MultiRenamePolicy::Reject);
        let err = resolve_selection_with(
            &v,
            &[col("Petal.Width"), SelectionTerm::named("petal", starts_with("Petal"))],
            &options,
        )
        .unwrap_err();
        assert_eq!(err.code(), SelectionErrorCode::InvalidArgument);
        assert_eq!(err.term(), Some(2));
    }

    #[test]
    fn test_matcher_with_no_match_falls_back_to_identity() {
        let v = vars(&["a", "b"]);
        let sel = resolve_selection(&v, &[SelectionTerm::new(starts_with("z"))]).unwrap();
        assert_eq!(sel, ResolvedSelection::identity(&v));
    }

    #[test]
    fn test_errors_carry_term_number() {
        let v = vars(&["a", "b"]);
        let err = resolve_selection(&v, &[col("a"), col("nope")]).unwrap_err();
        assert_eq!(err.code(), SelectionErrorCode::UnknownVariable);
        assert_eq!(err.term(), Some(2));
    }

    #[test]
    fn test_include_prepends_grouping_keys() {
        let v = vars(&["g", "a", "b", "c"]);
        let options = SelectionOptions::default().with_include(["g"]);
        let sel = resolve_selection_with(&v, &[col("b"), col("a")], &options).unwrap();
        assert_eq!(sel.outputs(), vec!["g", "b", "a"]);

        // Already selected: position is left alone
        let sel = resolve_selection_with(&v, &[col("b"), col("g")], &options).unwrap();
        assert_eq!(sel.outputs(), vec!["b", "g"]);
    }

    #[test]
    fn test_include_survives_term_exclusion_but_not_option_exclusion() {
        let v = vars(&["g", "a"]);
        let options = SelectionOptions::default().with_include(["g"]);
        let sel = resolve_selection_with(&v, &[neg("g")], &options).unwrap();
        assert_eq!(sel.outputs(), vec!["g", "a"]);

        let options = options.with_exclude(["g"]);
        let sel = resolve_selection_with(&v, &[neg("g")], &options).unwrap();
        assert_eq!(sel.outputs(), vec!["a"]);
    }

    #[test]
    fn test_include_renamed_source_not_duplicated() {
        let v = vars(&["g", "a"]);
        let options = SelectionOptions::default().with_include(["g"]);
        let sel = resolve_selection_with(
            &v,
            &[SelectionTerm::named("group", Expr::column("g"))],
            &options,
        )
        .unwrap();
        assert_eq!(sel.pairs(), vec![("group", "g")]);
    }

    #[test]
    fn test_unknown_include_rejected() {
        let v = vars(&["a"]);
        let options = SelectionOptions::default().with_include(["zz"]);
        let err = resolve_selection_with(&v, &[], &options).unwrap_err();
        assert_eq!(err.code(), SelectionErrorCode::UnknownVariable);
    }

    #[test]
    fn test_rename_keeps_all_columns() {
        let v = vars(&["a", "b", "c"]);
        let sel = resolve_rename(&v, &[SelectionTerm::named("B", Expr::column("b"))]).unwrap();
        assert_eq!(sel.pairs(), vec![("a", "a"), ("B", "b"), ("c", "c")]);
    }

    #[test]
    fn test_rename_requires_names_and_literals() {
        let v = vars(&["a", "b"]);
        let err = resolve_rename(&v, &[col("a")]).unwrap_err();
        assert_eq!(err.code(), SelectionErrorCode::InvalidArgument);
        assert_eq!(err.term(), Some(1));

        let err = resolve_rename(
            &v,
            &[SelectionTerm::named("x", range("a", "b"))],
        )
        .unwrap_err();
        assert_eq!(err.code(), SelectionErrorCode::InvalidArgument);

        let err = resolve_rename(&v, &[SelectionTerm::named("x", Expr::column("q"))]).unwrap_err();
        assert_eq!(err.code(), SelectionErrorCode::UnknownVariable);
    }

    #[test]
    fn test_rename_rejects_deep_nesting() {
        let v = vars(&["a"]);
        let mut expr = Expr::column("a");
        for _ in 0..=crate::selection::MAX_NESTING_DEPTH {
            expr = Expr::negate(expr);
        }
        let err = resolve_rename(&v, &[SelectionTerm::named("x", expr)]).unwrap_err();
        assert_eq!(err.code(), SelectionErrorCode::InvalidArgument);
        assert_eq!(err.argument(), Some("expression"));
        assert_eq!(err.term(), Some(1));
    }

    #[test]
    fn test_resolution_details() {
        let v = vars(&["a", "b", "c"]);
        let resolver = SelectionResolver::new(&v);
        let res = resolver.run(&[neg("b")]).unwrap();
        assert!(res.identity_default);
        assert!(res.included.is_empty());
        assert_eq!(res.excluded, vec![2]);
        assert_eq!(res.selection.outputs(), vec!["a", "c"]);
    }

    #[test]
    fn test_selection_serializes_in_order() {
        let v = vars(&["b", "a"]);
        let sel = resolve_selection(&v, &[]).unwrap();
        let json = serde_json::to_value(&sel).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"output": "b", "source": "b"},
                {"output": "a", "source": "a"}
            ])
        );
    }
}
