//! Term evaluator
//!
//! Interprets one selection term inside a `BindingEnv`, producing signed
//! index assignments: positive includes, negative excludes `abs(value)`.

use super::ast::{Arg, Expr, SelectionTerm, MAX_NESTING_DEPTH};
use super::env::{Binding, BindingEnv};
use super::errors::{SelectionError, SelectionResult};
use super::matchers::{Matcher, MatcherCall};

/// Upper bound on the number of values a single range may produce
pub const MAX_RANGE_LEN: u64 = 1_000_000;

/// Upper bound on `num_range` zero-padding width
pub const MAX_NUM_WIDTH: usize = 64;

/// Runtime value of an evaluated expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed positions (or plain numbers for matcher arguments)
    Ints(Vec<i64>),
    Str(String),
    Bool(bool),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Ints(v) if v.len() == 1 => "number",
            Value::Ints(_) => "number vector",
            Value::Str(_) => "string",
            Value::Bool(_) => "logical",
        }
    }
}

/// Evaluated term: signed indices plus the requested name, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermResult {
    pub indices: Vec<i64>,
    pub name: Option<String>,
}

/// Evaluates selection terms against a binding environment
pub struct TermEvaluator<'e, 'a> {
    env: &'e BindingEnv<'a>,
}

impl<'e, 'a> TermEvaluator<'e, 'a> {
    pub fn new(env: &'e BindingEnv<'a>) -> Self {
        Self { env }
    }

    /// Evaluates one term and validates every index against the catalog
    pub fn evaluate(&self, term: &SelectionTerm) -> SelectionResult<TermResult> {
        check_depth(&term.expr)?;
        let indices = match self.eval(&term.expr)? {
            Value::Ints(indices) => indices,
            other => {
                return Err(SelectionError::invalid_argument(
                    term.expr.to_string(),
                    format!(
                        "a selection term must evaluate to column positions, got a {}",
                        other.type_name()
                    ),
                ))
            }
        };

        let len = self.env.len();
        if let Some(&bad) = indices
            .iter()
            .find(|&&i| i == 0 || i.unsigned_abs() > len as u64)
        {
            return Err(SelectionError::out_of_range(bad, len));
        }

        Ok(TermResult {
            indices,
            name: term.name.clone(),
        })
    }

    /// Evaluates an expression to a runtime value
    pub fn eval(&self, expr: &Expr) -> SelectionResult<Value> {
        match expr {
            Expr::Column(name) => match self.env.lookup(name) {
                Some(Binding::Position(p)) => Ok(Value::Ints(vec![p as i64])),
                Some(Binding::Matcher(m)) => Err(SelectionError::invalid_argument(
                    name.as_str(),
                    format!("'{}' is a matcher and must be called, e.g. {}(...)", name, m.name()),
                )),
                None => Err(SelectionError::unknown_variable(name.as_str())),
            },
            Expr::Int(n) => Ok(Value::Ints(vec![*n])),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Range(from, to) => {
                let from = self.scalar_int(from, "range start")?;
                let to = self.scalar_int(to, "range end")?;
                inclusive_range(from, to).map(Value::Ints)
            }
            Expr::Negate(inner) => match self.eval(inner)? {
                Value::Ints(v) => Ok(Value::Ints(v.into_iter().map(i64::saturating_neg).collect())),
                other => Err(SelectionError::invalid_argument(
                    inner.to_string(),
                    format!("cannot negate a {}", other.type_name()),
                )),
            },
            Expr::Call { function, args } => self.eval_call(function, args),
            Expr::List(items) => {
                let mut out = Vec::new();
                for item in items {
                    match self.eval(item)? {
                        Value::Ints(v) => out.extend(v),
                        other => {
                            return Err(SelectionError::invalid_argument(
                                item.to_string(),
                                format!("c() elements must select columns, got a {}", other.type_name()),
                            ))
                        }
                    }
                }
                Ok(Value::Ints(out))
            }
        }
    }

    fn eval_call(&self, function: &str, args: &[Arg]) -> SelectionResult<Value> {
        if function == "c" {
            let items: Vec<Expr> = args.iter().map(|a| a.value.clone()).collect();
            if let Some(arg) = args.iter().find(|a| a.name.is_some()) {
                return Err(SelectionError::invalid_argument(
                    arg.to_string(),
                    "c() elements cannot be named; name the term instead",
                ));
            }
            return self.eval(&Expr::List(items));
        }

        let matcher = match self.env.lookup(function) {
            Some(Binding::Matcher(m)) => m,
            Some(Binding::Position(_)) => {
                return Err(SelectionError::invalid_argument(
                    function,
                    format!("'{}' is a column, not a function", function),
                ))
            }
            None => return Err(SelectionError::unknown_function(function)),
        };

        let call = self.bind_args(matcher, args)?;
        let positions = self.env.invoke(&call)?;
        Ok(Value::Ints(positions.into_iter().map(|p| p as i64).collect()))
    }

    /// Matches call arguments to the matcher's parameters: named
    /// arguments first, then positional ones fill the remaining slots in
    /// order.
    fn bind_args(&self, matcher: Matcher, args: &[Arg]) -> SelectionResult<MatcherCall> {
        let params = matcher.params();
        let mut slots: Vec<Option<Value>> = vec![None; params.len()];

        for arg in args.iter().filter(|a| a.name.is_some()) {
            let name = arg.name.as_deref().unwrap_or_default();
            let canonical = name.replace('.', "_");
            let idx = params.iter().position(|p| *p == canonical).ok_or_else(|| {
                SelectionError::invalid_argument(
                    name,
                    format!("{}() has no parameter '{}'", matcher.name(), name),
                )
            })?;
            if slots[idx].is_some() {
                return Err(SelectionError::invalid_argument(
                    name,
                    format!("{}(): '{}' supplied more than once", matcher.name(), name),
                ));
            }
            slots[idx] = Some(self.eval(&arg.value)?);
        }

        for arg in args.iter().filter(|a| a.name.is_none()) {
            let idx = slots.iter().position(Option::is_none).ok_or_else(|| {
                SelectionError::invalid_argument(
                    arg.to_string(),
                    format!(
                        "{}() takes at most {} argument(s)",
                        matcher.name(),
                        params.len()
                    ),
                )
            })?;
            slots[idx] = Some(self.eval(&arg.value)?);
        }

        let mut bound = ArgSlots {
            matcher,
            params,
            slots,
        };

        match matcher {
            Matcher::NumRange => Ok(MatcherCall::NumRange {
                prefix: bound.string(0)?,
                range: bound.ints(1)?,
                width: bound.width(2)?,
            }),
            _ => {
                let value = bound.string(0)?;
                let ignore_case = bound.bool_or(1, true)?;
                Ok(match matcher {
                    Matcher::StartsWith => MatcherCall::StartsWith {
                        prefix: value,
                        ignore_case,
                    },
                    Matcher::EndsWith => MatcherCall::EndsWith {
                        suffix: value,
                        ignore_case,
                    },
                    Matcher::Contains => MatcherCall::Contains {
                        needle: value,
                        ignore_case,
                    },
                    _ => MatcherCall::Matches {
                        pattern: value,
                        ignore_case,
                    },
                })
            }
        }
    }

    fn scalar_int(&self, expr: &Expr, what: &str) -> SelectionResult<i64> {
        match self.eval(expr)? {
            Value::Ints(v) if v.len() == 1 => Ok(v[0]),
            other => Err(SelectionError::invalid_argument(
                expr.to_string(),
                format!("{} must be a single position, got a {}", what, other.type_name()),
            )),
        }
    }
}

/// Bound argument values for one matcher call
struct ArgSlots {
    matcher: Matcher,
    params: &'static [&'static str],
    slots: Vec<Option<Value>>,
}

impl ArgSlots {
    fn error(&self, idx: usize, reason: String) -> SelectionError {
        SelectionError::invalid_argument(
            self.params[idx],
            format!("{}(): {}", self.matcher.name(), reason),
        )
    }

    fn string(&mut self, idx: usize) -> SelectionResult<String> {
        match self.slots[idx].take() {
            Some(Value::Str(s)) => Ok(s),
            Some(other) => Err(self.error(
                idx,
                format!("'{}' must be a single string, got a {}", self.params[idx], other.type_name()),
            )),
            None => Err(self.error(idx, format!("argument '{}' is missing", self.params[idx]))),
        }
    }

    fn ints(&mut self, idx: usize) -> SelectionResult<Vec<i64>> {
        match self.slots[idx].take() {
            Some(Value::Ints(v)) => Ok(v),
            Some(other) => Err(self.error(
                idx,
                format!("'{}' must be numeric, got a {}", self.params[idx], other.type_name()),
            )),
            None => Err(self.error(idx, format!("argument '{}' is missing", self.params[idx]))),
        }
    }

    fn bool_or(&mut self, idx: usize, default: bool) -> SelectionResult<bool> {
        match self.slots[idx].take() {
            Some(Value::Bool(b)) => Ok(b),
            Some(other) => Err(self.error(
                idx,
                format!("'{}' must be TRUE or FALSE, got a {}", self.params[idx], other.type_name()),
            )),
            None => Ok(default),
        }
    }

    fn width(&mut self, idx: usize) -> SelectionResult<Option<usize>> {
        match self.slots[idx].take() {
            None => Ok(None),
            Some(Value::Ints(v)) if v.len() == 1 && v[0] >= 0 => {
                if v[0] as u64 > MAX_NUM_WIDTH as u64 {
                    return Err(self.error(
                        idx,
                        format!("'width' must be at most {}, got {}", MAX_NUM_WIDTH, v[0]),
                    ));
                }
                Ok(Some(v[0] as usize))
            }
            Some(other) => Err(self.error(
                idx,
                format!("'width' must be a single non-negative number, got a {}", other.type_name()),
            )),
        }
    }
}

/// Rejects trees nested deeper than `MAX_NESTING_DEPTH`
pub(crate) fn check_depth(expr: &Expr) -> SelectionResult<()> {
    let depth = expr.nesting_depth();
    if depth > MAX_NESTING_DEPTH {
        return Err(SelectionError::invalid_argument(
            "expression",
            format!(
                "expression nested {} levels deep; at most {} allowed",
                depth, MAX_NESTING_DEPTH
            ),
        ));
    }
    Ok(())
}

/// Inclusive integer sequence, descending when `to < from`
fn inclusive_range(from: i64, to: i64) -> SelectionResult<Vec<i64>> {
    let span = from.abs_diff(to);
    if span >= MAX_RANGE_LEN {
        return Err(SelectionError::invalid_argument(
            format!("{}:{}", from, to),
            format!("range spans more than {} values", MAX_RANGE_LEN),
        ));
    }
    Ok(if from <= to {
        (from..=to).collect()
    } else {
        (to..=from).rev().collect()
    })
}
