//! Selection AST
//!
//! Defines the parsed selection representation evaluated by the term
//! evaluator. `Display` renders text that parses back to the same tree
//! for every tree the parser produces. The text has no negative integer
//! literal, so a built `Int(-5)` renders as `-5` and parses back as
//! `Negate(Int(5))`, which evaluates to the same indices.

use std::fmt;

/// Deepest expression nesting accepted by the parser and the evaluator
pub const MAX_NESTING_DEPTH: usize = 256;

/// A selection expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A catalog name: `mpg`
    Column(String),
    /// A direct 1-based position (negative values exclude): `3`
    Int(i64),
    /// A string argument: `"Petal"`
    Str(String),
    /// A boolean argument: `TRUE`
    Bool(bool),
    /// Inclusive range between two positions: `a:c`
    Range(Box<Expr>, Box<Expr>),
    /// Flips the sign of every resulting index: `-a`
    Negate(Box<Expr>),
    /// Matcher invocation: `starts_with("a", ignore_case = FALSE)`
    Call { function: String, args: Vec<Arg> },
    /// Explicit list: `c(a, b)`
    List(Vec<Expr>),
}

impl Expr {
    /// A literal catalog name
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    /// A string literal
    pub fn string(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    /// An inclusive range between two expressions
    pub fn range(from: Expr, to: Expr) -> Self {
        Expr::Range(Box::new(from), Box::new(to))
    }

    /// Negation of an expression
    pub fn negate(inner: Expr) -> Self {
        Expr::Negate(Box::new(inner))
    }

    /// A function call
    pub fn call(function: impl Into<String>, args: Vec<Arg>) -> Self {
        Expr::Call {
            function: function.into(),
            args,
        }
    }

    /// Nesting depth, counting negations, calls and lists
    ///
    /// A leaf is depth 1. Range endpoints sit at the range's own level.
    /// Walks the tree without recursion so arbitrarily deep trees are safe
    /// to measure.
    pub fn nesting_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&Expr, usize)> = vec![(self, 1)];
        while let Some((expr, level)) = stack.pop() {
            deepest = deepest.max(level);
            match expr {
                Expr::Negate(inner) => stack.push((inner.as_ref(), level + 1)),
                Expr::Range(from, to) => {
                    stack.push((from.as_ref(), level));
                    stack.push((to.as_ref(), level));
                }
                Expr::Call { args, .. } => {
                    stack.extend(args.iter().map(|a| (&a.value, level + 1)))
                }
                Expr::List(items) => stack.extend(items.iter().map(|e| (e, level + 1))),
                Expr::Column(_) | Expr::Int(_) | Expr::Str(_) | Expr::Bool(_) => {}
            }
        }
        deepest
    }

    /// Returns true for expressions that render without parentheses as a
    /// range endpoint
    fn is_primary(&self) -> bool {
        match self {
            Expr::Column(_) | Expr::Str(_) | Expr::Bool(_) | Expr::Call { .. } | Expr::List(_) => {
                true
            }
            Expr::Int(n) => *n >= 0,
            Expr::Range(..) | Expr::Negate(_) => false,
        }
    }

    fn fmt_endpoint(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_primary() {
            write!(f, "{}", self)
        } else {
            write!(f, "({})", self)
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write_name(f, name),
            Expr::Int(n) if *n < 0 => write!(f, "-{}", n.unsigned_abs()),
            Expr::Int(n) => write!(f, "{}", n),
            Expr::Str(s) => write_string(f, s),
            Expr::Bool(true) => write!(f, "TRUE"),
            Expr::Bool(false) => write!(f, "FALSE"),
            Expr::Range(from, to) => {
                from.fmt_endpoint(f)?;
                write!(f, ":")?;
                to.fmt_endpoint(f)
            }
            Expr::Negate(inner) => write!(f, "-{}", inner),
            Expr::Call { function, args } => {
                write_name(f, function)?;
                write!(f, "(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::List(items) => {
                write!(f, "c(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A call argument, positional or named
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    /// Parameter name for named arguments
    pub name: Option<String>,
    /// Argument expression
    pub value: Expr,
}

impl Arg {
    /// A positional argument
    pub fn positional(value: Expr) -> Self {
        Self { name: None, value }
    }

    /// A named argument
    pub fn named(name: impl Into<String>, value: Expr) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write_name(f, name)?;
            write!(f, " = ")?;
        }
        write!(f, "{}", self.value)
    }
}

/// One selection term: an expression plus an optional output name
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionTerm {
    /// Expression selecting (or excluding) columns
    pub expr: Expr,
    /// Requested output name
    pub name: Option<String>,
}

impl SelectionTerm {
    /// An unnamed term
    pub fn new(expr: Expr) -> Self {
        Self { expr, name: None }
    }

    /// A term renaming its selection to `name`
    pub fn named(name: impl Into<String>, expr: Expr) -> Self {
        Self {
            expr,
            name: Some(name.into()),
        }
    }

    /// Shorthand for an unnamed literal column term
    pub fn column(name: impl Into<String>) -> Self {
        Self::new(Expr::column(name))
    }
}

impl fmt::Display for SelectionTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write_name(f, name)?;
            write!(f, " = ")?;
        }
        write!(f, "{}", self.expr)
    }
}

/// Returns true if `name` can be written without backticks
pub(crate) fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let first_ok = match chars.next() {
        Some(c) => c.is_alphabetic() || c == '_' || c == '.',
        None => false,
    };
    first_ok
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && !is_keyword(name)
}

/// Reserved words that always need backticks as names
pub(crate) fn is_keyword(name: &str) -> bool {
    matches!(name, "TRUE" | "FALSE" | "true" | "false")
}

fn write_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_bare_identifier(name) {
        write!(f, "{}", name)
    } else {
        write!(f, "`")?;
        for c in name.chars() {
            match c {
                '`' => write!(f, "\\`")?,
                '\\' => write!(f, "\\\\")?,
                c => write!(f, "{}", c)?,
            }
        }
        write!(f, "`")
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting_depth() {
        assert_eq!(Expr::column("a").nesting_depth(), 1);
        assert_eq!(Expr::negate(Expr::column("a")).nesting_depth(), 2);
        assert_eq!(
            Expr::range(Expr::column("a"), Expr::column("c")).nesting_depth(),
            1
        );
        let call = Expr::call(
            "num_range",
            vec![
                Arg::positional(Expr::string("x")),
                Arg::positional(Expr::List(vec![Expr::negate(Expr::Int(1))])),
            ],
        );
        assert_eq!(call.nesting_depth(), 4);

        let mut deep = Expr::column("a");
        for _ in 0..1_000 {
            deep = Expr::negate(deep);
        }
        assert_eq!(deep.nesting_depth(), 1_001);
    }

    #[test]
    fn test_negative_int_renders_as_negation() {
        assert_eq!(Expr::Int(-5).to_string(), "-5");
        let reparsed = crate::selection::parse_selection("-5").unwrap();
        assert_eq!(reparsed[0].expr, Expr::negate(Expr::Int(5)));
        assert_eq!(
            Expr::range(Expr::Int(-1), Expr::Int(3)).to_string(),
            "(-1):3"
        );
    }

    #[test]
    fn test_render_simple_terms() {
        assert_eq!(SelectionTerm::column("mpg").to_string(), "mpg");
        assert_eq!(
            SelectionTerm::named("b", Expr::column("a")).to_string(),
            "b = a"
        );
        assert_eq!(
            Expr::negate(Expr::range(Expr::column("a"), Expr::column("c"))).to_string(),
            "-a:c"
        );
    }

    #[test]
    fn test_render_call_with_named_arg() {
        let expr = Expr::call(
            "starts_with",
            vec![
                Arg::positional(Expr::string("Pe\"tal")),
                Arg::named("ignore_case", Expr::Bool(false)),
            ],
        );
        assert_eq!(
            expr.to_string(),
            r#"starts_with("Pe\"tal", ignore_case = FALSE)"#
        );
    }

    #[test]
    fn test_render_quotes_odd_names() {
        assert_eq!(Expr::column("first name").to_string(), "`first name`");
        assert_eq!(Expr::column("TRUE").to_string(), "`TRUE`");
        assert_eq!(Expr::column("1st").to_string(), "`1st`");
    }

    #[test]
    fn test_render_negative_range_endpoint() {
        let expr = Expr::range(Expr::Int(-1), Expr::Int(3));
        assert_eq!(expr.to_string(), "(-1):3");
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_bare_identifier("Sepal.Length"));
        assert!(is_bare_identifier("_x1"));
        assert!(!is_bare_identifier(""));
        assert!(!is_bare_identifier("a-b"));
        assert!(!is_bare_identifier("false"));
    }
}
