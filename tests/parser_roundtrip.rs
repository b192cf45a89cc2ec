//! Parser Round-Trip Tests
//!
//! Rendering a parsed selection and parsing it again must give the same
//! terms. Covers quoting of awkward names and strings, nested calls and
//! negated ranges.

use colsel::selection::{parse_selection, Arg, Expr, SelectionErrorCode, SelectionTerm};

fn render(terms: &[SelectionTerm]) -> String {
    terms
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn assert_roundtrip(text: &str) {
    let terms = parse_selection(text).unwrap();
    let rendered = render(&terms);
    let reparsed = parse_selection(&rendered).unwrap();
    assert_eq!(reparsed, terms, "{} rendered as {}", text, rendered);
}

#[test]
fn test_roundtrip_text() {
    for text in [
        "a",
        "a, b, c",
        "a:c",
        "-a:c",
        "-b",
        "1:3",
        "new = old",
        "`my col` = `weird name`",
        "`TRUE`",
        "starts_with(\"x\")",
        "starts_with(\"X\", ignore.case = FALSE)",
        "matches(\"^a\\\\d+$\")",
        "contains(\"quote \\\" inside\")",
        "num_range(\"x\", 1:10, width = 2)",
        "num_range(\"x\", c(1, 3, 5))",
        "petal = starts_with(\"Petal\"), -Species",
        "-ends_with(\"_id\")",
    ] {
        assert_roundtrip(text);
    }
}

#[test]
fn test_roundtrip_built_terms() {
    let terms = vec![
        SelectionTerm::named(
            "with space",
            Expr::call(
                "starts_with",
                vec![
                    Arg::positional(Expr::string("tab\there")),
                    Arg::named("ignore_case", Expr::Bool(true)),
                ],
            ),
        ),
        SelectionTerm::new(Expr::negate(Expr::range(
            Expr::column("x.1"),
            Expr::column("9lives"),
        ))),
        SelectionTerm::column("back`tick"),
    ];

    let rendered = render(&terms);
    assert_eq!(parse_selection(&rendered).unwrap(), terms);
}

#[test]
fn test_top_level_list_splits_into_terms() {
    let terms = parse_selection("c(a, b), c").unwrap();
    assert_eq!(
        terms,
        vec![
            SelectionTerm::column("a"),
            SelectionTerm::column("b"),
            SelectionTerm::column("c"),
        ]
    );
}

#[test]
fn test_parse_errors_carry_code() {
    for text in ["a,", "a:", "starts_with(", "\"open", "a b", "1abc"] {
        let err = parse_selection(text).unwrap_err();
        assert_eq!(err.code(), SelectionErrorCode::ParseError, "{}", text);
    }
}
