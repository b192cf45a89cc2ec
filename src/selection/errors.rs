//! Selection error types
//!
//! Error codes:
//! - SEL_UNKNOWN_VARIABLE
//! - SEL_INVALID_ARGUMENT
//! - SEL_OUT_OF_RANGE_INDEX
//! - SEL_PARSE_ERROR
//!
//! Every error is terminal for the resolution call. No partial mapping is
//! ever returned alongside an error.

use std::fmt;

/// Selection-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionErrorCode {
    /// A literal or range endpoint names a column absent from the catalog
    UnknownVariable,
    /// A matcher or term received an argument of the wrong shape
    InvalidArgument,
    /// A positional index falls outside `[1, len(catalog)]`
    OutOfRangeIndex,
    /// Selection text could not be parsed
    ParseError,
}

impl SelectionErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SelectionErrorCode::UnknownVariable => "SEL_UNKNOWN_VARIABLE",
            SelectionErrorCode::InvalidArgument => "SEL_INVALID_ARGUMENT",
            SelectionErrorCode::OutOfRangeIndex => "SEL_OUT_OF_RANGE_INDEX",
            SelectionErrorCode::ParseError => "SEL_PARSE_ERROR",
        }
    }
}

impl fmt::Display for SelectionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Selection error with the term and argument that caused it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionError {
    code: SelectionErrorCode,
    message: String,
    /// 1-based term number, once known
    term: Option<usize>,
    /// Offending argument or name
    argument: Option<String>,
}

impl SelectionError {
    fn new(code: SelectionErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            term: None,
            argument: None,
        }
    }

    /// Create an unknown variable error
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            argument: Some(name.clone()),
            ..Self::new(
                SelectionErrorCode::UnknownVariable,
                format!("Unknown variable '{}'", name),
            )
        }
    }

    /// Create an unknown function error
    pub fn unknown_function(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            argument: Some(name.clone()),
            ..Self::new(
                SelectionErrorCode::UnknownVariable,
                format!("Unknown function '{}'", name),
            )
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            argument: Some(argument.into()),
            ..Self::new(SelectionErrorCode::InvalidArgument, reason.into())
        }
    }

    /// Create an out of range index error
    pub fn out_of_range(index: i64, len: usize) -> Self {
        Self {
            argument: Some(index.to_string()),
            ..Self::new(
                SelectionErrorCode::OutOfRangeIndex,
                format!(
                    "Index {} is out of range for {} column(s); positions are 1..={}",
                    index, len, len
                ),
            )
        }
    }

    /// Create a parse error at the given line and column
    pub fn parse_error(line: usize, col: usize, reason: impl Into<String>) -> Self {
        Self::new(
            SelectionErrorCode::ParseError,
            format!("line {}, col {}: {}", line, col, reason.into()),
        )
    }

    /// Attaches the 1-based term number, keeping any number already set
    pub fn with_term(mut self, term: usize) -> Self {
        if self.term.is_none() {
            self.term = Some(term);
        }
        self
    }

    /// Returns the error code
    pub fn code(&self) -> SelectionErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the 1-based term number if known
    pub fn term(&self) -> Option<usize> {
        self.term
    }

    /// Returns the offending argument if applicable
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        match (self.term, &self.argument) {
            (Some(term), Some(arg)) => write!(f, " (term {}, argument '{}')", term, arg),
            (Some(term), None) => write!(f, " (term {})", term),
            (None, Some(arg)) => write!(f, " (argument '{}')", arg),
            (None, None) => Ok(()),
        }
    }
}

impl std::error::Error for SelectionError {}

/// Result type for selection operations
pub type SelectionResult<T> = Result<T, SelectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SelectionErrorCode::UnknownVariable.code(),
            "SEL_UNKNOWN_VARIABLE"
        );
        assert_eq!(
            SelectionErrorCode::InvalidArgument.code(),
            "SEL_INVALID_ARGUMENT"
        );
        assert_eq!(
            SelectionErrorCode::OutOfRangeIndex.code(),
            "SEL_OUT_OF_RANGE_INDEX"
        );
        assert_eq!(SelectionErrorCode::ParseError.code(), "SEL_PARSE_ERROR");
    }

    #[test]
    fn test_with_term_keeps_first() {
        let err = SelectionError::unknown_variable("zz").with_term(2).with_term(5);
        assert_eq!(err.term(), Some(2));
        assert_eq!(err.argument(), Some("zz"));
    }

    #[test]
    fn test_error_display() {
        let err = SelectionError::unknown_variable("zz").with_term(3);
        let display = format!("{}", err);
        assert!(display.contains("SEL_UNKNOWN_VARIABLE"));
        assert!(display.contains("'zz'"));
        assert!(display.contains("term 3"));
    }

    #[test]
    fn test_out_of_range_message() {
        let err = SelectionError::out_of_range(7, 3);
        assert_eq!(err.code(), SelectionErrorCode::OutOfRangeIndex);
        assert!(err.message().contains("1..=3"));
    }
}
