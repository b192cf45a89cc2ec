//! Observable events
//!
//! Events are explicit and typed; each maps to one stable uppercase name.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration file loaded and validated
    ConfigLoaded,
    /// CLI request parsed from stdin
    RequestReceived,
    /// One selection term evaluated
    TermEvaluated,
    /// Selection resolved to a mapping
    SelectionComplete,
    /// Selection rejected
    SelectionFailed,
    /// Rename resolved to a mapping
    RenameComplete,
    /// Explain produced
    ExplainComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::RequestReceived => "REQUEST_RECEIVED",
            Event::TermEvaluated => "TERM_EVALUATED",
            Event::SelectionComplete => "SELECTION_COMPLETE",
            Event::SelectionFailed => "SELECTION_FAILED",
            Event::RenameComplete => "RENAME_COMPLETE",
            Event::ExplainComplete => "EXPLAIN_COMPLETE",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::TermEvaluated => Severity::Trace,
            Event::SelectionFailed => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
