//! Structured JSON logger
//!
//! - One log line = one event
//! - `event` first, then `severity`, then fields sorted by key
//! - Synchronous, written to stderr; stdout carries CLI responses only

use std::fmt;
use std::io::{self, Write};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-term detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Rejected requests
    Warn = 2,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger that outputs JSON lines
pub struct Logger;

impl Logger {
    /// Log an event with the given severity and fields
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        Self::log_to_writer(severity, event, fields, &mut io::stderr());
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let mut output = String::with_capacity(256);

        output.push_str("{\"event\":\"");
        Self::escape_json_string(&mut output, event);
        output.push_str("\",\"severity\":\"");
        output.push_str(severity.as_str());
        output.push('"');

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push_str(",\"");
            Self::escape_json_string(&mut output, key);
            output.push_str("\":\"");
            Self::escape_json_string(&mut output, value);
            output.push('"');
        }

        output.push_str("}\n");

        // Logging must never fail the caller
        let _ = writer.write_all(output.as_bytes());
        let _ = writer.flush();
    }

    fn escape_json_string(output: &mut String, s: &str) {
        for c in s.chars() {
            match c {
                '"' => output.push_str("\\\""),
                '\\' => output.push_str("\\\\"),
                '\n' => output.push_str("\\n"),
                '\r' => output.push_str("\\r"),
                '\t' => output.push_str("\\t"),
                c if c.is_control() => {
                    output.push_str(&format!("\\u{:04x}", c as u32));
                }
                c => output.push(c),
            }
        }
    }

    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }
}

/// Capture a log line to a buffer for testing
#[cfg(test)]
pub fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
    }

    #[test]
    fn test_log_json_format() {
        let output = capture_log(Severity::Info, "SELECTION_COMPLETE", &[("columns", "3")]);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "SELECTION_COMPLETE");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["columns"], "3");
    }

    #[test]
    fn test_log_deterministic_ordering() {
        let output1 = capture_log(
            Severity::Trace,
            "TERM_EVALUATED",
            &[("term", "1"), ("expr", "a:c"), ("indices", "[1, 2, 3]")],
        );
        let output2 = capture_log(
            Severity::Trace,
            "TERM_EVALUATED",
            &[("indices", "[1, 2, 3]"), ("term", "1"), ("expr", "a:c")],
        );
        assert_eq!(output1, output2);

        let expr_pos = output1.find("\"expr\"").unwrap();
        let indices_pos = output1.find("\"indices\"").unwrap();
        let term_pos = output1.find("\"term\"").unwrap();
        assert!(expr_pos < indices_pos);
        assert!(indices_pos < term_pos);
    }

    #[test]
    fn test_log_escapes_special_chars() {
        let output = capture_log(
            Severity::Info,
            "TERM_EVALUATED",
            &[("expr", "starts_with(\"a\\b\")\n")],
        );
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["expr"], "starts_with(\"a\\b\")\n");
    }

    #[test]
    fn test_log_one_line_event_first() {
        let output = capture_log(Severity::Warn, "SELECTION_FAILED", &[("a", "1")]);
        assert_eq!(output.matches('\n').count(), 1);
        assert!(output.starts_with("{\"event\":"));
    }
}
