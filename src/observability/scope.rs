//! ObservationScope for begin/complete logging around one request
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` on `complete`, with elapsed time
//! - Logs `{name}_FAILED` on `fail`
//! - Logs `{name}_INCOMPLETE` if dropped without either

use std::cell::Cell;
use std::time::Instant;

use super::logger::Logger;

/// A scope that logs its own begin and end
///
/// ```ignore
/// let scope = ObservationScope::new("SELECT");
/// // ... resolve ...
/// scope.complete_with_fields(&[("columns", "3")]);
/// ```
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: Cell<bool>,
    timer: Timer,
}

impl<'a> ObservationScope<'a> {
    pub fn new(name: &'a str) -> Self {
        Self::with_fields(name, &[])
    }

    /// Create a scope, attaching `fields` to the begin event
    pub fn with_fields(name: &'a str, fields: &[(&str, &str)]) -> Self {
        Logger::info(&format!("{}_BEGIN", name), fields);
        Self {
            name,
            completed: Cell::new(false),
            timer: Timer::new(),
        }
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Mark the scope completed, logging `extra_fields` and `elapsed_us`
    pub fn complete_with_fields(self, extra_fields: &[(&str, &str)]) {
        self.completed.set(true);
        let elapsed = self.timer.elapsed_us();
        let mut fields: Vec<(&str, &str)> = extra_fields.to_vec();
        fields.push(("elapsed_us", elapsed.as_str()));
        Logger::info(&format!("{}_COMPLETE", self.name), &fields);
    }

    /// Mark the scope failed with a code and reason
    pub fn fail(self, code: &str, reason: &str) {
        self.completed.set(true);
        Logger::warn(
            &format!("{}_FAILED", self.name),
            &[("code", code), ("reason", reason)],
        );
    }

    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        if !self.completed.get() {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

/// Elapsed-time helper for log fields
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed microseconds as a string
    pub fn elapsed_us(&self) -> String {
        self.start.elapsed().as_micros().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_complete() {
        let scope = ObservationScope::new("TEST");
        assert!(!scope.is_completed());
        scope.complete_with_fields(&[("columns", "2")]);
    }

    #[test]
    fn test_scope_fail() {
        let scope = ObservationScope::with_fields("TEST", &[("terms", "1")]);
        scope.fail("SEL_PARSE_ERROR", "bad input");
    }

    #[test]
    fn test_scope_drop_without_complete() {
        let scope = ObservationScope::new("TEST");
        drop(scope);
    }

    #[test]
    fn test_timer_monotonic() {
        let timer = Timer::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let us: u128 = timer.elapsed_us().parse().unwrap();
        assert!(us >= 2000);
    }
}
