//! Observability subsystem
//!
//! Structured JSON logging for selection requests.
//!
//! # Principles
//!
//! 1. Observability is read-only and never changes a resolution result
//! 2. No async or background threads
//! 3. Deterministic output (sorted fields)
//!
//! # Usage
//!
//! ```ignore
//! use colsel::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::SelectionComplete, &[("columns", "3")]);
//!
//! let scope = ObservationScope::new("SELECT");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::{ObservationScope, Timer};

/// Log an event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::ConfigLoaded, &[("multi_rename", "numbered")]);
    }
}
