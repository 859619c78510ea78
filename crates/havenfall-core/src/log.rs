//! In-model event logs — append-only, capped, newest first.
//!
//! These are simulation state consumed by the UI collaborator, not
//! diagnostics; ambient diagnostics go through `tracing` instead.

use havenfall_logic::constants::{DEATH_LOG_CAP, EVENT_LOG_CAP};
use havenfall_logic::needs::DeathCause;
use serde::{Deserialize, Serialize};

/// Human-readable record of notable transitions (tech unlocks, births,
/// deaths, disasters, construction). Capped; oldest entries fall off.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    entries: Vec<String>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!(event = %text, "logged");
        self.entries.insert(0, text);
        self.entries.truncate(EVENT_LOG_CAP);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Separate capped record of deaths, one entry per removal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeathLog {
    entries: Vec<String>,
}

impl DeathLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, cause: DeathCause, age: f32) {
        self.entries
            .insert(0, format!("{} (age {})", cause.label(), age.floor() as u32));
        self.entries.truncate(DEATH_LOG_CAP);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_newest_first() {
        let mut log = EventLog::new();
        log.push("first");
        log.push("second");
        assert_eq!(log.latest(), Some("second"));
        assert_eq!(log.entries()[1], "first");
    }

    #[test]
    fn test_event_log_capped() {
        let mut log = EventLog::new();
        for i in 0..100 {
            log.push(format!("event {i}"));
        }
        assert_eq!(log.len(), EVENT_LOG_CAP);
        assert_eq!(log.latest(), Some("event 99"));
    }

    #[test]
    fn test_death_log_capped_and_formatted() {
        let mut log = DeathLog::new();
        for _ in 0..20 {
            log.record(DeathCause::Starvation, 42.7);
        }
        assert_eq!(log.len(), DEATH_LOG_CAP);
        assert_eq!(log.entries()[0], "starvation (age 42)");
    }
}
