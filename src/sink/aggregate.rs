use crate::event::{LogEvent, LogLevel};
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;

/// One message to send: a representative event plus the window in which
/// events with the same exception message were seen in the current batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DeduplicatedUnit {
    pub log_event: LogEvent,
    pub first_occurrence: DateTime<FixedOffset>,
    pub last_occurrence: DateTime<FixedOffset>,
    pub include_stack_trace: bool,
}

impl DeduplicatedUnit {
    pub fn new(log_event: LogEvent, include_stack_trace: bool) -> Self {
        Self {
            first_occurrence: log_event.timestamp,
            last_occurrence: log_event.timestamp,
            log_event,
            include_stack_trace,
        }
    }

    /// Fold another occurrence into the window.
    pub fn widen(&mut self, timestamp: DateTime<FixedOffset>) {
        if timestamp < self.first_occurrence {
            self.first_occurrence = timestamp;
        } else if timestamp > self.last_occurrence {
            self.last_occurrence = timestamp;
        }
    }

    pub fn is_single_occurrence(&self) -> bool {
        self.first_occurrence == self.last_occurrence
    }
}

/// Collapse a batch into deduplicated units.
///
/// Events below `minimum_level` are dropped. Events carrying an exception are
/// keyed by the exception message (the empty string is a valid key); events
/// without one always start a unit of their own. Units come out in the order
/// their key was first seen.
pub fn aggregate<I>(events: I, minimum_level: LogLevel, include_stack_trace: bool) -> Vec<DeduplicatedUnit>
where
    I: IntoIterator<Item = LogEvent>,
{
    let mut units: Vec<DeduplicatedUnit> = Vec::new();
    let mut by_exception_message: HashMap<String, usize> = HashMap::new();

    for event in events {
        if event.level < minimum_level {
            continue;
        }

        let Some(key) = event.exception.as_ref().map(|e| e.message.clone()) else {
            units.push(DeduplicatedUnit::new(event, include_stack_trace));
            continue;
        };

        match by_exception_message.get(&key) {
            Some(&index) => units[index].widen(event.timestamp),
            None => {
                by_exception_message.insert(key, units.len());
                units.push(DeduplicatedUnit::new(event, include_stack_trace));
            }
        }
    }

    units
}
