//! # Call Environment
//!
//! `Env` is the per-operation context the ledger hands to every component:
//! the block time the operation executes at, and the buffer its events are
//! written to. Nested component calls share one `Env`, so a compound
//! operation observes a single consistent time and produces one ordered
//! event list.

use crate::address::Address;
use crate::event::{Event, EventRecord};
use crate::temporal::Timestamp;

/// Execution context of a single ledger operation.
#[derive(Debug, Clone)]
pub struct Env {
    now: Timestamp,
    events: Vec<EventRecord>,
}

impl Env {
    /// Start an operation at block time `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now,
            events: Vec::new(),
        }
    }

    /// The block time of this operation.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Record an event emitted by the component at `emitter`.
    pub fn emit(&mut self, emitter: Address, event: Event) {
        self.events.push(EventRecord { emitter, event });
    }

    /// Events emitted so far.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Consume the environment, yielding its events.
    pub fn into_events(self) -> Vec<EventRecord> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_preserves_order() {
        let mut env = Env::new(Timestamp::from_epoch_secs(5).unwrap());
        let emitter = Address::new([3; 20]);
        env.emit(emitter, Event::ControllerAdded { controller: Address::ZERO });
        env.emit(emitter, Event::ControllerRemoved { controller: Address::ZERO });
        let names: Vec<_> = env.events().iter().map(|r| r.event.name()).collect();
        assert_eq!(names, vec!["controller_added", "controller_removed"]);
        assert_eq!(env.now().epoch_secs(), 5);
        assert_eq!(env.into_events().len(), 2);
    }
}
