use crate::domain::model::Event;
use std::collections::VecDeque;

/// Outbox handed to a component while one of its handlers runs.
#[derive(Debug, Default)]
pub struct Emitter {
    events: Vec<Event>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// FIFO of pending events plus a journal of everything dispatched.
///
/// Events emitted by a handler are queued behind the event being handled, so
/// handlers never run re-entrantly and delivery order is emission order.
#[derive(Debug, Default)]
pub struct EventBus {
    queue: VecDeque<Event>,
    journal: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.queue.extend(events);
    }

    /// Next event to dispatch; recorded in the journal on the way out.
    pub fn next(&mut self) -> Option<Event> {
        let event = self.queue.pop_front()?;
        self.journal.push(event.clone());
        Some(event)
    }

    pub fn journal(&self) -> &[Event] {
        &self.journal
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }
}
