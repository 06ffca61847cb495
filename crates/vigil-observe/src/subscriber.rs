//! Notification capability used by observed trees.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vigil_schema::ErrorEntry;

/// Event delivered to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event<'a> {
    /// An error entry was just recorded into the sink.
    Invalidate(&'a ErrorEntry),
}

impl Event<'_> {
    pub const INVALIDATE: &'static str = "invalidate";

    pub fn name(&self) -> &'static str {
        match self {
            Event::Invalidate(_) => Self::INVALIDATE,
        }
    }

    pub fn entry(&self) -> &ErrorEntry {
        match self {
            Event::Invalidate(entry) => entry,
        }
    }
}

/// Receiver of events. Called synchronously; the return value of handlers
/// is not observed.
pub trait Subscriber {
    fn emit(&self, event: &Event<'_>);
}

impl<F> Subscriber for F
where
    F: Fn(&Event<'_>),
{
    fn emit(&self, event: &Event<'_>) {
        self(event)
    }
}

/// Subscriber that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Subscriber for Silent {
    fn emit(&self, _event: &Event<'_>) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Rc<dyn Fn(&Event<'_>)>;

/// Name-keyed event emitter.
#[derive(Default)]
pub struct Emitter {
    handlers: RefCell<Vec<(String, HandlerId, Handler)>>,
    next_id: Cell<u64>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, name: impl Into<String>, handler: impl Fn(&Event<'_>) + 'static) -> HandlerId {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers
            .borrow_mut()
            .push((name.into(), id, Rc::new(handler)));
        id
    }

    /// Removes a handler. Returns whether it was registered under `name`.
    pub fn off(&self, name: &str, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(n, i, _)| !(n == name && *i == id));
        handlers.len() != before
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.handlers
            .borrow()
            .iter()
            .filter(|(n, _, _)| n == name)
            .count()
    }
}

impl Subscriber for Emitter {
    fn emit(&self, event: &Event<'_>) {
        // handlers may register or remove handlers while running
        let matching: Vec<Handler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(name, _, _)| name == event.name())
            .map(|(_, _, handler)| Rc::clone(handler))
            .collect();
        for handler in matching {
            handler(event);
        }
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter")
            .field("handlers", &self.handlers.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_schema::Violation;

    fn entry() -> ErrorEntry {
        ErrorEntry::new(&Violation::Required { name: "a".into() }, "a")
    }

    #[test]
    fn test_emitter_dispatches_by_name() {
        let emitter = Emitter::new();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        let id = emitter.on(Event::INVALIDATE, move |event| {
            assert_eq!(event.entry().path, "a");
            counter.set(counter.get() + 1);
        });
        emitter.on("other", |_| panic!("wrong event"));

        let entry = entry();
        emitter.emit(&Event::Invalidate(&entry));
        assert_eq!(seen.get(), 1);
        assert_eq!(emitter.listener_count(Event::INVALIDATE), 1);

        assert!(emitter.off(Event::INVALIDATE, id));
        assert!(!emitter.off(Event::INVALIDATE, id));
        emitter.emit(&Event::Invalidate(&entry));
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn test_closures_are_subscribers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let subscriber = move |event: &Event<'_>| log.borrow_mut().push(event.name());
        let entry = entry();
        subscriber.emit(&Event::Invalidate(&entry));
        Silent.emit(&Event::Invalidate(&entry));
        assert_eq!(*seen.borrow(), ["invalidate"]);
    }
}
