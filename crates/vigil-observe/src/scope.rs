//! State shared by every node of one observed tree.

use std::backtrace::Backtrace;
use std::cell::Cell;
use std::panic::Location;
use std::rc::Rc;

use vigil_schema::{ErrorEntry, ErrorSink, Options, Report};

use crate::subscriber::{Event, Subscriber};

/// The sink and subscriber of one root observation, plus the diagnostic
/// context of the operation currently running.
pub(crate) struct Scope {
    sink: ErrorSink,
    subscriber: Rc<dyn Subscriber>,
    options: Options,
    caller: Cell<Option<&'static Location<'static>>>,
}

impl Scope {
    pub(crate) fn new(sink: ErrorSink, subscriber: Rc<dyn Subscriber>, options: Options) -> Rc<Self> {
        Rc::new(Self {
            sink,
            subscriber,
            options,
            caller: Cell::new(None),
        })
    }

    pub(crate) fn sink(&self) -> &ErrorSink {
        &self.sink
    }

    pub(crate) fn subscriber(&self) -> &Rc<dyn Subscriber> {
        &self.subscriber
    }

    /// Marks the public call site of the running operation. The outermost
    /// call wins until its guard drops.
    pub(crate) fn enter(&self, caller: &'static Location<'static>) -> CallerGuard<'_> {
        let owned = self.caller.get().is_none();
        if owned {
            self.caller.set(Some(caller));
        }
        CallerGuard { scope: self, owned }
    }

    /// Adds the configured diagnostics to an entry.
    pub(crate) fn decorate(&self, mut entry: ErrorEntry) -> ErrorEntry {
        if self.options.trace_errors
            && let Some(caller) = self.caller.get()
        {
            entry = entry.with_location(caller.file(), caller.line(), caller.column());
        }
        if self.options.full_trace {
            let trace = Backtrace::force_capture().to_string();
            entry = entry.with_stack(trace.lines().map(|line| line.trim().to_string()).collect());
        }
        entry
    }
}

impl Report for Scope {
    fn report(&self, entry: ErrorEntry) {
        let entry = self.decorate(entry);
        self.sink.push(entry.clone());
        tracing::trace!(code = %entry.code, path = %entry.path, "notifying subscriber");
        self.subscriber.emit(&Event::Invalidate(&entry));
    }
}

pub(crate) struct CallerGuard<'a> {
    scope: &'a Scope,
    owned: bool,
}

impl Drop for CallerGuard<'_> {
    fn drop(&mut self) {
        if self.owned {
            self.scope.caller.set(None);
        }
    }
}
