//! Event bus - lifecycle pub/sub within one component instance.
//!
//! The bus decouples lifecycle-stage producers from consumers inside a
//! single component. Dispatch is keyed by a closed [`Lifecycle`] enum
//! rather than open strings, so a typo in an event name is a compile
//! error instead of a runtime surprise.
//!
//! Semantics:
//! - Handlers run synchronously, in registration order.
//! - No de-duplication: the same closure registered twice runs twice.
//! - Removal is by [`HandlerId`] token; removing an absent handler is a
//!   no-op, not an error.
//! - Emitting an event with no handlers is [`Error::UnknownEvent`] -
//!   a wiring bug, never a silent no-op.
//!
//! The bus is generic over the dispatch target so the owning component
//! can hand itself (`&mut self`) to its own handlers: [`emit`] first
//! takes a snapshot of the handler list, releasing the borrow on the bus
//! before any handler runs. A handler registered mid-emit therefore
//! never runs inside the emit that preceded it.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::Error;
use crate::types::PropMap;

// =============================================================================
// Lifecycle Events
// =============================================================================

/// The closed set of lifecycle events driving the component state
/// machine: `CONSTRUCTED -> INITIALIZED -> RENDERED -> MOUNTED`,
/// cycling back through `RENDERED` on every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Fired synchronously inside the constructor.
    Init,
    /// Re-runs the render path.
    Render,
    /// Fired by the external driver once the node is in the document.
    Mounted,
    /// Fired after a property write, carrying both snapshots.
    Updated,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Render => "render",
            Self::Mounted => "mounted",
            Self::Updated => "updated",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Event Arguments
// =============================================================================

/// Positional arguments passed to handlers, as a closed payload enum.
#[derive(Clone, Default)]
pub enum EventArgs {
    /// No payload (`init`, `render`, `mounted`).
    #[default]
    None,
    /// Property snapshots from before and after a write (`updated`).
    Update { old: PropMap, new: PropMap },
}

// =============================================================================
// Event Bus
// =============================================================================

/// Token returned by [`EventBus::on`], used to unregister that handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

/// Handler signature: the dispatch target plus the emit arguments.
pub type Handler<T> = Rc<dyn Fn(&mut T, &EventArgs) -> Result<(), Error>>;

/// Per-instance publish/subscribe over the lifecycle events.
pub struct EventBus<T> {
    handlers: HashMap<Lifecycle, Vec<(HandlerId, Handler<T>)>>,
    next_id: u64,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventBus<T> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            next_id: 0,
        }
    }

    /// Register a handler at the end of the list for `event`.
    ///
    /// Registration order is invocation order. Registering the same
    /// closure twice invokes it twice.
    pub fn on(&mut self, event: Lifecycle, handler: Handler<T>) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.entry(event).or_default().push((id, handler));
        id
    }

    /// Remove the handler registered under `id`.
    ///
    /// Returns whether anything was removed; removing an absent handler
    /// is a no-op.
    pub fn off(&mut self, event: Lifecycle, id: HandlerId) -> bool {
        let Some(list) = self.handlers.get_mut(&event) else {
            return false;
        };
        let Some(pos) = list.iter().position(|(hid, _)| *hid == id) else {
            return false;
        };
        list.remove(pos);
        true
    }

    /// Snapshot of the currently registered handlers for `event`, in
    /// registration order.
    ///
    /// The caller drives dispatch from the snapshot so handlers are free
    /// to mutate the bus (and the target that owns it) while running.
    pub fn handlers(&self, event: Lifecycle) -> Vec<Handler<T>> {
        self.handlers
            .get(&event)
            .map(|list| list.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default()
    }

    /// Whether any handler is registered for `event`.
    pub fn has_handlers(&self, event: Lifecycle) -> bool {
        self.handlers.get(&event).is_some_and(|list| !list.is_empty())
    }
}

/// Drive every handler currently registered for `event`, synchronously
/// and in registration order.
///
/// Fails with [`Error::UnknownEvent`] when nothing is registered. Free
/// function rather than a method so the target can own its bus: the
/// handler snapshot is taken through `bus(target)` before `target` is
/// handed to the handlers mutably.
pub fn emit<T>(
    target: &mut T,
    bus: impl Fn(&T) -> Vec<Handler<T>>,
    event: Lifecycle,
    args: &EventArgs,
) -> Result<(), Error> {
    let handlers = bus(target);
    if handlers.is_empty() {
        return Err(Error::UnknownEvent(event));
    }
    for handler in handlers {
        handler(target, args)?;
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Dispatch target recording handler invocations.
    struct Recorder {
        bus: EventBus<Recorder>,
        log: Vec<String>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                bus: EventBus::new(),
                log: Vec::new(),
            }
        }

        fn emit(&mut self, event: Lifecycle) -> Result<(), Error> {
            emit(self, |r| r.bus.handlers(event), event, &EventArgs::None)
        }
    }

    fn push(label: &str) -> Handler<Recorder> {
        let label = label.to_string();
        Rc::new(move |r: &mut Recorder, _| {
            r.log.push(label.clone());
            Ok(())
        })
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let mut r = Recorder::new();
        r.bus.on(Lifecycle::Init, push("first"));
        r.bus.on(Lifecycle::Init, push("second"));
        r.bus.on(Lifecycle::Init, push("third"));

        r.emit(Lifecycle::Init).unwrap();
        assert_eq!(r.log, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_duplicate_registration_runs_twice() {
        let mut r = Recorder::new();
        let handler = push("again");
        r.bus.on(Lifecycle::Render, Rc::clone(&handler));
        r.bus.on(Lifecycle::Render, handler);

        r.emit(Lifecycle::Render).unwrap();
        assert_eq!(r.log, vec!["again", "again"]);
    }

    #[test]
    fn test_emit_without_handlers_is_unknown_event() {
        let mut r = Recorder::new();
        let err = r.emit(Lifecycle::Mounted).unwrap_err();
        assert!(matches!(err, Error::UnknownEvent(Lifecycle::Mounted)));
    }

    #[test]
    fn test_off_removes_exactly_one_registration() {
        let mut r = Recorder::new();
        let first = r.bus.on(Lifecycle::Init, push("kept"));
        r.bus.on(Lifecycle::Init, push("kept"));

        assert!(r.bus.off(Lifecycle::Init, first));
        // Removing again is a no-op, not an error.
        assert!(!r.bus.off(Lifecycle::Init, first));

        r.emit(Lifecycle::Init).unwrap();
        assert_eq!(r.log, vec!["kept"]);
    }

    #[test]
    fn test_off_then_empty_emit_fails() {
        let mut r = Recorder::new();
        let id = r.bus.on(Lifecycle::Updated, push("gone"));
        r.bus.off(Lifecycle::Updated, id);

        assert!(!r.bus.has_handlers(Lifecycle::Updated));
        assert!(matches!(
            r.emit(Lifecycle::Updated),
            Err(Error::UnknownEvent(Lifecycle::Updated))
        ));
    }

    #[test]
    fn test_handler_registered_mid_emit_waits_for_next_emit() {
        let mut r = Recorder::new();
        r.bus.on(
            Lifecycle::Init,
            Rc::new(|r: &mut Recorder, _| {
                r.log.push("outer".to_string());
                r.bus.on(Lifecycle::Init, push("inner"));
                Ok(())
            }),
        );

        r.emit(Lifecycle::Init).unwrap();
        assert_eq!(r.log, vec!["outer"]);

        r.emit(Lifecycle::Init).unwrap();
        assert_eq!(r.log, vec!["outer", "outer", "inner"]);
    }

    #[test]
    fn test_reentrant_emit_cascades_on_one_stack() {
        let mut r = Recorder::new();
        r.bus.on(
            Lifecycle::Init,
            Rc::new(|r: &mut Recorder, _| {
                r.log.push("init".to_string());
                r.emit(Lifecycle::Render)
            }),
        );
        r.bus.on(Lifecycle::Render, push("render"));

        r.emit(Lifecycle::Init).unwrap();
        assert_eq!(r.log, vec!["init", "render"]);
    }

    #[test]
    fn test_lifecycle_display_names() {
        assert_eq!(Lifecycle::Init.to_string(), "init");
        assert_eq!(Lifecycle::Render.to_string(), "render");
        assert_eq!(Lifecycle::Mounted.to_string(), "mounted");
        assert_eq!(Lifecycle::Updated.to_string(), "updated");
    }
}
