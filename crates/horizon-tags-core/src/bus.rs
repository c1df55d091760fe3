//! Per-instance publish/subscribe hub.
//!
//! An [`EventBus`] decouples the state machines of a widget from each other and
//! from the host. Handlers are registered against one or more event names and
//! are invoked synchronously, in registration order, on the caller's stack.
//!
//! # Key Types
//!
//! - [`EventBus<E>`] - The hub itself, one per widget instance
//! - [`BusEvent`] - Implemented by the event enum a bus carries
//! - [`Flow`] - What a handler tells the bus after running
//! - [`Placement`] - Whether a handler is appended or prepended
//!
//! # Short-circuiting
//!
//! A handler that returns [`Flow::Halt`] (or `false`) stops the remaining
//! handlers for that dispatch. Returning `()` or `true` continues.
//!
//! # Example
//!
//! ```
//! use std::str::FromStr;
//! use horizon_tags_core::bus::{BusEvent, EventBus};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Name { Ping }
//!
//! impl FromStr for Name {
//!     type Err = ();
//!     fn from_str(s: &str) -> Result<Self, ()> {
//!         match s { "ping" => Ok(Name::Ping), _ => Err(()) }
//!     }
//! }
//!
//! struct Ping(u32);
//!
//! impl BusEvent for Ping {
//!     type Name = Name;
//!     fn name(&self) -> Name { Name::Ping }
//! }
//!
//! let bus = EventBus::<Ping>::new();
//! bus.on("ping", |event: &Ping| println!("ping {}", event.0)).unwrap();
//! bus.on("ping", |_: &Ping| false).unwrap();
//! bus.trigger(Ping(1));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::error::BusError;

new_key_type! {
    /// Identifies a registered handler.
    ///
    /// Handlers are never removed, so an id stays valid for the life of the bus.
    pub struct HandlerId;
}

/// An event carried by an [`EventBus`].
pub trait BusEvent: Send + Sync + 'static {
    /// The closed set of names this event type can be subscribed under.
    type Name: Copy + Eq + Hash + fmt::Debug + FromStr + Send + Sync + 'static;

    /// The name handlers for this event are registered under.
    fn name(&self) -> Self::Name;
}

/// Returned by a handler to continue or stop the current dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flow {
    /// Run the next handler.
    #[default]
    Continue,
    /// Skip every remaining handler for this dispatch.
    Halt,
}

impl From<()> for Flow {
    fn from((): ()) -> Self {
        Self::Continue
    }
}

impl From<bool> for Flow {
    fn from(proceed: bool) -> Self {
        if proceed { Self::Continue } else { Self::Halt }
    }
}

/// Where a new handler goes relative to existing handlers for the same name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Placement {
    /// After every handler already registered.
    #[default]
    Append,
    /// Before every handler already registered.
    Prepend,
}

/// Outcome of [`EventBus::trigger`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Every handler ran.
    Completed,
    /// A handler halted the dispatch.
    Halted,
}

impl Dispatch {
    /// Whether a handler halted the dispatch.
    pub fn is_halted(self) -> bool {
        self == Self::Halted
    }
}

type Handler<E> = Arc<dyn Fn(&E) -> Flow + Send + Sync>;

struct Registry<E: BusEvent> {
    handlers: SlotMap<HandlerId, Handler<E>>,
    order: HashMap<E::Name, Vec<HandlerId>>,
}

/// A synchronous, per-instance publish/subscribe hub.
///
/// `EventBus<E>` is `Send + Sync`. Dispatch snapshots the handler list and
/// releases the internal lock before running handlers, so a handler may
/// register further handlers or trigger nested events.
pub struct EventBus<E: BusEvent> {
    registry: Mutex<Registry<E>>,
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: BusEvent> EventBus<E> {
    /// Create a bus with no handlers.
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                handlers: SlotMap::with_key(),
                order: HashMap::new(),
            }),
        }
    }

    /// Append a handler for every space-separated name in `names`.
    ///
    /// Returns `self` so registrations can be chained.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::UnknownEvent`] if any name fails to parse, in which
    /// case nothing is registered.
    pub fn on<F, R>(&self, names: &str, handler: F) -> Result<&Self, BusError>
    where
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: Into<Flow>,
    {
        self.on_with(names, handler, Placement::Append)?;
        Ok(self)
    }

    /// Register a handler with an explicit placement.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::UnknownEvent`] if any name fails to parse and
    /// [`BusError::NoEventNames`] if `names` is blank.
    pub fn on_with<F, R>(
        &self,
        names: &str,
        handler: F,
        placement: Placement,
    ) -> Result<HandlerId, BusError>
    where
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: Into<Flow>,
    {
        let parsed = names
            .split_whitespace()
            .map(|name| {
                E::Name::from_str(name).map_err(|_| BusError::UnknownEvent(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if parsed.is_empty() {
            return Err(BusError::NoEventNames);
        }
        Ok(self.register(&parsed, Arc::new(move |event: &E| handler(event).into()), placement))
    }

    /// Register one handler under several already-typed names.
    pub fn on_names<F, R>(&self, names: &[E::Name], handler: F, placement: Placement) -> HandlerId
    where
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: Into<Flow>,
    {
        self.register(names, Arc::new(move |event: &E| handler(event).into()), placement)
    }

    fn register(&self, names: &[E::Name], handler: Handler<E>, placement: Placement) -> HandlerId {
        let mut registry = self.registry.lock();
        let id = registry.handlers.insert(handler);
        for name in names {
            let ids = registry.order.entry(*name).or_default();
            match placement {
                Placement::Append => ids.push(id),
                Placement::Prepend => ids.insert(0, id),
            }
        }
        tracing::trace!(target: "horizon_tags_core::bus", ?names, ?placement, "registered handler");
        id
    }

    /// Number of handlers registered under `name`.
    pub fn handler_count(&self, name: E::Name) -> usize {
        self.registry.lock().order.get(&name).map_or(0, Vec::len)
    }

    /// Dispatch `event` to every handler registered under its name.
    ///
    /// Handlers run in order on the calling stack; the call returns once they
    /// have all run or one of them halted.
    #[tracing::instrument(skip_all, target = "horizon_tags_core::bus", level = "trace", fields(event = ?event.name()))]
    pub fn trigger(&self, event: E) -> Dispatch {
        let handlers: Vec<Handler<E>> = {
            let registry = self.registry.lock();
            registry
                .order
                .get(&event.name())
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| registry.handlers.get(*id).cloned())
                        .collect()
                })
                .unwrap_or_default()
        };

        for (position, handler) in handlers.iter().enumerate() {
            if handler(&event) == Flow::Halt {
                tracing::trace!(target: "horizon_tags_core::bus", position, "dispatch halted");
                return Dispatch::Halted;
            }
        }
        Dispatch::Completed
    }
}

impl<E: BusEvent> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.lock();
        f.debug_struct("EventBus")
            .field("handlers", &registry.handlers.len())
            .field("names", &registry.order.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Name {
        Alpha,
        Beta,
    }

    impl FromStr for Name {
        type Err = ();

        fn from_str(s: &str) -> Result<Self, ()> {
            match s {
                "alpha" => Ok(Self::Alpha),
                "beta" => Ok(Self::Beta),
                _ => Err(()),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        Alpha(i32),
        Beta,
    }

    impl BusEvent for TestEvent {
        type Name = Name;

        fn name(&self) -> Name {
            match self {
                Self::Alpha(_) => Name::Alpha,
                Self::Beta => Name::Beta,
            }
        }
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&TestEvent) + Send + Sync>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        let make = move |label: &str| {
            let log = log_clone.clone();
            let label = label.to_string();
            Box::new(move |_: &TestEvent| log.lock().push(label.clone()))
                as Box<dyn Fn(&TestEvent) + Send + Sync>
        };
        (log, make)
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = EventBus::<TestEvent>::new();
        let (log, make) = recorder();

        let first = make("first");
        let second = make("second");
        bus.on("alpha", move |e| first(e)).unwrap();
        bus.on("alpha", move |e| second(e)).unwrap();

        assert_eq!(bus.trigger(TestEvent::Alpha(1)), Dispatch::Completed);
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_prepend_runs_first() {
        let bus = EventBus::<TestEvent>::new();
        let (log, make) = recorder();

        let late = make("appended");
        let early = make("prepended");
        bus.on("alpha", move |e| late(e)).unwrap();
        bus.on_with("alpha", move |e| early(e), Placement::Prepend).unwrap();

        bus.trigger(TestEvent::Alpha(1));
        assert_eq!(*log.lock(), vec!["prepended", "appended"]);
    }

    #[test]
    fn test_false_halts_remaining_handlers() {
        let bus = EventBus::<TestEvent>::new();
        let (log, make) = recorder();

        let before = make("before");
        let after = make("after");
        bus.on("alpha", move |e| before(e)).unwrap();
        bus.on("alpha", |_: &TestEvent| false).unwrap();
        bus.on("alpha", move |e| after(e)).unwrap();

        assert!(bus.trigger(TestEvent::Alpha(1)).is_halted());
        assert_eq!(*log.lock(), vec!["before"]);
    }

    #[test]
    fn test_true_and_unit_continue() {
        let bus = EventBus::<TestEvent>::new();
        let count = Arc::new(Mutex::new(0));

        let c1 = count.clone();
        bus.on("beta", move |_: &TestEvent| {
            *c1.lock() += 1;
            true
        })
        .unwrap();
        let c2 = count.clone();
        bus.on("beta", move |_: &TestEvent| *c2.lock() += 1).unwrap();

        assert_eq!(bus.trigger(TestEvent::Beta), Dispatch::Completed);
        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn test_multiple_names_share_one_handler() {
        let bus = EventBus::<TestEvent>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        bus.on("alpha beta", move |e: &TestEvent| seen_clone.lock().push(e.clone()))
            .unwrap();

        bus.trigger(TestEvent::Alpha(7));
        bus.trigger(TestEvent::Beta);

        assert_eq!(*seen.lock(), vec![TestEvent::Alpha(7), TestEvent::Beta]);
        assert_eq!(bus.handler_count(Name::Alpha), 1);
        assert_eq!(bus.handler_count(Name::Beta), 1);
    }

    #[test]
    fn test_unknown_name_registers_nothing() {
        let bus = EventBus::<TestEvent>::new();

        let err = bus.on("alpha gamma", |_: &TestEvent| ()).unwrap_err();
        assert_eq!(err, BusError::UnknownEvent("gamma".to_string()));
        assert_eq!(bus.handler_count(Name::Alpha), 0);

        assert_eq!(bus.on("   ", |_: &TestEvent| ()).unwrap_err(), BusError::NoEventNames);
    }

    #[test]
    fn test_nested_trigger_from_handler() {
        let bus = Arc::new(EventBus::<TestEvent>::new());
        let (log, make) = recorder();

        let inner = make("beta");
        bus.on("beta", move |e| inner(e)).unwrap();

        let bus_clone = bus.clone();
        bus.on("alpha", move |_: &TestEvent| {
            bus_clone.trigger(TestEvent::Beta);
        })
        .unwrap();

        bus.trigger(TestEvent::Alpha(0));
        assert_eq!(*log.lock(), vec!["beta"]);
    }

    #[test]
    fn test_on_names_with_typed_names() {
        let bus = EventBus::<TestEvent>::new();
        let (log, make) = recorder();

        let typed = make("typed");
        let id = bus.on_names(&[Name::Alpha, Name::Beta], move |e| typed(e), Placement::Append);
        let again = make("again");
        let other = bus.on_names(&[Name::Beta], move |e| again(e), Placement::Prepend);
        assert_ne!(id, other);

        bus.trigger(TestEvent::Beta);
        bus.trigger(TestEvent::Alpha(3));
        assert_eq!(*log.lock(), vec!["again", "typed", "typed"]);
    }

    #[test]
    fn test_trigger_without_handlers() {
        let bus = EventBus::<TestEvent>::new();
        assert_eq!(bus.trigger(TestEvent::Beta), Dispatch::Completed);
    }
}
