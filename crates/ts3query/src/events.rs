//! Asynchronous notifications: the event catalog (wire name → typed
//! constructor) and the bounded, non-blocking fan-out that hands each
//! decoded event to every subscriber.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use tokio::sync::mpsc;

use crate::catalog::events::{ClientLeftView, TextMessageReceived, UnknownEvent};
use crate::codec::{ArgMap, WireDecode};

/// A decoded asynchronous notification.
///
/// [`Event::Unknown`] carries the wire name and raw arguments of any
/// `notify*` line the catalog has no constructor for, so a caller can still
/// observe (and log) notifications this crate doesn't yet model.
#[derive(Clone, Debug)]
pub enum Event {
    ClientLeftView(ClientLeftView),
    TextMessageReceived(TextMessageReceived),
    Unknown(UnknownEvent),
}

type Constructor = fn(&ArgMap) -> Event;

/// Immutable wire-name → constructor table, built once on first use.
///
/// The reference client keeps this table as a mutable global populated by
/// `init()` side effects scattered across its message files; here the whole
/// table is a fixed literal assembled lazily behind a [`OnceLock`], so
/// there's no registration order to get wrong and no runtime mutation to
/// synchronize.
pub struct EventCatalog {
    constructors: HashMap<&'static str, Constructor>,
}

impl EventCatalog {
    pub fn global() -> &'static EventCatalog {
        static CATALOG: OnceLock<EventCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            let mut constructors: HashMap<&'static str, Constructor> = HashMap::new();
            constructors.insert("clientleftview", |map| {
                Event::ClientLeftView(ClientLeftView::decode(map))
            });
            constructors.insert("textmessage", |map| {
                Event::TextMessageReceived(TextMessageReceived::decode(map))
            });
            EventCatalog { constructors }
        })
    }

    /// Builds the typed event for `name`, falling back to
    /// [`Event::Unknown`] when the catalog has no constructor registered.
    pub fn build(&self, name: &str, map: &ArgMap) -> Event {
        match self.constructors.get(name) {
            Some(ctor) => ctor(map),
            None => {
                tracing::warn!(event = name, "no catalog constructor for event, delivering as Unknown");
                Event::Unknown(UnknownEvent {
                    name: name.to_string(),
                    args: map.clone(),
                })
            }
        }
    }
}

/// Bounded, non-blocking broadcast to every live subscriber.
///
/// Each subscriber gets its own bounded channel. A slow subscriber that
/// lets its channel fill up simply misses events — `try_send` never blocks
/// the Driver task waiting on a reader that isn't keeping up — while a
/// subscriber that has been dropped is pruned from the sink list on the
/// next dispatch.
#[derive(Clone)]
pub struct Fanout {
    capacity: usize,
    sinks: std::sync::Arc<Mutex<Vec<mpsc::Sender<Event>>>>,
}

impl Fanout {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            sinks: std::sync::Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Registers a new subscriber and returns its receiving half.
    pub fn register(&self) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.sinks.lock().expect("fanout mutex poisoned").push(tx);
        rx
    }

    /// Delivers `event` to every live sink, dropping it for any sink whose
    /// channel is currently full and pruning any sink whose subscriber has
    /// gone away.
    pub fn dispatch(&self, event: Event) {
        let mut sinks = self.sinks.lock().expect("fanout mutex poisoned");
        sinks.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!("dropping event for a subscriber that is falling behind");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }
}

/// The subscriber-facing half of a connected client: call
/// [`EventSource::subscribe`] as many times as needed, each call yielding
/// an independent stream of every event seen from here on.
pub struct EventSource {
    fanout: Fanout,
}

impl EventSource {
    pub(crate) fn new(fanout: Fanout) -> Self {
        Self { fanout }
    }

    pub fn subscribe(&self) -> mpsc::Receiver<Event> {
        self.fanout.register()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_name_falls_back_to_unknown() {
        let catalog = EventCatalog::global();
        let map = decode_for_test("foo=bar");
        match catalog.build("somethingnew", &map) {
            Event::Unknown(e) => {
                assert_eq!(e.name, "somethingnew");
                assert_eq!(e.args.get_string("foo"), "bar");
            }
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn registered_name_builds_typed_event() {
        let catalog = EventCatalog::global();
        let map = decode_for_test("cfid=1 ctid=2 reasonid=3 clid=4");
        match catalog.build("clientleftview", &map) {
            Event::ClientLeftView(e) => assert_eq!(e.clid, 4),
            other => panic!("expected ClientLeftView, got {other:?}"),
        }
    }

    fn decode_for_test(args: &str) -> ArgMap {
        crate::codec::decode_arg_map(args).unwrap()
    }

    #[tokio::test]
    async fn full_subscriber_does_not_block_others() {
        let fanout = Fanout::new(1);
        let mut slow = fanout.register();
        let mut fast = fanout.register();

        fanout.dispatch(Event::Unknown(UnknownEvent {
            name: "a".into(),
            args: ArgMap::default(),
        }));
        fanout.dispatch(Event::Unknown(UnknownEvent {
            name: "b".into(),
            args: ArgMap::default(),
        }));

        // `slow`'s channel (capacity 1) is now full; the second dispatch was
        // dropped for it but must still have reached `fast`.
        let first = slow.try_recv().unwrap();
        assert!(slow.try_recv().is_err());
        match first {
            Event::Unknown(e) => assert_eq!(e.name, "a"),
            _ => panic!(),
        }

        let a = fast.recv().await.unwrap();
        let b = fast.recv().await.unwrap();
        match (a, b) {
            (Event::Unknown(a), Event::Unknown(b)) => {
                assert_eq!(a.name, "a");
                assert_eq!(b.name, "b");
            }
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn dropped_subscriber_is_pruned() {
        let fanout = Fanout::new(4);
        let rx = fanout.register();
        drop(rx);
        assert_eq!(fanout.sinks.lock().unwrap().len(), 1);

        fanout.dispatch(Event::Unknown(UnknownEvent {
            name: "a".into(),
            args: ArgMap::default(),
        }));

        assert_eq!(fanout.sinks.lock().unwrap().len(), 0);
    }
}
