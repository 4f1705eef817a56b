//! Interaction events and the subscription mechanism the probe listens on.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::mpsc;

/// Event classes the probe understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PointerMove,
    Click,
    KeyDown,
    Scroll,
    Focus,
    Blur,
    Resize,
    Gesture,
    Touch,
}

impl EventKind {
    /// Qualifying classes feed the interval sequence; the rest are only counted.
    pub fn is_qualifying(&self) -> bool {
        matches!(
            self,
            EventKind::PointerMove | EventKind::Click | EventKind::KeyDown | EventKind::Scroll
        )
    }
}

fn default_trusted() -> bool {
    true
}

/// One observed interaction, timestamped by the host's monotonic clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub kind: EventKind,
    /// Milliseconds on the host clock.
    pub t_ms: f64,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    /// False when the host reports the event as script-generated.
    #[serde(default = "default_trusted")]
    pub trusted: bool,
}

impl InteractionEvent {
    pub fn new(kind: EventKind, t_ms: f64) -> Self {
        Self {
            kind,
            t_ms,
            x: None,
            y: None,
            trusted: true,
        }
    }

    pub fn pointer(t_ms: f64, x: f64, y: f64) -> Self {
        Self {
            kind: EventKind::PointerMove,
            t_ms,
            x: Some(x),
            y: Some(y),
            trusted: true,
        }
    }

    pub fn untrusted(mut self) -> Self {
        self.trusted = false;
        self
    }
}

/// A live listener registration. Events arrive on `events` until `guard`
/// is dropped.
pub struct Subscription {
    pub guard: ListenerGuard,
    pub events: mpsc::UnboundedReceiver<InteractionEvent>,
}

/// Anything the probe can attach a listener to.
pub trait EventSource {
    fn subscribe(&self) -> Subscription;
}

type Listeners = HashMap<u64, mpsc::UnboundedSender<InteractionEvent>>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Listeners,
}

/// In-process dispatcher standing in for the host's event subscription API.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every registered listener. Returns how many
    /// listeners received it.
    pub fn dispatch(&self, event: InteractionEvent) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .listeners
            .retain(|_, tx| tx.send(event.clone()).is_ok());
        inner.listeners.len()
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}

impl EventSource for EventBus {
    fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.insert(id, tx);

        Subscription {
            guard: ListenerGuard {
                id,
                bus: Arc::downgrade(&self.inner),
            },
            events: rx,
        }
    }
}

/// Removes its listener from the bus when dropped.
pub struct ListenerGuard {
    id: u64,
    bus: Weak<Mutex<BusInner>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .remove(&self.id);
        }
    }
}
