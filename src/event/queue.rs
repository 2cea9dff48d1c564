//! Engine event queue: FIFO between host threads and the engine loop.
//!
//! Any number of host threads post; the engine drains once per tic. A
//! crossbeam channel linearizes concurrent posts, so drain order is the
//! order in which the posts completed.

use super::messages::InputEvent;
use crate::error::{BridgeError, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError, TrySendError};

/// Insertion side of the engine's event queue.
///
/// Implementations must keep events in call order and never coalesce,
/// filter or drop them.
pub trait EventSink: Send + Sync {
    /// Append one event.
    fn post_event(&self, event: InputEvent) -> Result<()>;
}

/// Channel-backed engine event queue.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: Sender<InputEvent>,
    rx: Receiver<InputEvent>,
}

impl EventQueue {
    /// Create a queue. `capacity == 0` means unbounded.
    ///
    /// A bounded queue blocks posting threads while full rather than
    /// dropping events.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = if capacity == 0 {
            unbounded()
        } else {
            bounded(capacity)
        };
        Self { tx, rx }
    }

    /// Unbounded queue.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Take the next event, if any.
    pub fn try_next(&self) -> Option<InputEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drain all pending events in arrival order.
    pub fn drain(&self) -> Vec<InputEvent> {
        let mut events = Vec::with_capacity(self.rx.len());
        self.drain_into(&mut events);
        events
    }

    /// Drain all pending events into `out`, returning how many were added.
    pub fn drain_into(&self, out: &mut Vec<InputEvent>) -> usize {
        let before = out.len();
        out.extend(self.rx.try_iter());
        out.len() - before
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no events are pending.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl EventSink for EventQueue {
    fn post_event(&self, event: InputEvent) -> Result<()> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                self.tx.send(event).map_err(|_| BridgeError::QueueClosed)
            }
            Err(TrySendError::Disconnected(_)) => Err(BridgeError::QueueClosed),
        }
    }
}
