//! Event broadcast to external subscribers.
//!
//! Subscribers receive every committed state delta on an unbounded channel;
//! a dropped receiver is pruned on the next emit. Emission happens after
//! the mutation it describes has committed, under the same pool lock, so a
//! subscriber observes events for one pool in commit order.

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::trace;
use types::EngineEvent;

/// Fan-out of [`EngineEvent`] values to any number of subscribers.
#[derive(Debug, Default)]
pub struct EventBroadcaster {
    subscribers: Mutex<Vec<Sender<EngineEvent>>>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber and returns its receiving end.
    pub fn subscribe(&self) -> Receiver<EngineEvent> {
        let (sender, receiver) = unbounded();
        self.subscribers.lock().push(sender);
        receiver
    }

    pub(crate) fn emit(&self, event: EngineEvent) {
        trace!(?event, "engine event");
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
