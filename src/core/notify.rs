//! Change notifications fanned out to observers.
//!
//! Each subscriber owns an unbounded receiver and drains it in its own
//! execution context (a UI thread, a task, a test). Nothing is coalesced or
//! dropped: every change reaches every live subscriber of its channel, in
//! the order it was published.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use log::debug;
use tokio::sync::mpsc;

use crate::auth::{ConnectionMode, NetFlux};

/// The four independent change channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Log,
    Flux,
    State,
    Busy,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Log, Channel::Flux, Channel::State, Channel::Busy];
}

/// A change, carrying a copy of the new value.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    LogChanged(String),
    FluxChanged(NetFlux),
    StateChanged(ConnectionMode),
    BusyChanged(bool),
}

impl Notification {
    pub fn channel(&self) -> Channel {
        match self {
            Notification::LogChanged(_) => Channel::Log,
            Notification::FluxChanged(_) => Channel::Flux,
            Notification::StateChanged(_) => Channel::State,
            Notification::BusyChanged(_) => Channel::Busy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    channels: Vec<Channel>,
    tx: mpsc::UnboundedSender<Notification>,
}

#[derive(Default)]
pub struct NotificationBus {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn subscribers(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, channels: &[Channel]) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers().push(Subscriber {
            id,
            channels: channels.to_vec(),
            tx,
        });
        debug!("Subscriber {:?} attached to {:?}", id, channels);
        Subscription { id, rx }
    }

    pub fn subscribe_all(&self) -> Subscription {
        self.subscribe(&Channel::ALL)
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        if removed {
            debug!("Subscriber {:?} detached", id);
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    /// Delivers `notification` to every subscriber of its channel. Subscribers
    /// whose receiver is gone are pruned on the way.
    pub fn publish(&self, notification: Notification) {
        let channel = notification.channel();
        self.subscribers().retain(|s| {
            if !s.channels.contains(&channel) {
                return !s.tx.is_closed();
            }
            let alive = s.tx.send(notification.clone()).is_ok();
            if !alive {
                debug!("Subscriber {:?} dropped, pruning", s.id);
            }
            alive
        });
    }
}

/// The receiving end of a subscription. Dropping it detaches the observer.
pub struct Subscription {
    id: SubscriptionId,
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next notification. `None` once the bus is gone or the
    /// subscription was removed.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// For observers living on a plain thread.
    pub fn blocking_recv(&mut self) -> Option<Notification> {
        self.rx.blocking_recv()
    }

    pub fn try_recv(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }

    /// Everything delivered so far, without waiting.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
