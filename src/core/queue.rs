//! FIFO intake of actions.
//!
//! Producers never block: `enqueue` pushes onto an unbounded channel.
//! Workers take turns on the receiving end through [`Intake`], a lock that
//! hands actions out strictly in the order they were enqueued.
//!
//! Admission is where timer-originated actions are suppressed: while a
//! user-initiated conversation is in flight, `Tick` and `Timer` are refused
//! at the door, whatever the number of idle workers.

use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use tokio::sync::{Mutex, MutexGuard, mpsc, watch};

use crate::core::action::Action;
use crate::error::EngineError;

pub struct ActionQueue {
    tx: mpsc::UnboundedSender<Action>,
    rx: Mutex<mpsc::UnboundedReceiver<Action>>,
    closed: watch::Sender<bool>,
    user_in_flight: AtomicBool,
}

impl ActionQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            closed: watch::Sender::new(false),
            user_in_flight: AtomicBool::new(false),
        }
    }

    /// Appends `action`. Fails only once the queue has been closed.
    /// A suppressed automatic action is not an error.
    pub fn enqueue(&self, action: Action) -> Result<(), EngineError> {
        if self.is_closed() {
            debug!("Dropping {:?}: queue closed", action);
            return Err(EngineError::ShutdownInProgress);
        }
        if action.is_automatic() && self.user_in_flight.load(Ordering::SeqCst) {
            debug!("Suppressing {:?}: a user conversation is in flight", action);
            return Ok(());
        }
        self.tx
            .send(action)
            .map_err(|_| EngineError::ShutdownInProgress)
    }

    /// Wakes every waiting worker; all later dequeues return `None`.
    /// Actions still pending are discarded.
    pub fn close(&self) {
        if !self.closed.send_replace(true) {
            debug!("Action queue closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Marks the start or end of a user-initiated conversation.
    pub fn set_user_in_flight(&self, in_flight: bool) {
        self.user_in_flight.store(in_flight, Ordering::SeqCst);
    }

    /// Takes exclusive access to the receiving end. Whoever holds the intake
    /// decides what happens to the next action before anyone else sees one.
    pub async fn intake(&self) -> Intake<'_> {
        Intake {
            rx: self.rx.lock().await,
            closed: self.closed.subscribe(),
        }
    }

    /// Waits for the next action, or `None` once the queue is closed.
    pub async fn dequeue(&self) -> Option<Action> {
        self.intake().await.next().await
    }
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Intake<'a> {
    rx: MutexGuard<'a, mpsc::UnboundedReceiver<Action>>,
    closed: watch::Receiver<bool>,
}

impl Intake<'_> {
    pub async fn next(&mut self) -> Option<Action> {
        if *self.closed.borrow() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.closed.wait_for(|closed| *closed) => None,
            action = self.rx.recv() => action,
        }
    }
}
