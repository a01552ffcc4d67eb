//! # Dispatcher
//!
//! A fixed pool of workers draining the [`ActionQueue`].
//!
//! ```text
//!            ┌──────────── intake lock ────────────┐
//! worker ──▶ │ next action                         │
//!            │   Details    → republish locally    │
//!            │   otherwise  → take gate,           │
//!            │                busy = true          │
//!            └─────────────────────────────────────┘
//!                 │ conversation with AuthProvider
//!                 ▼
//!            publish log/flux, busy = false, release gate
//! ```
//!
//! The in-flight gate is taken while the intake is still held, so portal
//! conversations start in exactly the order their actions were enqueued and
//! never overlap. Workers beyond the first only buy overlap with local work.
//! An action still waiting for the gate when the queue closes never starts.
//!
//! While a user-initiated conversation runs, the queue refuses `Tick` and
//! `Timer` (see [`ActionQueue::set_user_in_flight`]). A running automatic
//! refresh does not hold later ticks back.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

use crate::auth::{AuthProvider, ConnectionMode};
use crate::core::action::{Action, UpdateMsg};
use crate::core::notify::{Notification, NotificationBus};
use crate::core::queue::ActionQueue;
use crate::core::state::StateStore;

pub const LOGGING_IN: &str = "logging in";
pub const LOGGING_OUT: &str = "logging out";
pub const LOGIN_SUCCEEDED: &str = "login succeeded";
pub const LOGOUT_SUCCEEDED: &str = "logout succeeded";
pub const REFRESHED: &str = "refreshed";

pub struct Dispatcher {
    queue: Arc<ActionQueue>,
    store: Arc<StateStore>,
    bus: Arc<NotificationBus>,
    provider: Arc<dyn AuthProvider>,
    gate: Arc<Mutex<()>>,
}

/// Holds the gate and the busy flag for one conversation. Dropping it clears
/// the flag before releasing the gate, even if the conversation panicked.
struct InFlight {
    queue: Arc<ActionQueue>,
    store: Arc<StateStore>,
    bus: Arc<NotificationBus>,
    user: bool,
    _gate: OwnedMutexGuard<()>,
}

impl InFlight {
    fn begin(dispatcher: &Dispatcher, action: Action, gate: OwnedMutexGuard<()>) -> Self {
        let user = !action.is_automatic();
        if user {
            dispatcher.queue.set_user_in_flight(true);
        }
        dispatcher.store.set_busy(true);
        dispatcher.bus.publish(Notification::BusyChanged(true));
        Self {
            queue: dispatcher.queue.clone(),
            store: dispatcher.store.clone(),
            bus: dispatcher.bus.clone(),
            user,
            _gate: gate,
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.user {
            self.queue.set_user_in_flight(false);
        }
        self.store.set_busy(false);
        self.bus.publish(Notification::BusyChanged(false));
    }
}

/// What a portal action asks of the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversation {
    Login,
    Logout,
    RefreshFlux,
    RefreshOnline,
}

enum Job {
    Details,
    Portal {
        action: Action,
        conversation: Conversation,
        mode: ConnectionMode,
        in_flight: InFlight,
    },
}

impl Dispatcher {
    pub fn new(
        queue: Arc<ActionQueue>,
        store: Arc<StateStore>,
        bus: Arc<NotificationBus>,
        provider: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            queue,
            store,
            bus,
            provider,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Spawns `workers` worker loops on the current runtime.
    pub fn spawn(self: Arc<Self>, workers: usize) -> Vec<JoinHandle<()>> {
        info!(
            "Starting {} workers against provider '{}'",
            workers,
            self.provider.name()
        );
        (0..workers)
            .map(|id| tokio::spawn(self.clone().run_worker(id)))
            .collect()
    }

    async fn run_worker(self: Arc<Self>, id: usize) {
        debug!("Worker {} started", id);
        while let Some(job) = self.next_job().await {
            match job {
                Job::Details => {
                    debug!("Worker {} republishing details", id);
                    self.publish(&[UpdateMsg::Details]);
                }
                Job::Portal {
                    action,
                    conversation,
                    mode,
                    in_flight,
                } => {
                    debug!("Worker {} running {:?} (mode {})", id, action, mode);
                    // Run on its own task so a panicking provider cannot take the worker down.
                    let this = self.clone();
                    let outcome =
                        tokio::spawn(async move { this.perform(conversation, mode).await }).await;
                    match outcome {
                        Ok(updates) => self.publish(&updates),
                        Err(e) => {
                            warn!("{:?} aborted: {}", action, e);
                            self.store.set_log(format!("internal error: {e}"));
                            self.publish(&[UpdateMsg::Log]);
                        }
                    }
                    drop(in_flight);
                }
            }
        }
        debug!("Worker {} stopped", id);
    }

    /// Takes the next action off the queue and decides how it runs.
    /// `None` once the queue is closed.
    async fn next_job(&self) -> Option<Job> {
        let mut intake = self.queue.intake().await;
        let action = intake.next().await?;
        let conversation = match action {
            Action::Details => return Some(Job::Details),
            Action::Login => Conversation::Login,
            Action::Logout => Conversation::Logout,
            Action::Flux | Action::Tick | Action::Timer => Conversation::RefreshFlux,
            Action::Online => Conversation::RefreshOnline,
        };
        let gate = self.gate.clone().lock_owned().await;
        if self.queue.is_closed() {
            debug!("Dropping {:?}: queue closed while waiting for the gate", action);
            return None;
        }
        // The mode is read once here; later changes apply to later actions.
        let mode = self.store.mode();
        let in_flight = InFlight::begin(self, action, gate);
        Some(Job::Portal {
            action,
            conversation,
            mode,
            in_flight,
        })
    }

    /// One conversation with the portal. Failures end up in the log text and
    /// leave flux and mode at their last known good values.
    async fn perform(&self, conversation: Conversation, mode: ConnectionMode) -> Vec<UpdateMsg> {
        match conversation {
            Conversation::Login => self.login(mode).await,
            Conversation::Logout => self.logout().await,
            Conversation::RefreshFlux => self.refresh_flux().await,
            Conversation::RefreshOnline => self.refresh_online().await,
        }
    }

    async fn login(&self, mode: ConnectionMode) -> Vec<UpdateMsg> {
        self.store.set_log(LOGGING_IN);
        self.publish(&[UpdateMsg::Log]);
        match self.provider.login(mode).await {
            Ok(msg) => {
                info!("Login succeeded (mode {})", mode);
                self.store.set_log(or_default(msg, LOGIN_SUCCEEDED));
                // Refresh inside the same conversation, keeping the login message.
                match self.provider.query_flux().await {
                    Ok(flux) => {
                        self.store.set_flux(flux);
                        vec![UpdateMsg::Log, UpdateMsg::Flux]
                    }
                    Err(e) => {
                        warn!("Flux refresh after login failed: {}", e);
                        self.store.set_log(e.to_string());
                        vec![UpdateMsg::Log]
                    }
                }
            }
            Err(e) => {
                warn!("Login failed (mode {}): {}", mode, e);
                self.store.set_log(e.to_string());
                vec![UpdateMsg::Log]
            }
        }
    }

    async fn logout(&self) -> Vec<UpdateMsg> {
        self.store.set_log(LOGGING_OUT);
        self.publish(&[UpdateMsg::Log]);
        match self.provider.logout().await {
            Ok(msg) => {
                info!("Logout succeeded");
                self.store.set_log(or_default(msg, LOGOUT_SUCCEEDED));
                self.store.set_flux(Default::default());
                vec![UpdateMsg::Log, UpdateMsg::Flux]
            }
            Err(e) => {
                warn!("Logout failed: {}", e);
                self.store.set_log(e.to_string());
                vec![UpdateMsg::Log]
            }
        }
    }

    async fn refresh_flux(&self) -> Vec<UpdateMsg> {
        match self.provider.query_flux().await {
            Ok(flux) => {
                debug!("Flux refreshed for '{}'", flux.username);
                self.store.set_flux(flux);
                self.store.set_log(REFRESHED);
                vec![UpdateMsg::Log, UpdateMsg::Flux]
            }
            Err(e) => {
                warn!("Flux query failed: {}", e);
                self.store.set_log(e.to_string());
                vec![UpdateMsg::Log]
            }
        }
    }

    async fn refresh_online(&self) -> Vec<UpdateMsg> {
        match self.provider.query_online().await {
            Ok(online) => {
                let flux = self.store.flux().with_online(&online);
                self.store.set_flux(flux);
                vec![UpdateMsg::Online]
            }
            Err(e) => {
                warn!("Online query failed: {}", e);
                self.store.set_log(e.to_string());
                vec![UpdateMsg::Log]
            }
        }
    }

    fn publish(&self, updates: &[UpdateMsg]) {
        for update in updates {
            match update {
                UpdateMsg::Log => self.bus.publish(Notification::LogChanged(self.store.log())),
                UpdateMsg::Flux | UpdateMsg::Online => {
                    self.bus.publish(Notification::FluxChanged(self.store.flux()))
                }
                UpdateMsg::Details => {
                    let snapshot = self.store.snapshot();
                    self.bus.publish(Notification::LogChanged(snapshot.log));
                    self.bus.publish(Notification::FluxChanged(snapshot.flux));
                    self.bus.publish(Notification::StateChanged(snapshot.mode));
                }
            }
        }
    }
}

fn or_default(msg: String, default: &str) -> String {
    if msg.trim().is_empty() {
        default.to_string()
    } else {
        msg
    }
}
