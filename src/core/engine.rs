//! # Engine
//!
//! The owned engine instance handed to the presentation layer. Constructed
//! once at startup, torn down once with [`Engine::shutdown`].
//!
//! ```text
//!  producers ──enqueue──▶ ActionQueue ──▶ Dispatcher (N workers) ──▶ AuthProvider
//!      ▲                       ▲                 │
//!      │                    Ticker               ▼
//!  Subscription ◀──── NotificationBus ◀──── StateStore
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::auth::{AuthProvider, ConnectionMode};
use crate::core::action::Action;
use crate::core::config::{DEFAULT_WORKERS, ResolvedConfig};
use crate::core::dispatch::Dispatcher;
use crate::core::notify::{Channel, Notification, NotificationBus, Subscription, SubscriptionId};
use crate::core::queue::ActionQueue;
use crate::core::state::{Snapshot, StateStore};
use crate::core::ticker::Ticker;
use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub workers: usize,
    /// Starts the ticker right away when set.
    pub tick_interval: Option<Duration>,
    pub mode: ConnectionMode,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            tick_interval: None,
            mode: ConnectionMode::Auto,
        }
    }
}

impl From<&ResolvedConfig> for EngineSettings {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            workers: config.workers,
            tick_interval: config.tick_interval,
            mode: config.mode,
        }
    }
}

pub struct Engine {
    queue: Arc<ActionQueue>,
    store: Arc<StateStore>,
    bus: Arc<NotificationBus>,
    workers: Vec<JoinHandle<()>>,
    ticker: Mutex<Option<Ticker>>,
}

impl Engine {
    /// Builds the engine and starts its workers on the current tokio runtime.
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        settings: EngineSettings,
    ) -> Result<Self, EngineError> {
        Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        if settings.workers == 0 {
            return Err(EngineError::InvalidThreadCount(settings.workers));
        }

        let queue = Arc::new(ActionQueue::new());
        let store = Arc::new(StateStore::new(settings.mode));
        let bus = Arc::new(NotificationBus::new());
        let dispatcher = Arc::new(Dispatcher::new(
            queue.clone(),
            store.clone(),
            bus.clone(),
            provider,
        ));
        let workers = dispatcher.spawn(settings.workers);
        let ticker = settings
            .tick_interval
            .and_then(|period| Ticker::spawn(queue.clone(), period));

        info!(
            "Engine started: {} workers, mode {}, ticker {}",
            settings.workers,
            settings.mode,
            if ticker.is_some() { "on" } else { "off" }
        );
        Ok(Self {
            queue,
            store,
            bus,
            workers,
            ticker: Mutex::new(ticker),
        })
    }

    pub fn from_config(
        provider: Arc<dyn AuthProvider>,
        config: &ResolvedConfig,
    ) -> Result<Self, EngineError> {
        Self::new(provider, EngineSettings::from(config))
    }

    fn ticker(&self) -> MutexGuard<'_, Option<Ticker>> {
        self.ticker.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self, channels: &[Channel]) -> Subscription {
        self.bus.subscribe(channels)
    }

    pub fn subscribe_all(&self) -> Subscription {
        self.bus.subscribe_all()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Never blocks and never fails. Once shutdown has begun the action is
    /// dropped.
    pub fn enqueue(&self, action: Action) {
        if let Err(e) = self.queue.enqueue(action) {
            debug!("enqueue {:?} ignored: {}", action, e);
        }
    }

    /// Records the mode for every action that starts from now on. An action
    /// already in flight keeps the mode it started with. No portal call is
    /// made; follow up with `Login` or `Flux` to apply it.
    pub fn set_mode(&self, mode: ConnectionMode) {
        if self.store.set_mode(mode) {
            info!("Connection mode set to {}", mode);
            self.bus.publish(Notification::StateChanged(mode));
        }
    }

    /// Replaces any running ticker with one firing every `period`.
    /// Returns `false` for a zero period, which leaves the ticker stopped.
    pub async fn start_ticker(&self, period: Duration) -> bool {
        let Some(ticker) = Ticker::spawn(self.queue.clone(), period) else {
            warn!("Refusing to start a ticker with a zero period");
            self.stop_ticker().await;
            return false;
        };
        // Whatever ticker this replaces is stopped, never dropped.
        let replaced = self.ticker().replace(ticker);
        if let Some(replaced) = replaced {
            replaced.stop().await;
        }
        true
    }

    /// Returns `true` if a ticker was running. No tick is enqueued after this
    /// returns.
    pub async fn stop_ticker(&self) -> bool {
        let ticker = self.ticker().take();
        match ticker {
            Some(ticker) => {
                ticker.stop().await;
                true
            }
            None => false,
        }
    }

    pub fn ticker_period(&self) -> Option<Duration> {
        self.ticker().as_ref().map(Ticker::period)
    }

    /// Stops the ticker, closes the queue and waits for the workers. An
    /// action already in flight runs to completion; pending ones are dropped.
    pub async fn shutdown(mut self) {
        info!("Engine shutting down");
        self.stop_ticker().await;
        self.queue.close();
        for worker in std::mem::take(&mut self.workers) {
            if let Err(e) = worker.await {
                warn!("Worker ended abnormally: {}", e);
            }
        }
        info!("Engine stopped");
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.queue.close();
        if let Some(ticker) = self.ticker().take() {
            ticker.abort();
        }
    }
}
