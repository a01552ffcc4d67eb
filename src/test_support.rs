//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Semaphore, watch};

use crate::auth::{AuthError, AuthProvider, ConnectionMode, NetFlux, OnlineInfo};

/// One recorded provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Login(ConnectionMode),
    Logout,
    Flux,
    Online,
}

/// A provider whose answers are scripted up front.
///
/// Each `with_*` call queues one answer for that operation; once a queue runs
/// dry the operation succeeds with an empty/default value. A `held()`
/// provider parks every call until the test hands out permits via `release`.
pub struct ScriptedProvider {
    logins: Mutex<VecDeque<Result<String, AuthError>>>,
    logouts: Mutex<VecDeque<Result<String, AuthError>>>,
    fluxes: Mutex<VecDeque<Result<NetFlux, AuthError>>>,
    onlines: Mutex<VecDeque<Result<OnlineInfo, AuthError>>>,
    calls: Mutex<Vec<Call>>,
    started: watch::Sender<usize>,
    hold: Option<Semaphore>,
    delay: Option<Duration>,
    panic_on_logout: bool,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            logins: Mutex::default(),
            logouts: Mutex::default(),
            fluxes: Mutex::default(),
            onlines: Mutex::default(),
            calls: Mutex::default(),
            started: watch::Sender::new(0),
            hold: None,
            delay: None,
            panic_on_logout: false,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn with_login(self, result: Result<String, AuthError>) -> Self {
        self.logins.lock().unwrap().push_back(result);
        self
    }

    pub fn with_logout(self, result: Result<String, AuthError>) -> Self {
        self.logouts.lock().unwrap().push_back(result);
        self
    }

    pub fn with_flux(self, result: Result<NetFlux, AuthError>) -> Self {
        self.fluxes.lock().unwrap().push_back(result);
        self
    }

    pub fn with_online(self, result: Result<OnlineInfo, AuthError>) -> Self {
        self.onlines.lock().unwrap().push_back(result);
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every call waits for a permit from `release`.
    pub fn held(mut self) -> Self {
        self.hold = Some(Semaphore::new(0));
        self
    }

    pub fn panic_on_logout(mut self) -> Self {
        self.panic_on_logout = true;
        self
    }

    pub fn release(&self, calls: usize) {
        if let Some(hold) = &self.hold {
            hold.add_permits(calls);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Waits until at least `n` calls have started.
    pub async fn wait_for_calls(&self, n: usize) {
        let mut started = self.started.subscribe();
        tokio::time::timeout(Duration::from_secs(5), started.wait_for(|count| *count >= n))
            .await
            .expect("provider calls never started")
            .unwrap();
    }

    /// Highest number of calls that were ever running at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    async fn enter(&self, call: Call) -> ActiveGuard<'_> {
        self.calls.lock().unwrap().push(call);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        self.started.send_modify(|count| *count += 1);
        if let Some(hold) = &self.hold {
            hold.acquire().await.unwrap().forget();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        ActiveGuard(&self.active)
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn next<T>(queue: &Mutex<VecDeque<Result<T, AuthError>>>, default: T) -> Result<T, AuthError> {
    queue.lock().unwrap().pop_front().unwrap_or(Ok(default))
}

#[async_trait]
impl AuthProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn login(&self, mode: ConnectionMode) -> Result<String, AuthError> {
        let _active = self.enter(Call::Login(mode)).await;
        next(&self.logins, String::new())
    }

    async fn logout(&self) -> Result<String, AuthError> {
        let _active = self.enter(Call::Logout).await;
        if self.panic_on_logout {
            panic!("scripted logout panic");
        }
        next(&self.logouts, String::new())
    }

    async fn query_flux(&self) -> Result<NetFlux, AuthError> {
        let _active = self.enter(Call::Flux).await;
        next(&self.fluxes, NetFlux::default())
    }

    async fn query_online(&self) -> Result<OnlineInfo, AuthError> {
        let _active = self.enter(Call::Online).await;
        next(&self.onlines, OnlineInfo::default())
    }
}

/// A plausible usage report for `username`.
pub fn sample_flux(username: &str) -> NetFlux {
    NetFlux {
        username: username.to_string(),
        flux_bytes: 1_234_567_890,
        online_time: Duration::from_secs(3 * 3600 + 25),
        balance: 12.5,
    }
}
