//! Periodic refresh: enqueues `Action::Tick` every interval until stopped.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::core::action::Action;
use crate::core::queue::ActionQueue;

pub struct Ticker {
    period: Duration,
    cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Starts ticking on the current runtime. The first tick fires one full
    /// `period` from now. Returns `None` for a zero period.
    pub fn spawn(queue: Arc<ActionQueue>, period: Duration) -> Option<Self> {
        if period.is_zero() {
            return None;
        }
        let (cancel, mut cancelled) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
            // A stalled runtime should not burst a backlog of ticks into the queue.
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancelled => break,
                    _ = ticks.tick() => {
                        if queue.enqueue(Action::Tick).is_err() {
                            debug!("Ticker stopping: queue closed");
                            break;
                        }
                    }
                }
            }
        });
        info!("Ticker started, period {:?}", period);
        Some(Self {
            period,
            cancel,
            handle,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Cancels the timer and waits for its task to finish. Once this returns,
    /// no further tick is enqueued.
    pub async fn stop(self) {
        let _ = self.cancel.send(());
        let _ = self.handle.await;
        info!("Ticker stopped");
    }

    /// Cancels without waiting; for teardown paths that cannot await.
    pub fn abort(self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tick_count_matches_elapsed_periods() {
        let queue = Arc::new(ActionQueue::new());
        let ticker = Ticker::spawn(queue.clone(), Duration::from_secs(10)).unwrap();

        tokio::time::sleep(Duration::from_secs(35)).await;
        ticker.stop().await;

        let mut ticks = 0;
        while let Ok(Some(action)) =
            tokio::time::timeout(Duration::from_millis(1), queue.dequeue()).await
        {
            assert_eq!(action, Action::Tick);
            ticks += 1;
        }
        assert_eq!(ticks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_enqueued_after_stop() {
        let queue = Arc::new(ActionQueue::new());
        let ticker = Ticker::spawn(queue.clone(), Duration::from_secs(1)).unwrap();
        ticker.stop().await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        let next = tokio::time::timeout(Duration::from_millis(1), queue.dequeue()).await;
        assert!(next.is_err(), "unexpected action after stop: {next:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_itself_when_queue_closes() {
        let queue = Arc::new(ActionQueue::new());
        let ticker = Ticker::spawn(queue.clone(), Duration::from_secs(1)).unwrap();
        queue.close();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(ticker.handle.is_finished());
    }

    #[tokio::test]
    async fn test_zero_period_is_rejected() {
        let queue = Arc::new(ActionQueue::new());
        assert!(Ticker::spawn(queue, Duration::ZERO).is_none());
    }
}
