//! Periodic sync timer
//!
//! `AutoSync` owns a background task that sends a `Tick` every interval.
//! The owner of the `Library` receives ticks and runs the sync itself, so
//! the timer never touches quote state. Ticks carry the generation of the
//! timer that produced them; ticks from a stopped or replaced timer are
//! stale and should be dropped with `is_current`.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Signal that a sync is due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    generation: u64,
}

/// Handle to the periodic sync timer
pub struct AutoSync {
    tick_tx: mpsc::Sender<Tick>,
    generation: u64,
    interval: Option<Duration>,
    task: Option<JoinHandle<()>>,
}

impl AutoSync {
    /// Create a stopped timer and the receiver its ticks arrive on
    pub fn new() -> (Self, mpsc::Receiver<Tick>) {
        // A pending tick already means "sync soon"; extra ones are dropped
        let (tick_tx, tick_rx) = mpsc::channel(1);
        let auto = Self {
            tick_tx,
            generation: 0,
            interval: None,
            task: None,
        };
        (auto, tick_rx)
    }

    /// Start ticking every `interval`, replacing any running timer
    ///
    /// The first tick fires one interval from now. Must be called from
    /// within a tokio runtime.
    pub fn start(&mut self, interval: Duration) {
        self.stop();
        self.generation += 1;
        self.interval = Some(interval);

        let generation = self.generation;
        let tick_tx = self.tick_tx.clone();
        self.task = Some(tokio::spawn(tick_loop(interval, generation, tick_tx)));
        debug!(generation, interval_secs = interval.as_secs_f64(), "auto sync started");
    }

    /// Stop the timer; returns false if it was not running
    pub fn stop(&mut self) -> bool {
        self.interval = None;
        match self.task.take() {
            Some(task) => {
                task.abort();
                // Ticks already queued by this timer become stale
                self.generation += 1;
                debug!("auto sync stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Interval of the running timer
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Whether `tick` came from the timer that is running now
    pub fn is_current(&self, tick: &Tick) -> bool {
        self.is_running() && tick.generation == self.generation
    }
}

impl Drop for AutoSync {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn tick_loop(period: Duration, generation: u64, tick_tx: mpsc::Sender<Tick>) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        match tick_tx.try_send(Tick { generation }) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_tick_arrives_after_interval() {
        let (mut auto, mut rx) = AutoSync::new();
        assert!(!auto.is_running());

        auto.start(PERIOD);
        assert!(auto.is_running());
        assert_eq!(auto.interval(), Some(PERIOD));

        let tick = time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(auto.is_current(&tick));
    }

    #[tokio::test]
    async fn test_stop_marks_ticks_stale() {
        let (mut auto, mut rx) = AutoSync::new();
        auto.start(PERIOD);

        let tick = time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(auto.stop());
        assert!(!auto.stop());
        assert!(!auto.is_current(&tick));
        assert_eq!(auto.interval(), None);
    }

    #[tokio::test]
    async fn test_no_ticks_after_stop() {
        let (mut auto, mut rx) = AutoSync::new();
        auto.start(PERIOD);
        auto.stop();

        // Drain anything sent before the abort took effect
        while rx.try_recv().is_ok() {}
        let next = time::timeout(PERIOD * 5, rx.recv()).await;
        assert!(next.is_err());
    }

    #[tokio::test]
    async fn test_restart_replaces_previous_timer() {
        let (mut auto, mut rx) = AutoSync::new();
        auto.start(PERIOD);
        let first = time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();

        auto.start(PERIOD * 2);
        assert!(!auto.is_current(&first));
        assert_eq!(auto.interval(), Some(PERIOD * 2));

        // Skip any tick left over from the first timer
        let current = loop {
            let tick = time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            if auto.is_current(&tick) {
                break tick;
            }
        };
        assert!(auto.is_current(&current));
    }
}
