//! Background ticking for a [`TimerModel`]

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::model::{TimerEvent, TimerMode, TimerModel, TICK_MS};

/// Drives a shared timer once per second on a tokio task
///
/// The task is aborted when the driver is stopped or dropped.
pub struct TimerDriver {
    model: Arc<RwLock<TimerModel>>,
    handle: JoinHandle<()>,
}

impl TimerDriver {
    /// Start ticking `model`; `on_complete` runs each time a countdown reaches zero
    pub fn spawn<F>(model: TimerModel, on_complete: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let model = Arc::new(RwLock::new(model));
        let shared = model.clone();

        let handle = tokio::spawn(async move {
            let period = Duration::from_millis(TICK_MS);
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let event = shared.write().await.tick();
                if event == Some(TimerEvent::Completed) {
                    tracing::info!("Writing time is up");
                    on_complete();
                }
            }
        });

        Self { model, handle }
    }

    /// Copy of the current model
    pub async fn snapshot(&self) -> TimerModel {
        self.model.read().await.clone()
    }

    pub async fn start(&self) {
        self.model.write().await.start();
    }

    pub async fn pause(&self) {
        self.model.write().await.pause();
    }

    pub async fn reset(&self) {
        self.model.write().await.reset();
    }

    pub async fn set_mode(&self, mode: TimerMode) {
        self.model.write().await.set_mode(mode);
    }

    pub async fn set_duration(&self, minutes: u32) -> bool {
        self.model.write().await.set_duration(minutes)
    }

    /// Stop ticking and hand back the final model
    pub async fn stop(self) -> TimerModel {
        self.handle.abort();
        self.model.read().await.clone()
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_countdown_fires_completion_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let mut model = TimerModel::countdown(1);
        model.start();

        let driver = TimerDriver::spawn(model, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(30_500)).await;
        assert_eq!(driver.snapshot().await.remaining_ms(), 30_000);

        tokio::time::sleep(Duration::from_secs(90)).await;
        let last = driver.stop().await;
        assert_eq!(last.remaining_ms(), 0);
        assert!(!last.is_running());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_driver_holds_time() {
        let driver = TimerDriver::spawn(TimerModel::stopwatch(), || {});
        driver.start().await;
        tokio::time::sleep(Duration::from_millis(3500)).await;
        driver.pause().await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(driver.snapshot().await.elapsed_ms(), 3000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_ticking() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let mut model = TimerModel::countdown(1);
        model.start();

        let driver = TimerDriver::spawn(model, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(driver);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
