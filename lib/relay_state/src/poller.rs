use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{Error, Observer, Result};

/// Named repeating fetches, at most one timer per name.
///
/// A timer runs its task right away and then once per period. Every run is
/// spawned on its own, so a failing or hanging run never holds back the
/// schedule, and stopping a timer leaves runs already in flight alone.
pub struct Poller {
    timers: Mutex<HashMap<String, JoinHandle<()>>>,
    observer: Arc<dyn Observer>,
}

impl Poller {
    pub fn new(observer: Arc<dyn Observer>) -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
            observer,
        }
    }

    /// Starts `name`, replacing the timer already running under that name.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F, Fut>(&self, name: &str, period: Duration, task: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if period.is_zero() {
            return Err(Error::ZeroInterval(name.to_string()));
        }

        let mut timers = self.lock();

        if let Some(previous) = timers.remove(name) {
            debug!("[{name}] restarting");
            previous.abort();
        }

        let observer = self.observer.clone();
        let poller = name.to_string();

        let timer = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                let run = task();
                let observer = observer.clone();
                let poller = poller.clone();

                tokio::spawn(async move {
                    if let Err(err) = run.await {
                        error!("[{poller}] {err}");
                        observer.poll_failed(&poller, &err);
                    }
                });
            }
        });

        debug!("[{name}] polling every {period:?}");
        timers.insert(name.to_string(), timer);

        Ok(())
    }

    /// Cancels the timer of `name`. No-op when it is not running.
    pub fn stop(&self, name: &str) {
        if let Some(timer) = self.lock().remove(name) {
            debug!("[{name}] stopped");
            timer.abort();
        }
    }

    pub fn stop_all(&self) {
        for (name, timer) in self.lock().drain() {
            debug!("[{name}] stopped");
            timer.abort();
        }
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.lock()
            .get(name)
            .is_some_and(|timer| !timer.is_finished())
    }

    pub(crate) fn observer(&self) -> Arc<dyn Observer> {
        self.observer.clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop_all();
    }
}
