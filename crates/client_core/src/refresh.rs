use std::{
    future::Future,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::debug;

/// Periodic background poll. Holds at most one task; starting while the
/// previous task is still live is a no-op, and dropping the handle
/// aborts the task.
#[derive(Default)]
pub struct RefreshTask {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Spawns the poll loop. The first tick fires immediately, then every
    /// `period`.
    pub fn start<F, Fut>(&self, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let mut guard = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("refresh task already running");
            return;
        }
        *guard = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                tick().await;
            }
        }));
    }

    pub fn stop(&self) {
        if let Some(handle) = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "tests/refresh_tests.rs"]
mod tests;
