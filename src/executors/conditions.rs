//! # Pause/stop checkpoints backed by a watch channel.
//!
//! ```text
//! control listener ── pause()/resume()/stop() ──► watch<Flags>
//! suite ── wait_if_paused() ──► wait_for(!paused || stopped)
//! suite ── stop_if_stopped() ──► Err(Stopped) once stopped
//! ```
//!
//! A stopped execution never blocks in `wait_if_paused`.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::suites::{StateConditionsFacade, SuiteError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Flags {
    paused: bool,
    stopped: bool,
}

/// Worker-side pause/stop state.
#[derive(Debug)]
pub struct StateConditions {
    flags: watch::Sender<Flags>,
}

impl Default for StateConditions {
    fn default() -> Self {
        Self::new()
    }
}

impl StateConditions {
    pub fn new() -> Self {
        Self {
            flags: watch::Sender::new(Flags::default()),
        }
    }

    pub fn pause(&self) {
        self.flags.send_modify(|f| f.paused = true);
    }

    pub fn resume(&self) {
        self.flags.send_modify(|f| f.paused = false);
    }

    pub fn stop(&self) {
        self.flags.send_modify(|f| f.stopped = true);
    }

    pub fn is_paused(&self) -> bool {
        self.flags.borrow().paused
    }

    pub fn is_stopped(&self) -> bool {
        self.flags.borrow().stopped
    }
}

#[async_trait]
impl StateConditionsFacade for StateConditions {
    async fn wait_if_paused(&self) {
        let mut rx = self.flags.subscribe();
        let _ = rx.wait_for(|f| !f.paused || f.stopped).await;
    }

    async fn stop_if_stopped(&self) -> Result<(), SuiteError> {
        if self.is_stopped() {
            return Err(SuiteError::Stopped);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_if_paused_blocks_until_resume() {
        let cond = Arc::new(StateConditions::new());
        cond.pause();

        let waiter = tokio::spawn({
            let cond = cond.clone();
            async move { cond.wait_if_paused().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        cond.resume();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_stop_releases_paused_waiters() {
        let cond = Arc::new(StateConditions::new());
        cond.pause();
        let waiter = tokio::spawn({
            let cond = cond.clone();
            async move { cond.wait_if_paused().await }
        });
        cond.stop();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cond.stop_if_stopped().await, Err(SuiteError::Stopped));
    }

    #[tokio::test]
    async fn test_not_stopped_passes_checkpoint() {
        let cond = StateConditions::new();
        assert!(cond.stop_if_stopped().await.is_ok());
        cond.wait_if_paused().await;
    }
}
