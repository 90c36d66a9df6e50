//! # Execution run state.
//!
//! ```text
//! STOPPED ──run()──► RUN ◄──toggle_pause()──► PAUSED
//!                     │                         │
//!                     └──────── stop() ─────────┴──► STOPPED
//! ```
//!
//! Every transition is published as a `STATE` message on the execution's
//! pipe (`{"state": new, "old_state": old}`) while the state lock is held,
//! so the published order equals the transition order.

use std::sync::OnceLock;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::messenger::PipeStateFacade;

/// Run state of an execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutorState {
    #[default]
    #[serde(rename = "STOPPED")]
    Stopped,
    #[serde(rename = "RUN")]
    Running,
    #[serde(rename = "PAUSED")]
    Paused,
}

impl ExecutorState {
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecutorState::Stopped => "STOPPED",
            ExecutorState::Running => "RUN",
            ExecutorState::Paused => "PAUSED",
        }
    }
}

impl std::fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// State holder publishing its transitions.
#[derive(Debug, Default)]
pub struct StateMachine {
    state: Mutex<ExecutorState>,
    sender: OnceLock<PipeStateFacade>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the publisher; later calls are ignored.
    pub fn attach(&self, sender: PipeStateFacade) {
        let _ = self.sender.set(sender);
    }

    pub fn get(&self) -> ExecutorState {
        *self.state.lock()
    }

    /// Applies `f` to the current state.
    ///
    /// `f` returns the next state or `None` to leave it unchanged. Returns
    /// `(old, new)` when a transition happened.
    pub fn transition<F>(&self, f: F) -> Option<(ExecutorState, ExecutorState)>
    where
        F: FnOnce(ExecutorState) -> Option<ExecutorState>,
    {
        let mut state = self.state.lock();
        let old = *state;
        let new = f(old).filter(|next| *next != old)?;
        *state = new;
        if let Some(sender) = self.sender.get() {
            sender.send(Some(new.as_label()), Some(old.as_label()));
        }
        Some((old, new))
    }
}

/// Public description of an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorInfo {
    pub id: Uuid,
    pub suite_name: String,
    pub state: ExecutorState,
}
