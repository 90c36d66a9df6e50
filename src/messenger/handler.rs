//! # MessagesHandler: owner of the named pipes.
//!
//! ```text
//! get_pipe("RESOURCES") ─┐
//! get_pipe("<exec-id>") ─┼─► pipes: { name → Arc<Pipe> }
//!                        │          ▲
//!   Pipe::disable() ──► PipeEvent::Disabled ──► forget(name)
//!
//! changes(["RESOURCES", "<exec-id>"], filter)
//!   └─► one queue joined to both pipes ─► Changes stream
//! ```
//!
//! ## Rules
//! - `get_pipe` creates on first use and returns the same pipe afterwards.
//! - A disabled pipe is removed from the handler; a later `get_pipe` with the
//!   same name creates a fresh pipe.
//! - `changes` fails if any requested name is unknown.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::error::MessengerError;
use super::message::MsgType;
use super::pipe::Pipe;
use super::stream::Changes;
use crate::events::{Observer, PipeEvent};

type Pipes = Arc<RwLock<HashMap<String, Arc<Pipe>>>>;

/// Registry of named pipes and entry point for subscriptions.
pub struct MessagesHandler {
    handle: Handle,
    pipes: Pipes,
    events: Arc<Observer<PipeEvent, String>>,
}

impl MessagesHandler {
    /// Creates an empty handler spawning pipe workers on `handle`.
    pub fn new(handle: Handle) -> Arc<Self> {
        let pipes: Pipes = Arc::new(RwLock::new(HashMap::new()));
        let events = Arc::new(Observer::new(handle.clone()));

        let registry = pipes.clone();
        events.subscribe(PipeEvent::Disabled, move |name: String| {
            let registry = registry.clone();
            async move {
                forget(&registry, &name);
                Ok(())
            }
        });

        Arc::new(Self {
            handle,
            pipes,
            events,
        })
    }

    /// Returns the pipe called `name`, creating it if needed.
    pub fn get_pipe(&self, name: &str) -> Arc<Pipe> {
        if let Some(pipe) = self.pipes.read().get(name) {
            return pipe.clone();
        }
        let mut pipes = self.pipes.write();
        pipes
            .entry(name.to_string())
            .or_insert_with(|| Pipe::new(name, &self.handle, self.events.clone()))
            .clone()
    }

    /// Disables the pipe called `name`; unknown names are ignored.
    pub async fn disable_pipe(&self, name: &str) {
        let pipe = self.pipes.read().get(name).cloned();
        if let Some(pipe) = pipe {
            pipe.disable().await;
            forget(&self.pipes, name);
        }
    }

    /// Names of the live pipes, sorted.
    pub fn available_pipes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pipes.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Subscribes one queue to every pipe in `names`.
    ///
    /// With a `filter`, only messages of the listed types are yielded.
    /// A name listed more than once is joined once.
    pub async fn changes(
        &self,
        names: &[&str],
        filter: Option<HashSet<MsgType>>,
    ) -> Result<Changes, MessengerError> {
        let pipes = {
            let live = self.pipes.read();
            let mut joined = HashSet::new();
            names
                .iter()
                .filter(|name| joined.insert(**name))
                .map(|name| {
                    live.get(*name)
                        .cloned()
                        .ok_or_else(|| MessengerError::UnknownPipe {
                            name: (*name).to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let key = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        for pipe in &pipes {
            pipe.add_stream(key, tx.clone()).await;
        }
        Ok(Changes::new(key, rx, filter, pipes, self.handle.clone()))
    }
}

fn forget(pipes: &Pipes, name: &str) {
    let mut pipes = pipes.write();
    if pipes.get(name).is_some_and(|pipe| pipe.is_disabled()) {
        pipes.remove(name);
    }
}
