//! # Pipe: named fan-out channel with ordered shutdown
//!
//! A [`Pipe`] owns an unbounded FIFO queue and one worker task that moves
//! messages from the queue into every registered subscriber queue.
//!
//! ```text
//!  transmit() ──► [queue] ──► worker ──┬──► [subscriber k1]
//!                                      ├──► [subscriber k2]
//!                                      └──► [subscriber kN]
//! ```
//!
//! ## Rules
//! - `transmit()` never blocks; calling it after `disable()` is a caller bug
//!   and panics.
//! - Every subscriber receives messages in transmit order.
//! - `add_stream`/`free_stream` are serialized with the worker by one mutex.
//! - `disable()`: refuse input → drain queue → stop worker → send `None` to
//!   every subscriber → emit [`PipeEvent::Disabled`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::facade::{PipeFacade, PipeStateFacade};
use super::message::{Message, MsgType};
use crate::events::{Observer, PipeEvent};

/// Token identifying one subscription across all pipes it joined.
pub type StreamKey = Uuid;

/// Subscriber side of the fan-out; `None` tells the listener to stop.
pub type StreamSender = mpsc::UnboundedSender<Option<Arc<Message>>>;

type Streams = Arc<Mutex<HashMap<StreamKey, StreamSender>>>;

enum PipeCommand {
    Deliver(Arc<Message>),
    Drain(oneshot::Sender<()>),
}

/// Named message channel fanning out to subscriber queues.
pub struct Pipe {
    name: String,
    queue: mpsc::UnboundedSender<PipeCommand>,
    streams: Streams,
    disabled: AtomicBool,
    worker: parking_lot::Mutex<Option<JoinHandle<()>>>,
    events: Arc<Observer<PipeEvent, String>>,
}

impl Pipe {
    /// Creates the pipe and spawns its worker on `handle`.
    pub fn new(
        name: impl Into<String>,
        handle: &Handle,
        events: Arc<Observer<PipeEvent, String>>,
    ) -> Arc<Self> {
        let (queue, rx) = mpsc::unbounded_channel();
        let streams: Streams = Arc::new(Mutex::new(HashMap::new()));
        let worker = handle.spawn(Self::fan_out(rx, streams.clone()));

        Arc::new(Self {
            name: name.into(),
            queue,
            streams,
            disabled: AtomicBool::new(false),
            worker: parking_lot::Mutex::new(Some(worker)),
            events,
        })
    }

    /// Pipe name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once `disable()` started.
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// Enqueues a message without metadata.
    ///
    /// # Panics
    /// If the pipe was disabled.
    pub fn transmit(&self, payload: Value, msg_type: MsgType) {
        self.transmit_with_meta(payload, msg_type, Map::new());
    }

    /// Enqueues a message with routing metadata.
    ///
    /// # Panics
    /// If the pipe was disabled.
    pub fn transmit_with_meta(&self, payload: Value, msg_type: MsgType, meta: Map<String, Value>) {
        assert!(!self.is_disabled(), "message pipe `{}` is closed", self.name);
        self.push(payload, msg_type, meta);
    }

    /// Enqueues a message unless the pipe is closed; returns whether it was accepted.
    pub fn try_transmit(&self, payload: Value, msg_type: MsgType) -> bool {
        if self.is_disabled() {
            return false;
        }
        self.push(payload, msg_type, Map::new());
        true
    }

    fn push(&self, payload: Value, msg_type: MsgType, meta: Map<String, Value>) {
        let message = Arc::new(Message {
            pipe_name: self.name.clone(),
            meta,
            msg_type,
            payload,
        });
        let _ = self.queue.send(PipeCommand::Deliver(message));
    }

    /// Enqueues a [`MsgType::Warning`] message.
    pub fn transmit_warning(&self, text: impl Into<String>) {
        self.transmit(Value::String(text.into()), MsgType::Warning);
    }

    /// Enqueues a [`MsgType::Error`] message.
    pub fn transmit_error(&self, text: impl Into<String>) {
        self.transmit(Value::String(text.into()), MsgType::Error);
    }

    /// Output facade tagging messages with `suite_name`.
    pub fn facade(self: &Arc<Self>, suite_name: impl Into<String>) -> PipeFacade {
        PipeFacade::new(Arc::clone(self), suite_name)
    }

    /// Facade publishing state transitions.
    pub fn state_facade(self: &Arc<Self>) -> PipeStateFacade {
        PipeStateFacade::new(Arc::clone(self))
    }

    /// Joins a subscriber queue to the fan-out set.
    ///
    /// A queue joined after `disable()` immediately receives the stop marker.
    pub async fn add_stream(&self, key: StreamKey, stream: StreamSender) {
        let mut streams = self.streams.lock().await;
        if self.is_disabled() {
            let _ = stream.send(None);
        }
        streams.insert(key, stream);
    }

    /// Removes a subscriber queue from the fan-out set.
    ///
    /// # Panics
    /// If `key` is not joined to this pipe.
    pub async fn free_stream(&self, key: StreamKey) {
        let removed = self.streams.lock().await.remove(&key);
        assert!(
            removed.is_some(),
            "stream {key} is not joined to pipe `{}`",
            self.name
        );
    }

    /// Number of joined subscriber queues.
    pub async fn streams(&self) -> usize {
        self.streams.lock().await.len()
    }

    /// Ordered shutdown. Calling it again is a no-op.
    pub async fn disable(&self) {
        if self.disabled.swap(true, Ordering::AcqRel) {
            return;
        }

        let (ack, drained) = oneshot::channel();
        if self.queue.send(PipeCommand::Drain(ack)).is_ok() {
            let _ = drained.await;
        }

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker.abort();
            let _ = worker.await;
        }

        for stream in self.streams.lock().await.values() {
            let _ = stream.send(None);
        }
        tracing::debug!(pipe = %self.name, "message pipe disabled");
        self.events.emit(PipeEvent::Disabled, self.name.clone());
    }

    async fn fan_out(mut rx: mpsc::UnboundedReceiver<PipeCommand>, streams: Streams) {
        while let Some(command) = rx.recv().await {
            match command {
                PipeCommand::Deliver(message) => {
                    let streams = streams.lock().await;
                    for stream in streams.values() {
                        let _ = stream.send(Some(Arc::clone(&message)));
                    }
                }
                PipeCommand::Drain(ack) => {
                    let _ = ack.send(());
                }
            }
        }
    }
}

impl std::fmt::Debug for Pipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipe")
            .field("name", &self.name)
            .field("disabled", &self.is_disabled())
            .finish()
    }
}
