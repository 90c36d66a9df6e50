//! Subscription stream returned by [`MessagesHandler::changes`](super::MessagesHandler::changes).

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::message::{Message, MsgType};
use super::pipe::{Pipe, StreamKey};

/// Lazy sequence of messages from one or more pipes.
///
/// Ends when any joined pipe is disabled. Dropping the stream leaves every
/// joined pipe.
pub struct Changes {
    key: StreamKey,
    rx: mpsc::UnboundedReceiver<Option<Arc<Message>>>,
    filter: Option<HashSet<MsgType>>,
    pipes: Vec<Arc<Pipe>>,
    handle: Handle,
    finished: bool,
}

impl Changes {
    pub(crate) fn new(
        key: StreamKey,
        rx: mpsc::UnboundedReceiver<Option<Arc<Message>>>,
        filter: Option<HashSet<MsgType>>,
        pipes: Vec<Arc<Pipe>>,
        handle: Handle,
    ) -> Self {
        Self {
            key,
            rx,
            filter,
            pipes,
            handle,
            finished: false,
        }
    }

    /// Subscription token shared by every joined pipe.
    pub fn key(&self) -> StreamKey {
        self.key
    }

    /// Names of the joined pipes, each once.
    pub fn pipe_names(&self) -> Vec<&str> {
        self.pipes.iter().map(|pipe| pipe.name()).collect()
    }

    fn accepts(&self, message: &Message) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|types| types.is_empty() || types.contains(&message.msg_type))
    }
}

impl Stream for Changes {
    type Item = Arc<Message>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        loop {
            match self.rx.poll_recv(cx) {
                Poll::Ready(Some(Some(message))) => {
                    if self.accepts(&message) {
                        return Poll::Ready(Some(message));
                    }
                }
                Poll::Ready(Some(None)) | Poll::Ready(None) => {
                    self.finished = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl Drop for Changes {
    fn drop(&mut self) {
        let key = self.key;
        let pipes = std::mem::take(&mut self.pipes);
        self.handle.spawn(async move {
            for pipe in pipes {
                pipe.free_stream(key).await;
            }
        });
    }
}
