//! Named message pipes and subscriptions.
//!
//! ## Contents
//! - [`Message`], [`MsgType`], [`StatePayload`], [`Progress`] message model
//! - [`Pipe`] named fan-out channel with ordered shutdown
//! - [`MessagesHandler`] owner of pipes, entry point for [`Changes`] streams
//! - [`PipeFacade`], [`PipeStateFacade`] write-only views for executions
//!
//! Two pipes are well known: [`RESOURCES_PIPE`] (pool membership and tester
//! lifecycle) and [`EXECUTOR_PIPE`] (execution manager notices). Every suite
//! execution additionally owns a pipe named after its execution id.

mod error;
mod facade;
mod handler;
mod message;
mod pipe;
mod stream;

pub use error::MessengerError;
pub use facade::{PipeFacade, PipeStateFacade};
pub use handler::MessagesHandler;
pub use message::{Message, MsgType, Progress, StatePayload};
pub(crate) use message::encode;
pub use pipe::{Pipe, StreamKey, StreamSender};
pub use stream::Changes;

/// Pipe carrying pool membership and tester lifecycle updates.
pub const RESOURCES_PIPE: &str = "RESOURCES";

/// Pipe carrying execution manager notices.
pub const EXECUTOR_PIPE: &str = "EXECUTOR";
