//! # Device session contract.
//!
//! The wire protocol to test hardware lives outside this crate. A resource
//! talks to it through [`TesterSession`] handles built by a
//! [`SessionFactory`]:
//!
//! ```text
//! SessionFactory::create(credentials, username, debug) ─► SessionRef
//!   ├─ connect()     handshake
//!   ├─ snapshot()    bulk read of tester/module/port state
//!   ├─ logoff()      user-initiated close (does not fire on_disconnected)
//!   ├─ on_change()   push notifications (reservation, traffic, sync)
//!   └─ on_disconnected()  device-initiated loss
//! ```
//!
//! Hooks are plain synchronous callbacks; anything async is spawned by the
//! receiver.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::credentials::Credentials;
use super::error::ResourceError;

/// Called once when the device drops the session.
pub type DisconnectHook = Box<dyn Fn() + Send + Sync>;

/// Called for every pushed state change.
pub type ChangeHook = Arc<dyn Fn(SessionChange) + Send + Sync>;

/// Shared session handle.
pub type SessionRef = Arc<dyn TesterSession>;

/// Failures reported by the transport layer.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The endpoint could not be reached.
    #[error("tester {host}:{port} is unreachable")]
    Unreachable { host: String, port: u16 },
    /// The tester refused the login.
    #[error("login rejected: {reason}")]
    Rejected { reason: String },
    /// Any other protocol-level failure.
    #[error("protocol error: {reason}")]
    Protocol { reason: String },
}

/// Async session with one tester.
#[async_trait]
pub trait TesterSession: Send + Sync {
    /// Performs the login handshake.
    async fn connect(&self) -> Result<(), SessionError>;

    /// True while the session is logged in.
    fn is_online(&self) -> bool;

    /// Closes the session.
    async fn logoff(&self) -> Result<(), SessionError>;

    /// Reads the current tester/module/port state.
    async fn snapshot(&self) -> Result<TesterSnapshot, SessionError>;

    /// Registers the device-initiated disconnect hook.
    fn on_disconnected(&self, hook: DisconnectHook);

    /// Registers the push-notification hook.
    fn on_change(&self, hook: ChangeHook);
}

/// Builds session handles for credentials.
pub trait SessionFactory: Send + Sync {
    /// Returns a new, not yet connected session.
    ///
    /// Fails with [`ResourceError::InvalidTesterType`] when the product has no
    /// driver.
    fn create(
        &self,
        credentials: &Credentials,
        username: &str,
        debug: bool,
    ) -> Result<SessionRef, ResourceError>;
}

/// Push notification of a device-side change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    /// Chassis reservation owner changed.
    TesterReservedBy { username: String },
    /// Module reservation owner changed.
    ModuleReservedBy { module: u8, username: String },
    /// Port reservation owner changed.
    PortReservedBy { module: u8, port: u8, username: String },
    /// Port traffic switched on or off.
    Traffic { module: u8, port: u8, on: bool },
    /// Port receive sync changed.
    Sync { module: u8, port: u8, in_sync: bool },
}

/// UI/validation limits reported by the chassis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TesterLimits {
    pub max_name_len: u32,
    pub max_comment_len: u32,
    pub max_password_len: u32,
}

/// Module state read from the device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleState {
    pub index: u8,
    pub model: String,
    pub name: String,
    pub reserved_by: String,
    pub can_media_config: bool,
    pub is_chimera: bool,
    pub can_local_time_adjust: bool,
    pub max_clock_ppm: Option<i32>,
}

/// Port state read from the device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortState {
    pub index: u8,
    pub model: String,
    pub reserved_by: String,
    pub sync_status: Option<bool>,
    pub traffic_on: Option<bool>,
    pub max_speed: Option<u64>,
    pub speed_current: Option<u64>,
    pub max_streams_per_port: Option<u32>,
    pub can_set_autoneg: bool,
    pub can_fec: bool,
    pub can_anlt: bool,
    pub can_micro_tpld: bool,
}

/// One module with its ports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSnapshot {
    pub state: ModuleState,
    pub ports: Vec<PortState>,
}

/// Full tester state returned by [`TesterSession::snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TesterSnapshot {
    pub name: String,
    pub reserved_by: String,
    pub limits: TesterLimits,
    pub modules: Vec<ModuleSnapshot>,
}
