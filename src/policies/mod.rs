//! Reconnect policies.
//!
//! ## Contents
//! - [`ReconnectPolicy`] how many times and how long to wait before re-dialing a lost tester
//! - [`JitterPolicy`] randomization strategy to avoid reconnect storms
//!
//! ## Quick wiring
//! ```text
//! CoreConfig { reconnect: ReconnectPolicy }
//!      └─► resources::Resource uses:
//!           - reconnect.schedule() on device-initiated disconnect
//!           - gives up (keep_disconnected = true) after the last try
//! ```
//!
//! ## Defaults
//! - `ReconnectPolicy::default()` → attempts=5, step=2s, max=30s, jitter=None.

mod jitter;
mod reconnect;

pub use jitter::JitterPolicy;
pub use reconnect::ReconnectPolicy;
