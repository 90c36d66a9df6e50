//! Tester resources: identity, sessions, datasets, pool and durable store.
//!
//! ## Contents
//! - [`Credentials`], [`ResourceId`], [`ProductType`], [`StoredResource`] identity
//! - [`TesterSession`], [`SessionFactory`] transport contract
//! - [`ResourceDataset`], [`TesterInfo`] arena dataset and its read model
//! - [`Resource`] connect/disconnect/reconnect state machine
//! - [`ResourcesPool`] membership and lifecycle publication
//! - [`Storage`], [`FileStorage`], [`MemoryStorage`] durable store
//! - [`ResourcesController`] store-consistent public operations
//!
//! ## Quick wiring
//! ```text
//! ResourcesController
//!   ├─ Storage (source of truth)
//!   └─ ResourcesPool ──► RESOURCES pipe
//!        └─ Resource ─► Observer<ResourceEvent> ─► pool publisher
//!             └─ SessionRef (from SessionFactory)
//! ```

mod controller;
mod credentials;
mod dataset;
mod error;
mod pool;
mod resource;
mod storage;
mod transport;

pub use controller::{ResourcesController, TesterResolver, Testers};
pub use credentials::{
    Credentials, DEFAULT_PASSWORD, DEFAULT_PORT, DriverKind, Password, ProductType, ResourceId,
    StoredResource,
};
pub use dataset::{ModuleInfo, PortInfo, ResourceDataset, TesterInfo, UNNAMED};
pub use error::{ResourceError, StorageError};
pub use pool::{MembersView, PoolAction, PoolMessage, ResourcesPool};
pub use resource::{Resource, ResourceContext, ResourceOptions};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use transport::{
    ChangeHook, DisconnectHook, ModuleSnapshot, ModuleState, PortState, SessionChange,
    SessionError, SessionFactory, SessionRef, TesterLimits, TesterSession, TesterSnapshot,
};
