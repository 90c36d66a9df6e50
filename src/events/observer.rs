//! # Observer: typed fire-and-forget dispatcher
//!
//! [`Observer`] keeps a list of async callbacks per event key and runs them
//! **without awaiting** their completion.
//!
//! ## What it guarantees
//! - `subscribe()` appends; earlier callbacks for the same key are kept.
//! - `emit()` returns immediately; each callback runs as its own task on the
//!   injected runtime handle.
//! - A callback that fails or panics is logged and never affects the emitter
//!   or its sibling callbacks.
//!
//! ## What it does **not** guarantee
//! - No ordering between callbacks of the same emit.
//! - No delivery of callbacks subscribed after the emit.
//!
//! ## Diagram
//! ```text
//!    emit(key, args)
//!        │                  (args cloned per callback)
//!        ├────────────► spawn ─► cb1(args) ─► catch_unwind ─► warn on Err/panic
//!        ├────────────► spawn ─► cb2(args) ─► catch_unwind ─► warn on Err/panic
//!        └────────────► spawn ─► cbN(args) ─► catch_unwind ─► warn on Err/panic
//! ```

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::runtime::Handle;

/// Shared async callback registered for an event key.
pub type Callback<A> = Arc<dyn Fn(A) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Keyed fan-out of async callbacks.
pub struct Observer<K, A> {
    handle: Handle,
    callbacks: Mutex<HashMap<K, Vec<Callback<A>>>>,
}

impl<K, A> Observer<K, A>
where
    K: Eq + Hash + Copy + Debug + Send + Sync + 'static,
    A: Clone + Send + 'static,
{
    /// Creates an empty observer spawning callbacks on `handle`.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            callbacks: Mutex::new(HashMap::new()),
        }
    }

    /// Appends `callback` to the list of `key`.
    pub fn subscribe<F, Fut>(&self, key: K, callback: F)
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let cb: Callback<A> = Arc::new(move |args| callback(args).boxed());
        self.callbacks.lock().entry(key).or_default().push(cb);
    }

    /// Schedules every callback of `key` with a clone of `args`.
    pub fn emit(&self, key: K, args: A) {
        let callbacks: Vec<Callback<A>> = match self.callbacks.lock().get(&key) {
            Some(list) => list.clone(),
            None => return,
        };

        for cb in callbacks {
            let args = args.clone();
            self.handle.spawn(async move {
                let fut = AssertUnwindSafe(async move { cb(args).await });
                match fut.catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        tracing::warn!(event = ?key, error = %err, "observer callback failed");
                    }
                    Err(_) => {
                        tracing::warn!(event = ?key, "observer callback panicked");
                    }
                }
            });
        }
    }

    /// Drops every subscription.
    pub fn reset(&self) {
        self.callbacks.lock().clear();
    }

    /// Number of callbacks registered for `key`.
    pub fn subscribed(&self, key: K) -> usize {
        self.callbacks.lock().get(&key).map_or(0, Vec::len)
    }
}
