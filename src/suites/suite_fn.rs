//! # Function-backed suite (`SuiteFn`)
//!
//! [`SuiteFn`] turns a closure `F: Fn(Arc<SuiteContext>) -> Fut` into a
//! [`TestSuite`]. Each execution gets its own context; the closure is shared.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use benchvisor::suites::{SuiteContext, SuiteFactory, SuiteFn};
//!
//! let echo: SuiteFactory = SuiteFn::factory(|ctx: Arc<SuiteContext>| async move {
//!     ctx.output.send_statistics(ctx.params.config.clone());
//!     Ok(())
//! });
//! # let _ = echo;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::contract::{SuiteContext, SuiteFactory, TestSuite};
use super::error::SuiteError;

/// Suite whose `start()` is a closure; lifecycle hooks are no-ops.
pub struct SuiteFn<F> {
    ctx: Arc<SuiteContext>,
    f: Arc<F>,
}

impl<F, Fut> SuiteFn<F>
where
    F: Fn(Arc<SuiteContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SuiteError>> + Send + 'static,
{
    /// Entry factory building one `SuiteFn` per execution.
    pub fn factory(f: F) -> SuiteFactory {
        let f = Arc::new(f);
        Arc::new(move |ctx: SuiteContext| {
            Arc::new(SuiteFn {
                ctx: Arc::new(ctx),
                f: f.clone(),
            }) as Arc<dyn TestSuite>
        })
    }
}

#[async_trait]
impl<F, Fut> TestSuite for SuiteFn<F>
where
    F: Fn(Arc<SuiteContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SuiteError>> + Send + 'static,
{
    async fn start(&self) -> Result<(), SuiteError> {
        (self.f)(self.ctx.clone()).await
    }
}
