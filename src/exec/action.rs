// src/exec/action.rs

//! The `TaskAction` trait.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

use crate::runner::RunContext;

/// Future type returned by [`TaskAction::run`].
pub type BoxedActionFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// A unit of build work.
///
/// An action is invoked with nothing beyond its [`RunContext`] and reports
/// completion by resolving the returned future: `Ok(())` on success, `Err`
/// with a cause on failure. No timeout is imposed at this layer; callers may
/// impose one.
pub trait TaskAction: Send + Sync {
    fn run<'a>(&'a self, ctx: &'a RunContext) -> BoxedActionFuture<'a>;
}

/// Adapter turning a plain closure into a [`TaskAction`].
///
/// Useful for small glue tasks that do not shell out, and for tests.
pub struct FnAction<F>(pub F);

impl<F, Fut> TaskAction for FnAction<F>
where
    F: Fn(RunContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn run<'a>(&'a self, ctx: &'a RunContext) -> BoxedActionFuture<'a> {
        Box::pin((self.0)(ctx.clone()))
    }
}
