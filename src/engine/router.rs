//! Exact-type input routing.

use crate::context::Context;
use crate::core::{Machine, TypeTag};
use crate::engine::error::BoxError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Result returned by input handlers: the candidate next state.
pub type HandlerResult<S> = Result<S, BoxError>;

type BlockingHandler<M> = Arc<
    dyn Fn(
            &<M as Machine>::State,
            &<M as Machine>::Input,
            &Context<M>,
        ) -> HandlerResult<<M as Machine>::State>
        + Send
        + Sync,
>;

type SuspendingHandler<M> = Arc<
    dyn Fn(
            <M as Machine>::State,
            <M as Machine>::Input,
            Context<M>,
        ) -> BoxFuture<'static, HandlerResult<<M as Machine>::State>>
        + Send
        + Sync,
>;

/// Produces a candidate state from the current state and an input.
pub enum Handler<M: Machine> {
    Blocking(BlockingHandler<M>),
    Suspending(SuspendingHandler<M>),
}

impl<M: Machine> Handler<M> {
    pub fn blocking<F>(handler: F) -> Self
    where
        F: Fn(&M::State, &M::Input, &Context<M>) -> HandlerResult<M::State> + Send + Sync + 'static,
    {
        Handler::Blocking(Arc::new(handler))
    }

    pub fn suspending<F, Fut>(handler: F) -> Self
    where
        F: Fn(M::State, M::Input, Context<M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<M::State>> + Send + 'static,
    {
        Handler::Suspending(Arc::new(move |state: M::State, input: M::Input, ctx: Context<M>| {
            handler(state, input, ctx).boxed()
        }))
    }

    /// Build the future that runs this handler. Nothing runs until polled.
    pub(crate) fn invoke(
        &self,
        state: &M::State,
        input: &M::Input,
        ctx: &Context<M>,
    ) -> BoxFuture<'static, HandlerResult<M::State>> {
        let state = state.clone();
        let input = input.clone();
        let ctx = ctx.clone();
        match self {
            Handler::Blocking(handler) => {
                let handler = Arc::clone(handler);
                async move { handler(&state, &input, &ctx) }.boxed()
            }
            Handler::Suspending(handler) => handler(state, input, ctx),
        }
    }
}

impl<M: Machine> Clone for Handler<M> {
    fn clone(&self) -> Self {
        match self {
            Handler::Blocking(handler) => Handler::Blocking(Arc::clone(handler)),
            Handler::Suspending(handler) => Handler::Suspending(Arc::clone(handler)),
        }
    }
}

/// Dispatch table keyed by (state tag, input tag).
///
/// Lookup is exact: a handler bound to a parent tag never matches a child
/// state, and vice versa.
pub struct Router<M: Machine> {
    routes: HashMap<(TypeTag, TypeTag), Handler<M>>,
}

impl<M: Machine> Router<M> {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Bind a handler, returning the one it replaces.
    pub fn insert(
        &mut self,
        state: TypeTag,
        input: TypeTag,
        handler: Handler<M>,
    ) -> Option<Handler<M>> {
        self.routes.insert((state, input), handler)
    }

    pub fn resolve(&self, state: TypeTag, input: TypeTag) -> Option<&Handler<M>> {
        self.routes.get(&(state, input))
    }

    pub fn handles(&self, state: TypeTag, input: TypeTag) -> bool {
        self.routes.contains_key(&(state, input))
    }

    /// Declared (state, input) pairs, sorted by name.
    pub fn capabilities(&self) -> Vec<(TypeTag, TypeTag)> {
        let mut pairs: Vec<_> = self.routes.keys().copied().collect();
        pairs.sort();
        pairs
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<M: Machine> Default for Router<M> {
    fn default() -> Self {
        Self::new()
    }
}
