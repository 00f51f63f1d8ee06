//! Per-instance context handed to handlers, hooks and `Machine::describe`.
//!
//! The context is the only way domain code touches the machine while it
//! runs: it looks up services on the [`Blackboard`], emits outputs, and
//! registers lifecycle hooks into whichever ledger pair is currently open.

mod blackboard;
mod ledger;

pub use blackboard::{Blackboard, ServiceNotFound};
pub use ledger::{Hook, HookResult, Ledger, LedgerEntry, Ledgers};

use crate::core::{Machine, TypeTag};
use std::future::Future;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct ContextInner<M: Machine> {
    blackboard: Arc<Blackboard>,
    ledgers: Mutex<Ledgers<M>>,
    outputs: Mutex<Vec<M::Output>>,
}

/// Cheaply cloneable handle onto one machine instance.
///
/// # Example
///
/// ```rust
/// use hsm_engine::context::{Blackboard, Context};
/// use hsm_engine::core::{Machine, TypeTag};
/// use hsm_engine::{input_enum, state_enum};
/// use std::sync::Arc;
///
/// state_enum! {
///     enum Light { On, Off }
/// }
///
/// input_enum! {
///     enum Switch { Toggle }
/// }
///
/// struct Lamp;
///
/// impl Machine for Lamp {
///     type State = Light;
///     type Input = Switch;
///     type Output = &'static str;
///
///     fn describe(state: &Light, ctx: &Context<Self>) {
///         if let Light::On = state {
///             ctx.on_enter(TypeTag::new("On"), |_previous, ctx| {
///                 ctx.output("bulb lit");
///                 Ok(())
///             });
///         }
///     }
/// }
///
/// let ctx = Context::<Lamp>::new(Arc::new(Blackboard::new()));
/// let ledgers = ctx.capture(&Light::On);
/// assert_eq!(ledgers.enter.owners(), vec![TypeTag::new("On")]);
/// assert!(ctx.capture(&Light::Off).is_empty());
/// ```
pub struct Context<M: Machine> {
    inner: Arc<ContextInner<M>>,
}

impl<M: Machine> Clone for Context<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Machine> Context<M> {
    pub fn new(blackboard: Arc<Blackboard>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                blackboard,
                ledgers: Mutex::new(Ledgers::new()),
                outputs: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn blackboard(&self) -> &Arc<Blackboard> {
        &self.inner.blackboard
    }

    /// Look up a service. A miss is a contract violation reported to the
    /// caller; the engine never records it.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ServiceNotFound> {
        self.inner.blackboard.get::<T>()
    }

    /// Install or overwrite a service, visible immediately to every holder.
    pub fn set<T: Send + Sync + 'static>(&self, service: T) {
        self.inner.blackboard.set(service);
    }

    /// Register an enter hook. The callback receives the previous state.
    pub fn on_enter<F>(&self, owner: TypeTag, callback: F)
    where
        F: Fn(&M::State, &Context<M>) -> HookResult + Send + Sync + 'static,
    {
        self.ledgers().enter.push(owner, Hook::blocking(callback));
    }

    /// Register an exit hook. The callback receives the next state.
    pub fn on_exit<F>(&self, owner: TypeTag, callback: F)
    where
        F: Fn(&M::State, &Context<M>) -> HookResult + Send + Sync + 'static,
    {
        self.ledgers().exit.push(owner, Hook::blocking(callback));
    }

    /// Register an enter hook that may suspend.
    pub fn on_enter_async<F, Fut>(&self, owner: TypeTag, callback: F)
    where
        F: Fn(M::State, Context<M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.ledgers().enter.push(owner, Hook::suspending(callback));
    }

    /// Register an exit hook that may suspend.
    pub fn on_exit_async<F, Fut>(&self, owner: TypeTag, callback: F)
    where
        F: Fn(M::State, Context<M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        self.ledgers().exit.push(owner, Hook::suspending(callback));
    }

    /// Emit an output for the current step.
    pub fn output(&self, value: M::Output) {
        self.outputs().push(value);
    }

    /// Run `Machine::describe` for `state` against a fresh ledger pair and
    /// return it. The ledgers open before the call are restored untouched.
    pub fn capture(&self, state: &M::State) -> Ledgers<M> {
        let scope = self.isolate();
        M::describe(state, self);
        scope.finish()
    }

    /// Open a fresh ledger pair until the returned guard is finished or
    /// dropped. Hooks registered meanwhile land in the fresh pair.
    pub(crate) fn isolate(&self) -> Isolated<'_, M> {
        Isolated {
            ctx: self,
            prior: Some(self.swap_ledgers(Ledgers::new())),
        }
    }

    /// Make `ledgers` the open pair, returning the pair it replaces.
    pub(crate) fn swap_ledgers(&self, ledgers: Ledgers<M>) -> Ledgers<M> {
        mem::replace(&mut *self.ledgers(), ledgers)
    }

    pub(crate) fn active_enter(&self) -> Ledger<M> {
        self.ledgers().enter.clone()
    }

    pub(crate) fn active_exit(&self) -> Ledger<M> {
        self.ledgers().exit.clone()
    }

    pub(crate) fn output_mark(&self) -> usize {
        self.outputs().len()
    }

    /// Drop outputs emitted after `mark`.
    pub(crate) fn rollback_outputs(&self, mark: usize) {
        self.outputs().truncate(mark);
    }

    pub(crate) fn take_outputs(&self) -> Vec<M::Output> {
        mem::take(&mut *self.outputs())
    }

    fn ledgers(&self) -> MutexGuard<'_, Ledgers<M>> {
        self.inner
            .ledgers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn outputs(&self) -> MutexGuard<'_, Vec<M::Output>> {
        self.inner
            .outputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Scope opened by [`Context::isolate`]. Restores the prior pair on drop,
/// even when the code inside it panics.
pub(crate) struct Isolated<'a, M: Machine> {
    ctx: &'a Context<M>,
    prior: Option<Ledgers<M>>,
}

impl<M: Machine> Isolated<'_, M> {
    /// Restore the prior pair and return what was registered in the scope.
    pub(crate) fn finish(mut self) -> Ledgers<M> {
        let prior = self.prior.take().unwrap_or_default();
        self.ctx.swap_ledgers(prior)
    }
}

impl<M: Machine> Drop for Isolated<'_, M> {
    fn drop(&mut self) {
        if let Some(prior) = self.prior.take() {
            drop(self.ctx.swap_ledgers(prior));
        }
    }
}
