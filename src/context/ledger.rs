//! Enter and exit hook ledgers.

use super::Context;
use crate::core::{Machine, TypeTag};
use crate::engine::BoxError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Result returned by lifecycle hooks.
pub type HookResult = Result<(), BoxError>;

type BlockingHook<M> =
    Arc<dyn Fn(&<M as Machine>::State, &Context<M>) -> HookResult + Send + Sync>;
type SuspendingHook<M> = Arc<
    dyn Fn(<M as Machine>::State, Context<M>) -> BoxFuture<'static, HookResult> + Send + Sync,
>;

/// A lifecycle callback. Enter hooks receive the previous state, exit hooks
/// the next one.
pub enum Hook<M: Machine> {
    Blocking(BlockingHook<M>),
    Suspending(SuspendingHook<M>),
}

impl<M: Machine> Hook<M> {
    pub fn blocking<F>(callback: F) -> Self
    where
        F: Fn(&M::State, &Context<M>) -> HookResult + Send + Sync + 'static,
    {
        Hook::Blocking(Arc::new(callback))
    }

    pub fn suspending<F, Fut>(callback: F) -> Self
    where
        F: Fn(M::State, Context<M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HookResult> + Send + 'static,
    {
        Hook::Suspending(Arc::new(move |state: M::State, ctx: Context<M>| {
            callback(state, ctx).boxed()
        }))
    }

    /// Build the future that runs this hook. Nothing runs until it is polled.
    pub(crate) fn invoke(&self, other: &M::State, ctx: &Context<M>) -> BoxFuture<'static, HookResult> {
        let other = other.clone();
        let ctx = ctx.clone();
        match self {
            Hook::Blocking(callback) => {
                let callback = Arc::clone(callback);
                async move { callback(&other, &ctx) }.boxed()
            }
            Hook::Suspending(callback) => callback(other, ctx),
        }
    }
}

impl<M: Machine> Clone for Hook<M> {
    fn clone(&self) -> Self {
        match self {
            Hook::Blocking(callback) => Hook::Blocking(Arc::clone(callback)),
            Hook::Suspending(callback) => Hook::Suspending(Arc::clone(callback)),
        }
    }
}

/// One registered hook and the type that owns it.
pub struct LedgerEntry<M: Machine> {
    pub owner: TypeTag,
    pub(crate) hook: Hook<M>,
}

impl<M: Machine> Clone for LedgerEntry<M> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            hook: self.hook.clone(),
        }
    }
}

impl<M: Machine> fmt::Debug for LedgerEntry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.hook {
            Hook::Blocking(_) => "blocking",
            Hook::Suspending(_) => "suspending",
        };
        f.debug_struct("LedgerEntry")
            .field("owner", &self.owner)
            .field("hook", &kind)
            .finish()
    }
}

/// Hooks of one phase, in registration order.
pub struct Ledger<M: Machine> {
    entries: Vec<LedgerEntry<M>>,
}

impl<M: Machine> Ledger<M> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, owner: TypeTag, hook: Hook<M>) {
        self.entries.push(LedgerEntry { owner, hook });
    }

    /// Append every entry of `other` after the current ones.
    pub fn extend(&mut self, other: Ledger<M>) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[LedgerEntry<M>] {
        &self.entries
    }

    /// Owners in registration order.
    pub fn owners(&self) -> Vec<TypeTag> {
        self.entries.iter().map(|e| e.owner).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<M: Machine> Default for Ledger<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Machine> Clone for Ledger<M> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<M: Machine> fmt::Debug for Ledger<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

/// The enter and exit ledgers belonging to one state.
pub struct Ledgers<M: Machine> {
    pub enter: Ledger<M>,
    pub exit: Ledger<M>,
}

impl<M: Machine> Ledgers<M> {
    pub fn new() -> Self {
        Self {
            enter: Ledger::new(),
            exit: Ledger::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.enter.is_empty() && self.exit.is_empty()
    }

    pub fn extend(&mut self, other: Ledgers<M>) {
        self.enter.extend(other.enter);
        self.exit.extend(other.exit);
    }
}

impl<M: Machine> Default for Ledgers<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Machine> fmt::Debug for Ledgers<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledgers")
            .field("enter", &self.enter)
            .field("exit", &self.exit)
            .finish()
    }
}
