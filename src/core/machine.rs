//! The `Machine` trait ties a state, input and output type together.

use super::state::{Input, State};
use crate::context::Context;
use std::fmt::Debug;

/// Type-level description of one kind of state machine.
///
/// Implementors are usually empty marker types. `describe` is the explicit
/// "which hooks does this state have" step: the engine calls it once for
/// every freshly produced candidate state, with a [`Context`] whose ledgers
/// are isolated from the active ones, so the hooks it registers only become
/// live if the candidate is committed.
pub trait Machine: Sized + Send + Sync + 'static {
    type State: State;
    type Input: Input;
    type Output: Clone + Debug + Send + Sync + 'static;

    /// Register the lifecycle hooks of `state` on `ctx`.
    ///
    /// Default implementation registers nothing.
    fn describe(state: &Self::State, ctx: &Context<Self>) {
        let _ = (state, ctx);
    }
}
