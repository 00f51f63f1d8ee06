//! The processing engine: input queue, transition protocol and drain loop.

use super::config::EngineConfig;
use super::error::{panic_message, BoxError, HookPhase, LogicError};
use super::observer::{FnObserver, Observer, Observers, SubscriptionId};
use super::router::Router;
use crate::context::{Blackboard, Context, Ledger};
use crate::core::{Input, Machine, State, StateHistory, StateTransition, TypeTag};
use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info_span, trace, warn, Instrument};
use uuid::Uuid;

tokio::task_local! {
    /// Instances whose drain the current task is running, innermost last.
    static DRAINING: Vec<Uuid>;
}

/// Outcome of the deciding phase of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// No handler for the (state, input) pair; the input was dropped.
    Unhandled,
    /// The candidate had the current state's type and was thrown away.
    Discarded,
    /// The candidate became the current state.
    Committed,
}

/// A running state machine.
///
/// Inputs are queued with [`enqueue`](Self::enqueue) and processed strictly
/// one at a time by [`process`](Self::process) or
/// [`process_blocking`](Self::process_blocking). Wrap the block in an `Arc`
/// to share it between tasks or threads; every operation takes `&self`.
pub struct LogicBlock<M: Machine> {
    id: Uuid,
    config: EngineConfig,
    router: Router<M>,
    context: Context<M>,
    queue: Mutex<VecDeque<M::Input>>,
    drain: tokio::sync::Mutex<()>,
    state: RwLock<M::State>,
    errors: Mutex<Vec<LogicError>>,
    history: Mutex<StateHistory>,
    observers: Observers<M>,
}

impl<M: Machine> LogicBlock<M> {
    /// Assemble a block around an already described initial state.
    ///
    /// The initial state's ledgers must already be open on `context`.
    pub(crate) fn new(
        config: EngineConfig,
        router: Router<M>,
        context: Context<M>,
        initial: M::State,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            router,
            context,
            queue: Mutex::new(VecDeque::new()),
            drain: tokio::sync::Mutex::new(()),
            state: RwLock::new(initial),
            errors: Mutex::new(Vec::new()),
            history: Mutex::new(StateHistory::new()),
            observers: Observers::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &Context<M> {
        &self.context
    }

    pub fn blackboard(&self) -> &Arc<Blackboard> {
        self.context.blackboard()
    }

    /// Snapshot of the current state.
    pub fn current_state(&self) -> M::State {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Append an input to the queue. Safe to call at any time, including
    /// from handlers, hooks and observers during a drain.
    pub fn enqueue(&self, input: M::Input) {
        self.queue().push_back(input);
    }

    /// Number of inputs waiting to be processed.
    pub fn pending(&self) -> usize {
        self.queue().len()
    }

    /// Recorded failures, oldest first.
    pub fn errors(&self) -> Vec<LogicError> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Committed transitions, oldest first.
    ///
    /// The history grows with every commit unless the block was built with
    /// a `history_limit`, in which case only the newest transitions are kept.
    pub fn history(&self) -> StateHistory {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Declared (state, input) pairs this machine can handle.
    pub fn capabilities(&self) -> Vec<(TypeTag, TypeTag)> {
        self.router.capabilities()
    }

    pub fn subscribe(&self, observer: Arc<dyn Observer<M>>) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    /// Subscribe with one closure per notification kind.
    pub fn subscribe_fn<O, I, E>(&self, on_output: O, on_input_handled: I, on_error: E) -> SubscriptionId
    where
        O: Fn(&M::Output) + Send + Sync + 'static,
        I: Fn(&M::Input) + Send + Sync + 'static,
        E: Fn(&LogicError) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnObserver::new(on_output, on_input_handled, on_error)))
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Drain the queue and return the final state.
    ///
    /// Concurrent calls never overlap: a call made while a drain is running
    /// waits for it, finds the queue empty (or drains what was added since)
    /// and resolves to the same final state.
    ///
    /// A call made from inside this block's own drain (a handler, hook or
    /// observer running on the draining task) returns the current state at
    /// once. Anything it enqueued is picked up by the running drain.
    pub async fn process(&self) -> M::State {
        if self.in_own_drain() {
            trace!(instance = %self.id, "drain requested from inside the running drain");
            return self.current_state();
        }

        let _running = self.drain.lock().await;
        let mut draining = DRAINING.try_with(|ids| ids.clone()).unwrap_or_default();
        draining.push(self.id);
        let span = info_span!("drain", machine = %self.config.name, instance = %self.id);

        let drain = async {
            let mut processed = 0usize;
            while let Some(input) = self.dequeue() {
                self.step(input).await;
                processed += 1;
            }
            debug!(processed, "queue drained");
        };
        DRAINING.scope(draining, drain.instrument(span)).await;

        self.current_state()
    }

    /// Drain the queue on the calling thread.
    ///
    /// Blocking handlers and hooks complete immediately; suspending ones are
    /// driven to completion in place, so they must not depend on a runtime
    /// that this thread is already running. Called from inside this block's
    /// own drain it returns the current state, like [`process`](Self::process).
    pub fn process_blocking(&self) -> M::State {
        if self.in_own_drain() {
            trace!(instance = %self.id, "blocking drain requested from inside the running drain");
            return self.current_state();
        }
        futures::executor::block_on(self.process())
    }

    fn in_own_drain(&self) -> bool {
        DRAINING
            .try_with(|ids| ids.contains(&self.id))
            .unwrap_or(false)
    }

    fn dequeue(&self) -> Option<M::Input> {
        self.queue().pop_front()
    }

    /// Process one input through dispatch, decision and commit or discard.
    async fn step(&self, input: M::Input) -> StepOutcome {
        let current = self.current_state();
        let (state_tag, input_tag) = (current.kind(), input.kind());

        let Some(handler) = self.router.resolve(state_tag, input_tag) else {
            debug!(state = %state_tag, input = %input_tag, "no handler, input dropped");
            return StepOutcome::Unhandled;
        };
        debug!(state = %state_tag, input = %input_tag, "dispatching");

        // Hooks the handler registers belong to the candidate, not to the
        // current state, so they go into a scratch pair of their own.
        let scope = self.context.isolate();
        let result = self
            .guarded(handler.invoke(&current, &input, &self.context))
            .await;
        let registered = scope.finish();

        let candidate = match result {
            Ok(candidate) => Some(candidate),
            Err(message) => {
                self.record(LogicError::HandlerFailure {
                    state: state_tag,
                    input: input_tag,
                    message,
                });
                None
            }
        };

        let outcome = match candidate {
            Some(candidate) if candidate.kind() != state_tag => {
                let mark = self.context.output_mark();
                let mut pending = registered;
                pending.extend(self.context.capture(&candidate));
                trace!(
                    outputs_before_capture = mark,
                    enter = pending.enter.len(),
                    exit = pending.exit.len(),
                    "captured candidate hooks"
                );

                let exits = self.context.active_exit();
                self.run_hooks(HookPhase::Exit, &exits, &candidate).await;

                drop(self.context.swap_ledgers(pending));
                *self.state.write().unwrap_or_else(PoisonError::into_inner) = candidate.clone();

                let enters = self.context.active_enter();
                self.run_hooks(HookPhase::Enter, &enters, &current).await;

                self.history_mut().push_bounded(
                    StateTransition {
                        from: state_tag,
                        to: candidate.kind(),
                        input: input_tag,
                        timestamp: Utc::now(),
                    },
                    self.config.history_limit,
                );
                debug!(from = %state_tag, to = %candidate.kind(), "committed");
                StepOutcome::Committed
            }
            Some(candidate) => {
                let mark = self.context.output_mark();
                drop(self.context.capture(&candidate));
                self.context.rollback_outputs(mark);
                trace!(dropped = registered.enter.len() + registered.exit.len(), "handler hooks dropped");
                debug!(state = %state_tag, "candidate has current type, discarded");
                StepOutcome::Discarded
            }
            None => StepOutcome::Discarded,
        };

        for output in self.context.take_outputs() {
            self.observers.output(&output);
        }
        if outcome == StepOutcome::Committed {
            self.observers.state(&self.current_state());
        }
        self.observers.input_handled(&input);

        outcome
    }

    /// Run every hook of `ledger` in order, skipping suppressed owners.
    /// `other` is the state on the far side of the transition.
    async fn run_hooks(&self, phase: HookPhase, ledger: &Ledger<M>, other: &M::State) {
        for entry in ledger.entries() {
            if self.config.suppression.suppresses(entry.owner, other) {
                trace!(%phase, owner = %entry.owner, other = %other.kind(), "hook suppressed");
                continue;
            }

            if let Err(message) = self.guarded(entry.hook.invoke(other, &self.context)).await {
                self.record(LogicError::HookFailure {
                    owner: entry.owner,
                    phase,
                    message,
                });
            }
        }
    }

    /// Await a handler or hook, turning errors and (optionally) panics into
    /// a message.
    async fn guarded<T>(&self, call: BoxFuture<'static, Result<T, BoxError>>) -> Result<T, String> {
        let result = if self.config.catch_panics {
            match AssertUnwindSafe(call).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => return Err(panic_message(payload)),
            }
        } else {
            call.await
        };
        result.map_err(|err| err.to_string())
    }

    fn record(&self, error: LogicError) {
        warn!(%error, "failure recorded");
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.clone());
        self.observers.error(&error);
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<M::Input>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn history_mut(&self) -> MutexGuard<'_, StateHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<M: Machine> std::fmt::Debug for LogicBlock<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicBlock")
            .field("id", &self.id)
            .field("name", &self.config.name)
            .field("state", &self.current_state())
            .field("pending", &self.pending())
            .field("observers", &self.observers.len())
            .finish()
    }
}
