//! Builder for constructing logic blocks.

use crate::builder::error::BuildError;
use crate::context::{Blackboard, Context};
use crate::core::{Input, Machine, State, TypeTag};
use crate::engine::{EngineConfig, Handler, HandlerResult, LogicBlock, Router, SuppressionPolicy};
use std::future::Future;
use std::sync::Arc;

type InitialFactory<M> = Box<dyn FnOnce(&Context<M>) -> <M as Machine>::State>;

/// Builder for constructing a [`LogicBlock`] with a fluent API.
///
/// # Example
///
/// ```rust
/// use hsm_engine::builder::LogicBlockBuilder;
/// use hsm_engine::core::{Machine, TypeTag};
/// use hsm_engine::{input_enum, state_enum};
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
///     type Output = ();
/// }
///
/// let lamp = LogicBlockBuilder::<Lamp>::new()
///     .initial(|_| Light::Off)
///     .on(TypeTag::new("Off"), TypeTag::new("Toggle"), |_, _, _| Ok(Light::On))
///     .unwrap()
///     .on(TypeTag::new("On"), TypeTag::new("Toggle"), |_, _, _| Ok(Light::Off))
///     .unwrap()
///     .build()
///     .unwrap();
///
/// lamp.enqueue(Switch::Toggle);
/// assert_eq!(lamp.process_blocking(), Light::On);
/// ```
pub struct LogicBlockBuilder<M: Machine> {
    initial: Option<InitialFactory<M>>,
    router: Router<M>,
    blackboard: Blackboard,
    config: EngineConfig,
}

impl<M: Machine> LogicBlockBuilder<M> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            router: Router::new(),
            blackboard: Blackboard::new(),
            config: EngineConfig::default(),
        }
    }

    /// Set the initial state factory (required).
    pub fn initial<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&Context<M>) -> M::State + 'static,
    {
        self.initial = Some(Box::new(factory));
        self
    }

    /// Install a service on the blackboard.
    pub fn service<T: Send + Sync + 'static>(self, service: T) -> Self {
        self.blackboard.set(service);
        self
    }

    /// Label used in log spans.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn suppression(mut self, policy: SuppressionPolicy) -> Self {
        self.config.suppression = policy;
        self
    }

    /// Keep only the most recent `limit` transitions in the history.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = Some(limit);
        self
    }

    pub fn catch_panics(mut self, catch: bool) -> Self {
        self.config.catch_panics = catch;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Bind a blocking handler to (state, input).
    /// Returns an error if the pair is already bound or a tag is undeclared.
    pub fn on<F>(self, state: TypeTag, input: TypeTag, handler: F) -> Result<Self, BuildError>
    where
        F: Fn(&M::State, &M::Input, &Context<M>) -> HandlerResult<M::State> + Send + Sync + 'static,
    {
        self.route(state, input, Handler::blocking(handler))
    }

    /// Bind a handler that may suspend to (state, input).
    pub fn on_async<F, Fut>(self, state: TypeTag, input: TypeTag, handler: F) -> Result<Self, BuildError>
    where
        F: Fn(M::State, M::Input, Context<M>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<M::State>> + Send + 'static,
    {
        self.route(state, input, Handler::suspending(handler))
    }

    /// Bind a pre-built handler.
    pub fn route(mut self, state: TypeTag, input: TypeTag, handler: Handler<M>) -> Result<Self, BuildError> {
        let states = M::State::variants();
        if !states.is_empty() && !states.contains(&state) {
            return Err(BuildError::UnknownState(state));
        }
        let inputs = M::Input::variants();
        if !inputs.is_empty() && !inputs.contains(&input) {
            return Err(BuildError::UnknownInput(input));
        }
        if self.router.handles(state, input) {
            return Err(BuildError::DuplicateHandler { state, input });
        }

        self.router.insert(state, input, handler);
        Ok(self)
    }

    /// Build the logic block.
    ///
    /// Runs the initial factory, then describes the initial state's hooks
    /// and makes them active. The initial state's enter hooks do not fire.
    ///
    /// Outputs emitted by the factory or by describing the initial state are
    /// dropped here: no step owns them and no observer can be subscribed yet.
    pub fn build(self) -> Result<LogicBlock<M>, BuildError> {
        let factory = self.initial.ok_or(BuildError::MissingInitialState)?;

        let context = Context::new(Arc::new(self.blackboard));
        let initial = factory(&context);
        let ledgers = context.capture(&initial);
        drop(context.swap_ledgers(ledgers));
        drop(context.take_outputs());

        Ok(LogicBlock::new(self.config, self.router, context, initial))
    }
}

impl<M: Machine> Default for LogicBlockBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}
