//! hsm-engine: a hierarchical state machine execution core
//!
//! A machine processes discrete inputs one at a time against a current
//! state value. Handlers bound to exact (state, input) type pairs produce a
//! candidate state; the candidate's lifecycle hooks are captured
//! speculatively and only become live if the candidate is committed.
//!
//! # Core Concepts
//!
//! - **State / Input**: immutable enum values identified by a `TypeTag`
//! - **Context**: services, outputs and hook registration for domain code
//! - **LogicBlock**: the queue, the commit/discard protocol, the drain loop
//! - **History**: immutable record of committed transitions
//!
//! # Example
//!
//! ```rust
//! use hsm_engine::builder::LogicBlockBuilder;
//! use hsm_engine::context::Context;
//! use hsm_engine::core::{Machine, TypeTag};
//! use hsm_engine::{input_enum, state_enum};
//!
//! state_enum! {
//!     enum Door { Closed, Open }
//! }
//!
//! input_enum! {
//!     enum Push { Push }
//! }
//!
//! struct DoorMachine;
//!
//! impl Machine for DoorMachine {
//!     type State = Door;
//!     type Input = Push;
//!     type Output = String;
//!
//!     fn describe(state: &Door, ctx: &Context<Self>) {
//!         if let Door::Open = state {
//!             ctx.on_enter(TypeTag::new("Open"), |_, ctx| {
//!                 ctx.output("creak".to_string());
//!                 Ok(())
//!             });
//!         }
//!     }
//! }
//!
//! let door = LogicBlockBuilder::<DoorMachine>::new()
//!     .initial(|_| Door::Closed)
//!     .on(TypeTag::new("Closed"), TypeTag::new("Push"), |_, _, _| Ok(Door::Open))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! door.enqueue(Push::Push);
//! assert_eq!(door.process_blocking(), Door::Open);
//! assert_eq!(door.history().get_path().len(), 2);
//! ```

pub mod builder;
pub mod context;
pub mod core;
pub mod engine;

// Re-export commonly used types
pub use builder::{BuildError, LogicBlockBuilder};
pub use context::{Blackboard, Context, ServiceNotFound};
pub use self::core::{Input, Machine, State, StateHistory, StateTransition, TypeTag};
pub use engine::{LogicBlock, LogicError, Observer, SuppressionPolicy};
