//! Builder API for ergonomic logic block construction.
//!
//! This module provides the fluent [`LogicBlockBuilder`] and macros for
//! declaring state and input enums with minimal boilerplate.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::LogicBlockBuilder;

use crate::core::Machine;
use crate::engine::Handler;

/// Create a handler that always produces a clone of `target`.
///
/// # Example
///
/// ```
/// use hsm_engine::builder::{transition_to, LogicBlockBuilder};
/// use hsm_engine::core::{Machine, TypeTag};
/// use hsm_engine::{input_enum, state_enum};
///
/// state_enum! {
///     enum MyState { Start, End }
///     final: [End]
/// }
///
/// input_enum! {
///     enum MyInput { Next }
/// }
///
/// struct MyMachine;
///
/// impl Machine for MyMachine {
///     type State = MyState;
///     type Input = MyInput;
///     type Output = ();
/// }
///
/// let block = LogicBlockBuilder::<MyMachine>::new()
///     .initial(|_| MyState::Start)
///     .route(TypeTag::new("Start"), TypeTag::new("Next"), transition_to(MyState::End))
///     .unwrap()
///     .build()
///     .unwrap();
///
/// block.enqueue(MyInput::Next);
/// assert_eq!(block.process_blocking(), MyState::End);
/// ```
pub fn transition_to<M: Machine>(target: M::State) -> Handler<M> {
    Handler::blocking(move |_, _, _| Ok(target.clone()))
}
