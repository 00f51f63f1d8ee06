//! Core state machine types.
//!
//! This module contains the declarative side of a machine:
//! - State and input identity via `TypeTag`
//! - The `Machine` trait binding states, inputs and outputs together
//! - Immutable history of committed transitions

mod history;
mod machine;
mod state;

pub use history::{StateHistory, StateTransition};
pub use machine::Machine;
pub use state::{Input, State, TypeTag};
