//! The processing engine around the declarative core.
//!
//! # Key Concepts
//!
//! - **Router**: exact-type dispatch from (state, input) to a handler
//! - **LogicBlock**: the input queue and the commit/discard protocol
//! - **Observers**: outputs, handled inputs, state changes and failures
//!
//! A step runs `Idle → Dispatching → Deciding → (Committing | Discarding)`.
//! Handlers and hooks come in blocking and suspending flavours; both run
//! through the same async step, and [`LogicBlock::process_blocking`] drives
//! it on the calling thread.

mod config;
mod error;
mod logic_block;
mod observer;
mod router;

pub use config::{EngineConfig, SuppressionPolicy};
pub use error::{BoxError, HookPhase, LogicError};
pub use logic_block::LogicBlock;
pub use observer::{FnObserver, Observer, SubscriptionId};
pub use router::{Handler, HandlerResult, Router};
