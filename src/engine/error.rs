//! Failures recorded while processing inputs.

use crate::core::TypeTag;
use std::fmt;
use thiserror::Error;

/// Error type returned by handlers and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which side of a transition a hook belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Enter,
    Exit,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Enter => f.write_str("enter"),
            HookPhase::Exit => f.write_str("exit"),
        }
    }
}

/// Failures absorbed into a machine's error log.
///
/// None of these abort a drain: a failed handler counts as "no transition",
/// a failed hook is skipped and the remaining hooks still run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogicError {
    #[error("Handler for '{input}' in state '{state}' failed: {message}")]
    HandlerFailure {
        state: TypeTag,
        input: TypeTag,
        message: String,
    },

    #[error("The {phase} hook owned by '{owner}' failed: {message}")]
    HookFailure {
        owner: TypeTag,
        phase: HookPhase,
        message: String,
    },
}

/// Render a caught panic payload as text.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
