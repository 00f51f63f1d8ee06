//! Build errors for logic blocks.

use crate::core::TypeTag;
use thiserror::Error;

/// Errors that can occur when building a logic block.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(factory) before .build()")]
    MissingInitialState,

    #[error("A handler for input '{input}' in state '{state}' is already registered")]
    DuplicateHandler { state: TypeTag, input: TypeTag },

    #[error("'{0}' is not a declared state of this machine")]
    UnknownState(TypeTag),

    #[error("'{0}' is not a declared input of this machine")]
    UnknownInput(TypeTag),
}
