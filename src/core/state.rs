//! Core State and Input traits for state machine values.
//!
//! Every state and input carries a stable [`TypeTag`] naming its exact
//! variant. The engine compares and routes on tags only, never on field
//! values and never on declared ancestry.

use serde::Serialize;
use std::fmt::{self, Debug, Display};

/// Stable identifier for a state, input, or hook-owner type.
///
/// Two values have the same exact type if and only if their tags are equal.
/// Tags for abstract parents (types that group several concrete states but
/// are never themselves current) are ordinary tags that only appear in a
/// state's [`State::lineage`] and as hook owners.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::TypeTag;
///
/// const IDLE: TypeTag = TypeTag::new("Idle");
///
/// assert_eq!(IDLE.name(), "Idle");
/// assert_eq!(IDLE, TypeTag::new("Idle"));
/// assert_ne!(IDLE, TypeTag::new("Vending"));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeTag(&'static str);

impl TypeTag {
    /// Create a tag from a static name.
    pub const fn new(name: &'static str) -> Self {
        TypeTag(name)
    }

    /// The name this tag was created with.
    pub const fn name(&self) -> &'static str {
        self.0
    }
}

impl Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Trait for state machine states.
///
/// States are immutable values. A handler produces a fresh state for every
/// candidate transition; the engine never mutates one in place.
///
/// # Required Traits
///
/// - `Clone`: the engine hands owned copies to handlers, hooks and observers
/// - `Debug`: states must be debuggable for diagnostics
/// - `Send` + `Sync`: a machine may be driven from any thread
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::{State, TypeTag};
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum DoorState {
///     Open,
///     Closed,
///     Locked { code: u32 },
/// }
///
/// const SECURED: TypeTag = TypeTag::new("Secured");
///
/// impl State for DoorState {
///     fn kind(&self) -> TypeTag {
///         match self {
///             Self::Open => TypeTag::new("Open"),
///             Self::Closed => TypeTag::new("Closed"),
///             Self::Locked { .. } => TypeTag::new("Locked"),
///         }
///     }
///
///     fn lineage(&self) -> &'static [TypeTag] {
///         match self {
///             Self::Locked { .. } => &[SECURED],
///             _ => &[],
///         }
///     }
/// }
///
/// let locked = DoorState::Locked { code: 1234 };
/// assert_eq!(locked.name(), "Locked");
/// assert!(locked.is_a(SECURED));
/// assert!(!DoorState::Open.is_a(SECURED));
/// ```
pub trait State: Clone + Debug + Send + Sync + 'static {
    /// The exact type of this state.
    fn kind(&self) -> TypeTag;

    /// Get the state's name for display/logging.
    fn name(&self) -> &str {
        self.kind().name()
    }

    /// Declared ancestor types, nearest first.
    ///
    /// Purely descriptive: it feeds diagram tooling and the
    /// `Lineage` hook suppression policy. Routing and the commit decision
    /// ignore it.
    ///
    /// Default implementation returns an empty slice.
    fn lineage(&self) -> &'static [TypeTag] {
        &[]
    }

    /// Every concrete state tag this type can take.
    ///
    /// Builders use it to reject handlers bound to unknown tags. An empty
    /// slice (the default) disables that check.
    fn variants() -> &'static [TypeTag] {
        &[]
    }

    /// Whether this state is `tag` itself or declares it as an ancestor.
    fn is_a(&self, tag: TypeTag) -> bool {
        self.kind() == tag || self.lineage().contains(&tag)
    }

    /// Check if this is a final (terminal) state.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Check if this is an error state.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}

/// Trait for input events offered to a machine.
pub trait Input: Clone + Debug + Send + Sync + 'static {
    /// The exact type of this input.
    fn kind(&self) -> TypeTag;

    /// Get the input's name for display/logging.
    fn name(&self) -> &str {
        self.kind().name()
    }

    /// Every input tag this type can take. Empty disables builder checks.
    fn variants() -> &'static [TypeTag] {
        &[]
    }
}
