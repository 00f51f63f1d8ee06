//! Macros for declaring state and input enums.

/// Generate a `State` implementation for an enum.
///
/// Each variant's tag is its own name. Variants may be unit variants or
/// carry named fields. Optional sections, in this order:
///
/// - `lineage: { Variant => [Parent, Grandparent] }` declares ancestors
/// - `final: [..]` marks terminal states
/// - `error: [..]` marks error states
///
/// # Example
///
/// ```
/// use hsm_engine::core::{State, TypeTag};
/// use hsm_engine::state_enum;
///
/// state_enum! {
///     pub enum OrderState {
///         Draft,
///         Submitted { total: u32 },
///         Paid { total: u32 },
///         Cancelled,
///     }
///     lineage: { Submitted => [Open], Paid => [Open] }
///     final: [Paid, Cancelled]
///     error: [Cancelled]
/// }
///
/// let paid = OrderState::Paid { total: 10 };
/// assert_eq!(paid.name(), "Paid");
/// assert!(paid.is_a(TypeTag::new("Open")));
/// assert!(paid.is_final());
/// assert_eq!(OrderState::variants().len(), 4);
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $({ $($field:ident : $ty:ty),* $(,)? })?
            ),* $(,)?
        }

        $(lineage: { $($child:ident => [$($ancestor:ident),* $(,)?]),* $(,)? })?
        $(final: [$($final:ident),* $(,)?])?
        $(error: [$($error:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $({ $($field: $ty),* })?
            ),*
        }

        impl $crate::core::State for $name {
            fn kind(&self) -> $crate::core::TypeTag {
                match self {
                    $(Self::$variant { .. } => $crate::core::TypeTag::new(stringify!($variant))),*
                }
            }

            fn lineage(&self) -> &'static [$crate::core::TypeTag] {
                match self {
                    $($(Self::$child { .. } => {
                        const LINEAGE: &[$crate::core::TypeTag] =
                            &[$($crate::core::TypeTag::new(stringify!($ancestor))),*];
                        LINEAGE
                    })*)?
                    #[allow(unreachable_patterns)]
                    _ => &[],
                }
            }

            fn variants() -> &'static [$crate::core::TypeTag] {
                const VARIANTS: &[$crate::core::TypeTag] =
                    &[$($crate::core::TypeTag::new(stringify!($variant))),*];
                VARIANTS
            }

            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final { .. } => true,)*)?
                    #[allow(unreachable_patterns)]
                    _ => false,
                }
            }

            fn is_error(&self) -> bool {
                match self {
                    $($(Self::$error { .. } => true,)*)?
                    #[allow(unreachable_patterns)]
                    _ => false,
                }
            }
        }
    };
}

/// Generate an `Input` implementation for an enum.
///
/// # Example
///
/// ```
/// use hsm_engine::core::Input;
/// use hsm_engine::input_enum;
///
/// input_enum! {
///     pub enum DoorInput {
///         Push,
///         Unlock { code: u32 },
///     }
/// }
///
/// assert_eq!(DoorInput::Unlock { code: 7 }.name(), "Unlock");
/// ```
#[macro_export]
macro_rules! input_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $({ $($field:ident : $ty:ty),* $(,)? })?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $({ $($field: $ty),* })?
            ),*
        }

        impl $crate::core::Input for $name {
            fn kind(&self) -> $crate::core::TypeTag {
                match self {
                    $(Self::$variant { .. } => $crate::core::TypeTag::new(stringify!($variant))),*
                }
            }

            fn variants() -> &'static [$crate::core::TypeTag] {
                const VARIANTS: &[$crate::core::TypeTag] =
                    &[$($crate::core::TypeTag::new(stringify!($variant))),*];
                VARIANTS
            }
        }
    };
}
