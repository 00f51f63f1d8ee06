//! Engine configuration.

use crate::core::{State, TypeTag};

/// How a hook's owner is compared against the other end of a transition
/// when deciding whether to skip it.
///
/// Exit hooks are compared against the incoming state, enter hooks against
/// the outgoing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuppressionPolicy {
    /// Skip only when the owner equals the other state's exact type.
    #[default]
    ExactType,
    /// Skip when the other state is the owner or declares it in its lineage,
    /// so hooks shared by sibling states fire once on the way in and out.
    Lineage,
}

impl SuppressionPolicy {
    /// Whether a hook owned by `owner` is skipped for a transition whose
    /// other end is `other`.
    pub fn suppresses<S: State>(self, owner: TypeTag, other: &S) -> bool {
        match self {
            SuppressionPolicy::ExactType => owner == other.kind(),
            SuppressionPolicy::Lineage => other.is_a(owner),
        }
    }
}

/// Runtime settings for one machine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Label used in log spans
    pub name: String,
    pub suppression: SuppressionPolicy,
    /// Treat panics in handlers and hooks as recorded failures
    pub catch_panics: bool,
    /// Keep at most this many transitions in the history, dropping the oldest
    pub history_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "machine".to_string(),
            suppression: SuppressionPolicy::default(),
            catch_panics: true,
            history_limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIVE: TypeTag = TypeTag::new("Active");

    #[derive(Clone, Debug)]
    enum TestState {
        Started,
        Pending,
        Done,
    }

    impl State for TestState {
        fn kind(&self) -> TypeTag {
            match self {
                Self::Started => TypeTag::new("Started"),
                Self::Pending => TypeTag::new("Pending"),
                Self::Done => TypeTag::new("Done"),
            }
        }

        fn lineage(&self) -> &'static [TypeTag] {
            match self {
                Self::Started | Self::Pending => &[ACTIVE],
                Self::Done => &[],
            }
        }
    }

    #[test]
    fn exact_type_compares_only_the_endpoint() {
        let policy = SuppressionPolicy::ExactType;

        assert!(policy.suppresses(TypeTag::new("Pending"), &TestState::Pending));
        assert!(!policy.suppresses(ACTIVE, &TestState::Pending));
    }

    #[test]
    fn lineage_includes_declared_ancestors() {
        let policy = SuppressionPolicy::Lineage;

        assert!(policy.suppresses(TypeTag::new("Pending"), &TestState::Pending));
        assert!(policy.suppresses(ACTIVE, &TestState::Started));
        assert!(!policy.suppresses(ACTIVE, &TestState::Done));
    }

    #[test]
    fn default_config_catches_panics() {
        let config = EngineConfig::default();

        assert!(config.catch_panics);
        assert_eq!(config.suppression, SuppressionPolicy::ExactType);
        assert_eq!(config.history_limit, None);
    }

    #[test]
    fn default_policy_refires_hooks_shared_through_lineage() {
        let policy = SuppressionPolicy::default();

        assert!(!policy.suppresses(ACTIVE, &TestState::Started));
        assert!(policy.suppresses(TypeTag::new("Started"), &TestState::Started));
    }
}
