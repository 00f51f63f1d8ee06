//! State transition history tracking.
//!
//! Every committed transition is appended to the history of its machine.
//! Discarded candidates never appear here.

use super::state::TypeTag;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Record of a single committed transition.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::{StateTransition, TypeTag};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: TypeTag::new("Idle"),
///     to: TypeTag::new("Running"),
///     input: TypeTag::new("Start"),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.to.name(), "Running");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateTransition {
    /// The state type being left
    pub from: TypeTag,
    /// The state type being entered
    pub to: TypeTag,
    /// The input whose handler produced the new state
    pub input: TypeTag,
    /// When the transition was committed
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of committed transitions.
///
/// `record` returns a new history with the transition added and leaves the
/// original untouched.
///
/// # Example
///
/// ```rust
/// use hsm_engine::core::{StateHistory, StateTransition, TypeTag};
/// use chrono::Utc;
///
/// let history = StateHistory::new();
///
/// let history = history.record(StateTransition {
///     from: TypeTag::new("Start"),
///     to: TypeTag::new("Middle"),
///     input: TypeTag::new("Next"),
///     timestamp: Utc::now(),
/// });
///
/// let history = history.record(StateTransition {
///     from: TypeTag::new("Middle"),
///     to: TypeTag::new("End"),
///     input: TypeTag::new("Next"),
///     timestamp: Utc::now(),
/// });
///
/// let path = history.get_path();
/// assert_eq!(path.len(), 3); // Start -> Middle -> End
/// ```
#[derive(Clone, Debug, Default, Serialize)]
pub struct StateHistory {
    transitions: Vec<StateTransition>,
}

impl StateHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: StateTransition) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// Append a transition in place.
    pub(crate) fn push(&mut self, transition: StateTransition) {
        self.transitions.push(transition);
    }

    /// Append in place, then drop the oldest transitions beyond `limit`.
    pub(crate) fn push_bounded(&mut self, transition: StateTransition, limit: Option<usize>) {
        self.push(transition);
        if let Some(limit) = limit {
            let excess = self.transitions.len().saturating_sub(limit);
            self.transitions.drain(..excess);
        }
    }

    /// Get the path of state types traversed.
    ///
    /// Returns the initial `from`, then the `to` of each transition.
    pub fn get_path(&self) -> Vec<TypeTag> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.first() {
            path.push(first.from);
        }
        path.extend(self.transitions.iter().map(|t| t.to));
        path
    }

    /// Duration between the first and last transition.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get all transitions in commit order.
    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Export the history as JSON, tags written by name.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INITIAL: TypeTag = TypeTag::new("Initial");
    const PROCESSING: TypeTag = TypeTag::new("Processing");
    const COMPLETE: TypeTag = TypeTag::new("Complete");
    const NEXT: TypeTag = TypeTag::new("Next");

    fn transition(from: TypeTag, to: TypeTag) -> StateTransition {
        StateTransition {
            from,
            to,
            input: NEXT,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = StateHistory::new();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn record_is_immutable() {
        let history = StateHistory::new();
        let new_history = history.record(transition(INITIAL, PROCESSING));

        assert_eq!(history.len(), 0);
        assert_eq!(new_history.len(), 1);
    }

    #[test]
    fn push_appends_in_place() {
        let mut history = StateHistory::new();
        history.push(transition(INITIAL, PROCESSING));
        history.push(transition(PROCESSING, COMPLETE));

        assert_eq!(history.len(), 2);
        assert_eq!(history.transitions()[1].to, COMPLETE);
    }

    #[test]
    fn push_bounded_keeps_newest_transitions() {
        let mut history = StateHistory::new();
        history.push_bounded(transition(INITIAL, PROCESSING), Some(2));
        history.push_bounded(transition(PROCESSING, COMPLETE), Some(2));
        history.push_bounded(transition(COMPLETE, INITIAL), Some(2));

        assert_eq!(history.get_path(), vec![PROCESSING, COMPLETE, INITIAL]);

        history.push_bounded(transition(INITIAL, PROCESSING), None);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn get_path_returns_state_sequence() {
        let history = StateHistory::new()
            .record(transition(INITIAL, PROCESSING))
            .record(transition(PROCESSING, COMPLETE));

        assert_eq!(history.get_path(), vec![INITIAL, PROCESSING, COMPLETE]);
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let history = StateHistory::new().record(transition(INITIAL, PROCESSING));

        std::thread::sleep(std::time::Duration::from_millis(10));

        let history = history.record(transition(PROCESSING, COMPLETE));

        let duration = history.duration();
        assert!(duration.is_some());
        assert!(duration.unwrap() >= std::time::Duration::from_millis(10));
    }

    #[test]
    fn single_transition_has_duration_zero() {
        let history = StateHistory::new().record(transition(INITIAL, PROCESSING));

        assert_eq!(history.duration(), Some(std::time::Duration::from_secs(0)));
    }

    #[test]
    fn history_serializes_tags_by_name() {
        let history = StateHistory::new().record(transition(INITIAL, PROCESSING));

        let json = serde_json::to_value(&history).unwrap();
        let first = &json["transitions"][0];
        assert_eq!(first["from"], "Initial");
        assert_eq!(first["to"], "Processing");
        assert_eq!(first["input"], "Next");
    }

    #[test]
    fn to_json_includes_every_transition() {
        let history = StateHistory::new()
            .record(transition(INITIAL, PROCESSING))
            .record(transition(PROCESSING, COMPLETE));

        let json = history.to_json().unwrap();

        assert!(json.contains("\"Complete\""));
        assert_eq!(json.matches("\"timestamp\"").count(), 2);
    }
}
