//! Subscriptions to a machine's outputs, handled inputs and failures.

use super::error::LogicError;
use crate::core::Machine;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Receives notifications from a running machine.
///
/// Every method defaults to doing nothing, so observers implement only what
/// they care about. Notifications are delivered synchronously from inside
/// the drain, in the order the engine produces them.
pub trait Observer<M: Machine>: Send + Sync {
    /// An output was flushed.
    fn on_output(&self, _output: &M::Output) {}

    /// A transition was committed and `state` is now current.
    fn on_state(&self, _state: &M::State) {}

    /// An input finished processing, whether or not the state changed.
    fn on_input_handled(&self, _input: &M::Input) {}

    /// A failure was recorded in the error log.
    fn on_error(&self, _error: &LogicError) {}
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        SubscriptionId(Uuid::new_v4())
    }
}

type OutputFn<M> = Box<dyn Fn(&<M as Machine>::Output) + Send + Sync>;
type InputFn<M> = Box<dyn Fn(&<M as Machine>::Input) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&LogicError) + Send + Sync>;

/// Observer assembled from three closures.
pub struct FnObserver<M: Machine> {
    on_output: OutputFn<M>,
    on_input_handled: InputFn<M>,
    on_error: ErrorFn,
}

impl<M: Machine> FnObserver<M> {
    pub fn new<O, I, E>(on_output: O, on_input_handled: I, on_error: E) -> Self
    where
        O: Fn(&M::Output) + Send + Sync + 'static,
        I: Fn(&M::Input) + Send + Sync + 'static,
        E: Fn(&LogicError) + Send + Sync + 'static,
    {
        Self {
            on_output: Box::new(on_output),
            on_input_handled: Box::new(on_input_handled),
            on_error: Box::new(on_error),
        }
    }
}

impl<M: Machine> Observer<M> for FnObserver<M> {
    fn on_output(&self, output: &M::Output) {
        (self.on_output)(output)
    }

    fn on_input_handled(&self, input: &M::Input) {
        (self.on_input_handled)(input)
    }

    fn on_error(&self, error: &LogicError) {
        (self.on_error)(error)
    }
}

type Entry<M> = (SubscriptionId, Arc<dyn Observer<M>>);

/// Registry of subscribed observers.
pub(crate) struct Observers<M: Machine> {
    entries: RwLock<Vec<Entry<M>>>,
}

impl<M: Machine> Observers<M> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self, observer: Arc<dyn Observer<M>>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    // Observers may subscribe or unsubscribe from inside a callback, so the
    // lock is released before any of them runs.
    fn snapshot(&self) -> Vec<Arc<dyn Observer<M>>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect()
    }

    pub(crate) fn output(&self, output: &M::Output) {
        self.snapshot().iter().for_each(|o| o.on_output(output));
    }

    pub(crate) fn state(&self, state: &M::State) {
        self.snapshot().iter().for_each(|o| o.on_state(state));
    }

    pub(crate) fn input_handled(&self, input: &M::Input) {
        self.snapshot().iter().for_each(|o| o.on_input_handled(input));
    }

    pub(crate) fn error(&self, error: &LogicError) {
        self.snapshot().iter().for_each(|o| o.on_error(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Input, State, TypeTag};
    use std::sync::Mutex;

    #[derive(Clone, Debug)]
    struct Only;

    impl State for Only {
        fn kind(&self) -> TypeTag {
            TypeTag::new("Only")
        }
    }

    #[derive(Clone, Debug)]
    struct Tick(u8);

    impl Input for Tick {
        fn kind(&self) -> TypeTag {
            TypeTag::new("Tick")
        }
    }

    struct TestMachine;

    impl Machine for TestMachine {
        type State = Only;
        type Input = Tick;
        type Output = u8;
    }

    #[test]
    fn fn_observer_forwards_notifications() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (Arc::clone(&seen), Arc::clone(&seen), Arc::clone(&seen));
        let observers = Observers::<TestMachine>::new();
        observers.subscribe(Arc::new(FnObserver::new(
            move |o: &u8| a.lock().unwrap().push(format!("output {o}")),
            move |i: &Tick| b.lock().unwrap().push(format!("input {}", i.0)),
            move |e: &LogicError| c.lock().unwrap().push(e.to_string()),
        )));

        observers.output(&7);
        observers.state(&Only);
        observers.input_handled(&Tick(3));

        assert_eq!(*seen.lock().unwrap(), vec!["output 7", "input 3"]);
    }

    #[test]
    fn unsubscribe_removes_only_that_observer() {
        let observers = Observers::<TestMachine>::new();
        let noop = || FnObserver::<TestMachine>::new(|_| {}, |_| {}, |_| {});
        let first = observers.subscribe(Arc::new(noop()));
        let _second = observers.subscribe(Arc::new(noop()));

        assert!(observers.unsubscribe(first));
        assert!(!observers.unsubscribe(first));
        assert_eq!(observers.len(), 1);
    }
}
