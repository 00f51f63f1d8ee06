//! Property-based tests for the processing engine.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated input sequences.

use chrono::Utc;
use hsm_engine::{
    input_enum, state_enum, Context, Input, LogicBlock, LogicBlockBuilder, Machine, State,
    StateHistory, StateTransition, SuppressionPolicy, TypeTag,
};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};

const RED: TypeTag = TypeTag::new("Red");
const GREEN: TypeTag = TypeTag::new("Green");
const YELLOW: TypeTag = TypeTag::new("Yellow");
const FLASHING: TypeTag = TypeTag::new("Flashing");
const LIT: TypeTag = TypeTag::new("Lit");

const TICK: TypeTag = TypeTag::new("Tick");
const FAULT: TypeTag = TypeTag::new("Fault");
const RESET: TypeTag = TypeTag::new("Reset");
const NUDGE: TypeTag = TypeTag::new("Nudge");

state_enum! {
    enum Signal {
        Red,
        Green,
        Yellow,
        Flashing { cycles: u32 },
    }
    lineage: { Red => [Lit], Green => [Lit], Yellow => [Lit] }
}

input_enum! {
    enum Cmd {
        Tick,
        Fault,
        Reset,
        Nudge,
    }
}

struct Crossing;

impl Machine for Crossing {
    type State = Signal;
    type Input = Cmd;
    type Output = String;

    fn describe(state: &Signal, ctx: &Context<Self>) {
        let kind = state.kind();
        ctx.on_enter(kind, move |previous, ctx| {
            ctx.output(format!("{} -> {kind}", previous.name()));
            Ok(())
        });
        if state.is_a(LIT) {
            ctx.on_exit(LIT, |next, ctx| {
                ctx.output(format!("lamps off for {}", next.name()));
                Ok(())
            });
        }
    }
}

fn crossing(policy: SuppressionPolicy) -> LogicBlock<Crossing> {
    let mut builder = LogicBlockBuilder::<Crossing>::new()
        .suppression(policy)
        .initial(|_| Signal::Red)
        .on(RED, TICK, |_, _, _| Ok(Signal::Green))
        .unwrap()
        .on(GREEN, TICK, |_, _, _| Ok(Signal::Yellow))
        .unwrap()
        .on(YELLOW, TICK, |_, _, _| Ok(Signal::Red))
        .unwrap()
        .on(FLASHING, RESET, |_, _, _| Ok(Signal::Red))
        .unwrap()
        .on(FLASHING, NUDGE, |state, _, ctx| {
            ctx.output("nudged".to_string());
            match state {
                Signal::Flashing { cycles } => Ok(Signal::Flashing { cycles: cycles + 1 }),
                other => Ok(other.clone()),
            }
        })
        .unwrap();
    for lit in [RED, GREEN, YELLOW] {
        builder = builder
            .on(lit, FAULT, |_, _, _| Ok(Signal::Flashing { cycles: 0 }))
            .unwrap();
    }
    builder.build().unwrap()
}

fn run(block: &LogicBlock<Crossing>, inputs: &[Cmd]) -> (Signal, Vec<String>, Vec<String>) {
    let outputs = Arc::new(Mutex::new(Vec::new()));
    let handled = Arc::new(Mutex::new(Vec::new()));
    let (out_sink, handled_sink) = (Arc::clone(&outputs), Arc::clone(&handled));
    block.subscribe_fn(
        move |o: &String| out_sink.lock().unwrap().push(o.clone()),
        move |i: &Cmd| handled_sink.lock().unwrap().push(i.name().to_string()),
        |_| {},
    );

    for input in inputs {
        block.enqueue(input.clone());
    }
    let state = block.process_blocking();

    let outputs = outputs.lock().unwrap().clone();
    let handled = handled.lock().unwrap().clone();
    (state, outputs, handled)
}

prop_compose! {
    fn arbitrary_cmd()(variant in 0..4u8) -> Cmd {
        match variant {
            0 => Cmd::Tick,
            1 => Cmd::Fault,
            2 => Cmd::Reset,
            _ => Cmd::Nudge,
        }
    }
}

fn arbitrary_policy() -> impl Strategy<Value = SuppressionPolicy> {
    prop_oneof![
        Just(SuppressionPolicy::Lineage),
        Just(SuppressionPolicy::ExactType),
    ]
}

proptest! {
    #[test]
    fn processing_is_deterministic(
        inputs in prop::collection::vec(arbitrary_cmd(), 0..30),
        policy in arbitrary_policy(),
    ) {
        let first = run(&crossing(policy), &inputs);
        let second = run(&crossing(policy), &inputs);

        prop_assert_eq!(first, second);
    }

    #[test]
    fn handled_inputs_keep_enqueue_order(inputs in prop::collection::vec(arbitrary_cmd(), 0..30)) {
        let block = crossing(SuppressionPolicy::Lineage);
        let (_, _, handled) = run(&block, &inputs);

        let mut remaining = inputs.iter().map(|i| i.name().to_string());
        for name in &handled {
            prop_assert!(remaining.any(|candidate| &candidate == name));
        }
        prop_assert!(block.errors().is_empty());
        prop_assert_eq!(block.pending(), 0);
    }

    #[test]
    fn history_path_is_connected(inputs in prop::collection::vec(arbitrary_cmd(), 0..30)) {
        let block = crossing(SuppressionPolicy::Lineage);
        let (state, _, _) = run(&block, &inputs);
        let history = block.history();

        for pair in history.transitions().windows(2) {
            prop_assert_eq!(pair[0].to, pair[1].from);
        }
        for transition in history.transitions() {
            prop_assert_ne!(transition.from, transition.to);
        }
        let path = history.get_path();
        if let Some(first) = path.first() {
            prop_assert_eq!(*first, RED);
        }
        prop_assert_eq!(*path.last().unwrap_or(&RED), state.kind());
    }

    #[test]
    fn discarded_steps_change_nothing(nudges in 1..10usize) {
        let block = crossing(SuppressionPolicy::Lineage);
        block.enqueue(Cmd::Fault);
        block.process_blocking();

        let inputs = vec![Cmd::Nudge; nudges];
        let (state, outputs, handled) = run(&block, &inputs);

        prop_assert_eq!(state, Signal::Flashing { cycles: 0 });
        prop_assert_eq!(outputs, vec!["nudged".to_string(); nudges]);
        prop_assert_eq!(handled.len(), nudges);
        prop_assert_eq!(block.history().len(), 1);
    }

    #[test]
    fn lineage_policy_never_turns_lamps_off_between_lit_states(ticks in 1..20usize) {
        let block = crossing(SuppressionPolicy::Lineage);
        let inputs = vec![Cmd::Tick; ticks];
        let (_, outputs, _) = run(&block, &inputs);

        prop_assert!(outputs.iter().all(|o| !o.starts_with("lamps off")));
        prop_assert_eq!(outputs.len(), ticks);
    }

    #[test]
    fn exact_policy_turns_lamps_off_on_every_tick(ticks in 1..20usize) {
        let block = crossing(SuppressionPolicy::ExactType);
        let inputs = vec![Cmd::Tick; ticks];
        let (_, outputs, _) = run(&block, &inputs);

        let lamps_off = outputs.iter().filter(|o| o.starts_with("lamps off")).count();
        prop_assert_eq!(lamps_off, ticks);
    }

    #[test]
    fn history_record_is_pure(steps in 0..10usize) {
        let mut history = StateHistory::new();
        for _ in 0..steps {
            history = history.record(StateTransition {
                from: RED,
                to: GREEN,
                input: TICK,
                timestamp: Utc::now(),
            });
        }

        let extended = history.record(StateTransition {
            from: GREEN,
            to: YELLOW,
            input: TICK,
            timestamp: Utc::now(),
        });

        prop_assert_eq!(history.len(), steps);
        prop_assert_eq!(extended.len(), steps + 1);
    }
}
