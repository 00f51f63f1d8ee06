//! Vending Machine
//!
//! This example drives a small vending machine through a purchase, a
//! cancelled transaction and an out-of-stock selection.
//!
//! Key concepts:
//! - Handlers bound to exact (state, input) pairs
//! - Hooks shared through a lineage tag fire once per transaction when the
//!   lineage suppression policy is selected
//! - Services on the blackboard (the inventory)
//! - Handler outputs survive a discarded step
//!
//! Run with: RUST_LOG=hsm_engine=debug cargo run --example vending_machine

use hsm_engine::engine::BoxError;
use hsm_engine::{
    input_enum, state_enum, Context, LogicBlock, LogicBlockBuilder, Machine, State,
    SuppressionPolicy, TypeTag,
};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const IDLE: TypeTag = TypeTag::new("Idle");
const STARTED: TypeTag = TypeTag::new("Started");
const VENDING: TypeTag = TypeTag::new("Vending");
const TRANSACTION_ACTIVE: TypeTag = TypeTag::new("TransactionActive");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Item {
    Juice,
    Water,
    Candy,
}

impl Item {
    fn price(self) -> u32 {
        match self {
            Item::Juice => 4,
            Item::Water => 2,
            Item::Candy => 6,
        }
    }
}

state_enum! {
    enum Vend {
        Idle,
        Started { item: Item, price: u32 },
        Vending { item: Item },
    }
    lineage: { Started => [TransactionActive] }
}

input_enum! {
    enum Event {
        SelectionEntered { item: Item },
        PaymentReceived { amount: u32 },
        VendingCompleted,
        Cancel,
    }
}

#[derive(Clone, Debug)]
enum Notice {
    TransactionStarted { item: Item, price: u32 },
    TransactionCompleted { item: Item, amount_paid: u32 },
    TransactionCancelled { item: Item },
    OutOfStock { item: Item },
    Dispensed { item: Item, remaining: u32 },
}

struct Inventory(Mutex<HashMap<Item, u32>>);

struct VendingMachine;

impl Machine for VendingMachine {
    type State = Vend;
    type Input = Event;
    type Output = Notice;

    fn describe(state: &Vend, ctx: &Context<Self>) {
        match *state {
            Vend::Started { item, price } => {
                ctx.on_enter(TRANSACTION_ACTIVE, move |_, ctx| {
                    ctx.output(Notice::TransactionStarted { item, price });
                    Ok(())
                });
            }
            Vend::Vending { item } => {
                ctx.on_enter_async(VENDING, move |_, ctx: Context<VendingMachine>| async move {
                    let inventory = ctx.get::<Inventory>()?;
                    let remaining = {
                        let mut stock = inventory.0.lock().map_err(|_| "inventory poisoned")?;
                        let count = stock.entry(item).or_insert(0);
                        *count = count.saturating_sub(1);
                        *count
                    };
                    ctx.output(Notice::Dispensed { item, remaining });
                    Ok::<_, BoxError>(())
                });
            }
            Vend::Idle => {}
        }
    }
}

fn build(stock: HashMap<Item, u32>) -> LogicBlock<VendingMachine> {
    LogicBlockBuilder::<VendingMachine>::new()
        .name("vending-demo")
        .suppression(SuppressionPolicy::Lineage)
        .service(Inventory(Mutex::new(stock)))
        .initial(|_| Vend::Idle)
        .on(IDLE, TypeTag::new("SelectionEntered"), |state, event, ctx| {
            let Event::SelectionEntered { item } = *event else {
                return Ok(state.clone());
            };
            let in_stock = ctx
                .get::<Inventory>()?
                .0
                .lock()
                .map_err(|_| "inventory poisoned")?
                .get(&item)
                .is_some_and(|count| *count > 0);
            if !in_stock {
                // Stays Idle, so the step is discarded but this output is kept.
                ctx.output(Notice::OutOfStock { item });
                return Ok(Vend::Idle);
            }
            Ok(Vend::Started { item, price: item.price() })
        })
        .unwrap()
        .on(STARTED, TypeTag::new("PaymentReceived"), |state, event, ctx| {
            match (state, event) {
                (Vend::Started { item, price }, Event::PaymentReceived { amount }) if amount >= price => {
                    ctx.output(Notice::TransactionCompleted { item: *item, amount_paid: *amount });
                    Ok(Vend::Vending { item: *item })
                }
                _ => Ok(state.clone()),
            }
        })
        .unwrap()
        .on(STARTED, TypeTag::new("Cancel"), |state, _, ctx| {
            if let Vend::Started { item, .. } = *state {
                ctx.output(Notice::TransactionCancelled { item });
            }
            Ok(Vend::Idle)
        })
        .unwrap()
        .on(VENDING, TypeTag::new("VendingCompleted"), |_, _, _| Ok(Vend::Idle))
        .unwrap()
        .build()
        .unwrap()
}

async fn feed(block: &LogicBlock<VendingMachine>, label: &str, events: Vec<Event>) {
    println!("--- {label} ---");
    for event in events {
        println!("  > {:?}", event);
        block.enqueue(event);
    }
    let state = block.process().await;
    println!("  state: {} ({:?})\n", state.name(), state);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("=== Vending Machine ===\n");

    let stock = HashMap::from([(Item::Juice, 1), (Item::Water, 3), (Item::Candy, 0)]);
    let block = build(stock);

    block.subscribe_fn(
        |notice| println!("  < {:?}", notice),
        |_| {},
        |error| println!("  ! {error}"),
    );

    println!("Handlers:");
    for (state, input) in block.capabilities() {
        println!("  {state} + {input}");
    }
    println!();

    feed(
        &block,
        "Buy juice",
        vec![
            Event::SelectionEntered { item: Item::Juice },
            Event::PaymentReceived { amount: 4 },
            Event::VendingCompleted,
        ],
    )
    .await;

    feed(
        &block,
        "Juice is sold out",
        vec![Event::SelectionEntered { item: Item::Juice }],
    )
    .await;

    feed(
        &block,
        "Change of heart",
        vec![
            Event::SelectionEntered { item: Item::Water },
            Event::PaymentReceived { amount: 1 },
            Event::Cancel,
        ],
    )
    .await;

    feed(
        &block,
        "Candy was never stocked",
        vec![Event::SelectionEntered { item: Item::Candy }],
    )
    .await;

    println!("Path: {:?}", block.history().get_path());
    match block.history().to_json() {
        Ok(json) => println!("History:\n{json}"),
        Err(err) => println!("History could not be exported: {err}"),
    }

    println!("\n=== Example Complete ===");
}
