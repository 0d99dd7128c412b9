//! State tester wired to a plain store.

use stato::{
    Action, ActionResult, ActionStatus, Config, Error, Result, StatusState, Store,
    testing::{ActionTester, Mismatch, StateExpectation, StateTester},
};

#[derive(Debug, Clone, PartialEq, Default)]
struct Cart {
    items: Vec<String>,
    status: Option<ActionStatus>,
}

impl StatusState for Cart {
    fn last_status(&self) -> Option<&ActionStatus> {
        self.status.as_ref()
    }
}

fn cart(mut state: Cart, action: &Action<String>) -> Cart {
    match (action.action_type().as_str(), action.payload()) {
        ("ADD_ITEM", Some(item)) => state.items.push(item.clone()),
        ("CLEAR", _) => state.items.clear(),
        _ => {}
    }
    state.status = Some(ActionStatus::of(action));
    state
}

fn item(name: &str) -> Action<String> {
    Action::new("ADD_ITEM").with_payload(name.to_string())
}

#[tokio::test]
async fn skipped_changes_are_not_checked() -> Result {
    let states = StateTester::<Cart>::new();
    states.expect_state_after_action("ADD_ITEM", Some(ActionResult::Ok));
    states.expect(
        StateExpectation::after_skipping(1)
            .at_iteration(3)
            .with_assertion(|_, cart: &Cart, _| assert_eq!(cart.items, ["apple", "pear", "plum"])),
    );
    states.expect_state(
        0,
        Some(Cart {
            items: Vec::new(),
            status: Some(ActionStatus::new("CLEAR", ActionResult::Ok)),
        }),
    );

    let mut store = Store::new(Config::default(), Cart::default(), cart);
    store.subscribe(states.listener())?;
    store.start().await?;

    for name in ["apple", "pear", "plum"] {
        store.dispatch(item(name)).await?;
    }
    store.dispatch("CLEAR").await?;

    states.done().await?;
    assert_eq!(states.iteration(), 4);
    store.stop().await
}

#[tokio::test]
async fn getter_adapter_reads_current_state() -> Result {
    let states = StateTester::<Cart>::new();
    states.expect(StateExpectation::new().with_assertion(|_, cart: &Cart, status| {
        assert_eq!(cart.items, ["apple"]);
        assert_eq!(status, Some(&ActionStatus::new("ADD_ITEM", ActionResult::Ok)));
    }));

    let mut store = Store::new(Config::default(), Cart::default(), cart);
    let getter = store.getter();
    let mut on_change = states.on_state_change(move || getter.get());
    store.subscribe(move |_: &Cart| on_change())?;
    store.start().await?;

    store.dispatch(item("apple")).await?;
    states.done().await?;
    store.stop().await
}

#[tokio::test]
async fn unexpected_change_fails_done() -> Result {
    let states = StateTester::<Cart>::new();
    states.expect_state(0, None);

    let mut store = Store::new(Config::default(), Cart::default(), cart);
    store.subscribe(states.listener())?;
    store.start().await?;

    store.dispatch(item("apple")).await?;
    store.dispatch(item("pear")).await?;
    store.stop().await?;

    assert_eq!(states.done().await, Err(Error::ExpectationsFailed("state", 1)));
    assert_eq!(
        states.failures(),
        vec![Mismatch::UnexpectedStateChange { iteration: 2 }]
    );
    Ok(())
}

#[tokio::test]
async fn both_testers_share_one_store() -> Result {
    let actions = ActionTester::<Cart, String>::new();
    let states = StateTester::<Cart>::new();
    actions.expect("ADD_ITEM").with_payload("apple".into());
    actions.expect("CLEAR").without_payload();
    states.expect_state(1, Some(Cart {
        items: Vec::new(),
        status: Some(ActionStatus::new("CLEAR", ActionResult::Ok)),
    }));

    let mut store = Store::new(Config::default(), Cart::default(), actions.layer(cart));
    store.subscribe(states.listener())?;
    store.start().await?;

    store.dispatch(item("apple")).await?;
    store.dispatch("CLEAR").await?;

    actions.done().await?;
    states.done().await?;
    assert_eq!(actions.counters().total, 2);
    store.stop().await
}
