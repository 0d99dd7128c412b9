//! Login Example - Store, Effects and Testers
//!
//! A session store with three effects:
//!
//! - **Login**: checks credentials and answers with `SUCCESS` or `ERROR`
//! - **ProfileTrigger**: asks for the profile once a session exists
//! - **ProfileLoader**: answers `FETCH_PROFILE` with the profile
//!
//! The action tester is layered over the session reducer and holds the
//! expected flow as a tree; the state tester checks each state change in
//! order. Mismatches are logged at `ERROR` level by the testers.

use stato::{
    Action, ActionResult, ActionStatus, ActionType, Config, Context, Effect, Result, StatusState,
    Store,
    testing::{ActionTester, StateExpectation, StateTester},
};

#[derive(Debug, Clone, PartialEq)]
enum Auth {
    Credentials { user: String, password: String },
    Session { user: String },
    Denied(String),
    Profile { display_name: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Session {
    user: Option<String>,
    display_name: Option<String>,
    error: Option<String>,
    status: Option<ActionStatus>,
}

impl StatusState for Session {
    fn last_status(&self) -> Option<&ActionStatus> {
        self.status.as_ref()
    }
}

fn session(mut state: Session, action: &Action<Auth>) -> Session {
    state.status = Some(ActionStatus::of(action));
    match action.payload() {
        Some(Auth::Session { user }) => state.user = Some(user.clone()),
        Some(Auth::Profile { display_name }) => state.display_name = Some(display_name.clone()),
        Some(Auth::Denied(reason)) => state.error = Some(reason.clone()),
        _ => {}
    }
    state
}

struct Login {
    ctx: Context<Auth>,
}

impl Effect for Login {
    type Payload = Auth;

    async fn handle_action(&mut self, action: &Action<Auth>) -> Result {
        if let Some(Auth::Credentials { user, password }) = action.payload() {
            if password == "secret" {
                let session = Auth::Session { user: user.clone() };
                self.ctx.succeed(action, Some(session)).await?;
            } else {
                self.ctx.fail(action, Auth::Denied(format!("wrong password for {user}"))).await?;
            }
        }
        Ok(())
    }
}

struct ProfileTrigger {
    ctx: Context<Auth>,
}

impl Effect for ProfileTrigger {
    type Payload = Auth;

    async fn handle_action(&mut self, action: &Action<Auth>) -> Result {
        if let Some(session @ Auth::Session { .. }) = action.payload() {
            let fetch = Action::new("FETCH_PROFILE")
                .with_payload(session.clone())
                .with_related(action);
            self.ctx.dispatch(fetch).await?;
        }
        Ok(())
    }
}

struct ProfileLoader {
    ctx: Context<Auth>,
}

impl Effect for ProfileLoader {
    type Payload = Auth;

    async fn handle_action(&mut self, action: &Action<Auth>) -> Result {
        if let Some(Auth::Session { user }) = action.payload() {
            let profile = Auth::Profile {
                display_name: format!("{user} (verified)"),
            };
            self.ctx.succeed(action, Some(profile)).await?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let actions = ActionTester::<Session, Auth>::new();
    let states = StateTester::<Session>::new();

    let mut store = Store::new(Config::default(), Session::default(), actions.layer(session));
    store.add_effect("login", |ctx| Login { ctx }, &["LOGIN"])?;
    store.add_effect("profile-trigger", |ctx| ProfileTrigger { ctx }, [ActionType::SUCCESS])?;
    store.add_effect("profile-loader", |ctx| ProfileLoader { ctx }, &["FETCH_PROFILE"])?;
    store.subscribe(states.listener())?;
    store.subscribe(|state: &Session| println!("  state: {state:?}"))?;

    println!("=== Expected flow ===");
    actions
        .expect("LOGIN")
        .then_on_success()
        .then_follow_up("FETCH_PROFILE")
        .then_on_success()
        .with_validator(|counter, state: Session, _| {
            println!("  profile loaded (success #{counter})");
            state
        });

    states.expect_state_after_action("LOGIN", Some(ActionResult::Ok));
    states.expect(
        StateExpectation::after_action("LOGIN")
            .with_assertion(|_, state: &Session, _| assert_eq!(state.user.as_deref(), Some("alice"))),
    );
    states.expect_state(1, None);

    store.start().await?;
    let login = Action::new("LOGIN").with_payload(Auth::Credentials {
        user: "alice".into(),
        password: "secret".into(),
    });
    store.dispatch(login).await?;

    actions.done().await?;
    states.done().await?;
    println!("counters: {:?}", actions.counters());
    println!("final: {:?}", store.state());

    store.stop().await
}
