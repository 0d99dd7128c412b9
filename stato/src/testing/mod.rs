//! Action and state testers for stores.
//!
//! Enabled by the `test-harness` feature (on by default):
//!
//! ```toml
//! [dev-dependencies]
//! stato = { version = "0.1", features = ["test-harness"] }
//! ```
//!
//! - [`ActionTester`] holds a tree of expected actions and their follow-ups.
//!   Install it as (or layer it over) the store's reducer.
//! - [`StateTester`] holds a queue of expected state changes. Install its
//!   listener on the store.
//! - [`Harness`] wires both to a [`Store`](crate::Store).
//!
//! Mismatches never panic inside the store. They are logged with `tracing`,
//! recorded as [`Mismatch`] values, and reported by the tester's
//! [`Done`] future.
//!
//! # Example
//!
//! ```ignore
//! use stato::testing::Harness;
//!
//! let mut test = Harness::with_reducer(Session::default(), session_reducer);
//! test.add_effect("auth", |ctx| Auth { ctx }, &["LOGIN"])?;
//!
//! test.actions().expect("LOGIN").then_on_success().then_follow_up("FETCH_PROFILE");
//! test.states().expect_state_after_action("LOGIN", Some(ActionResult::Ok));
//!
//! test.start().await?;
//! test.dispatch(Action::new("LOGIN")).await?;
//! test.settle().await?;
//! ```
//!
//! # Warning
//!
//! **Do not use in production.** Testers keep every declared expectation and
//! recorded mismatch in memory.

mod action_tester;
mod done;
mod expectation_tree;
mod harness;
mod mismatch;
mod progress;
mod state_expectation;
mod state_tester;
mod validator;

pub use action_tester::{ActionCounters, ActionTester, ExpectedAction, Layered, TesterReducer};
pub use done::{DEFAULT_DONE_TIMEOUT, Done};
pub use harness::Harness;
pub use mismatch::Mismatch;
pub use state_expectation::StateExpectation;
pub use state_tester::StateTester;
pub use validator::{ActionValidator, StateAssertion};
