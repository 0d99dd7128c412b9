#![cfg_attr(docsrs, feature(doc_cfg))]
//! # Stato
//!
//! A unidirectional state store for Tokio, with testers for the actions and
//! state changes it produces.
//!
//! A [`Store`] owns the application state. Actions are dispatched into it,
//! a [`Reducer`] computes the next state, listeners are told about it, and
//! [`Effect`]s subscribed to the action's type react asynchronously,
//! typically dispatching `SUCCESS` or `ERROR` follow-ups linked to the action
//! that triggered them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stato::*;
//!
//! struct Greeter {
//!     ctx: Context<String>,
//! }
//!
//! impl Effect for Greeter {
//!     type Payload = String;
//!
//!     async fn handle_action(&mut self, action: &Action<String>) -> Result {
//!         let greeting = format!("Hello, {}!", action.payload().map_or("world", String::as_str));
//!         self.ctx.succeed(action, Some(greeting)).await?;
//!         Ok(())
//!     }
//! }
//!
//! fn greetings(mut seen: Vec<String>, action: &Action<String>) -> Vec<String> {
//!     if action.action_type() == &ActionType::SUCCESS {
//!         seen.extend(action.payload().cloned());
//!     }
//!     seen
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result {
//!     let mut store = Store::new(Config::default(), Vec::new(), greetings);
//!     store.add_effect("greeter", |ctx| Greeter { ctx }, &["GREET"])?;
//!     store.subscribe(|seen: &Vec<String>| println!("{seen:?}"))?;
//!
//!     store.start().await?;
//!     store.dispatch(Action::new("GREET").with_payload("World".to_string())).await?;
//!     store.stop().await
//! }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Store`] | Owns the state, runs the reducer and the effects |
//! | [`Action`] | Type tag, optional payload and [`Meta`] |
//! | [`ActionType`] | Action tag; `SUCCESS` and `ERROR` are the generic follow-ups |
//! | [`Reducer`] | Computes the next state; any `FnMut(S, &Action<P>) -> S` qualifies |
//! | [`Effect`] | Asynchronous reaction to dispatched actions |
//! | [`Context`] | Lets an effect dispatch actions and stop itself |
//! | [`ActionStatus`] | "Last action processed" marker kept in state |
//!
//! ## Testing
//!
//! The [`testing`] module provides an [`ActionTester`](testing::ActionTester)
//! (a tree of expected actions and follow-ups, installed as the reducer) and a
//! [`StateTester`](testing::StateTester) (a queue of expected state changes,
//! installed as a listener). See the module docs.
//!
//! ## Features
//!
//! - **`test-harness`** (default) - Action and state testers, the [`testing`] module
//! - **`serde`** - `Serialize`/`Deserialize` for actions, metadata and statuses
//!
//! ## Examples
//!
//! See the `examples/` directory:
//!
//! - `login.rs`  - Login flow driven by an effect, verified with the testers

mod action;
mod action_id;
mod action_type;
mod config;
mod context;
mod effect;
mod error;
mod meta;
mod payload;
mod reducer;
mod source_id;
mod state_getter;
mod status;
mod store;
mod subscribe;

mod internal;

#[cfg(feature = "test-harness")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-harness")))]
pub mod testing;

pub use action::Action;
pub use action_id::ActionId;
pub use action_type::{ActionCategory, ActionType};
pub use config::Config;
pub use context::Context;
pub use effect::Effect;
pub use error::Error;
pub use meta::{Meta, RelatedAction};
pub use payload::Payload;
pub use reducer::Reducer;
pub use source_id::SourceId;
pub use state_getter::StateGetter;
pub use status::{ActionResult, ActionStatus, StatusState};
pub use store::Store;
pub use subscribe::Subscribe;

/// Convenience alias for `Result<T, stato::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
