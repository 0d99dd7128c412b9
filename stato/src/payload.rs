use std::fmt::Debug;

/// Bound for action payloads carried by a [`Store`](crate::Store).
///
/// Payloads must be:
/// - `Send + Sync + 'static`, because actions travel as `Arc<Action<P>>`
///   between the store loop and effect tasks
/// - `Clone`, so testers can keep the expected payload next to the observed one
/// - `PartialEq + Debug`, so testers can compare payloads and report mismatches
///
/// Implemented automatically for every type meeting those bounds. A typical
/// payload is an enum covering every action of the application:
///
/// ```rust
/// #[derive(Clone, Debug, PartialEq)]
/// enum AuthPayload {
///     Credentials { user: String },
///     Session(u64),
///     Failure(String),
/// }
///
/// fn assert_payload<P: stato::Payload>() {}
/// assert_payload::<AuthPayload>();
/// ```
pub trait Payload: Send + Sync + Clone + PartialEq + Debug + 'static {}

impl<T> Payload for T where T: Send + Sync + Clone + PartialEq + Debug + 'static {}
