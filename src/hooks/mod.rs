//! Consumption primitives for UI layers.
//!
//! - [`Poller`]: a query that loads once and re-loads on an interval,
//!   publishing [`QueryState`] through a `tokio::sync::watch` channel.
//! - [`ActionTracker`] / [`ExamActions`]: mutations with observable
//!   [`ActionState`] and optional success/error handlers.

pub mod action;
pub mod polling;

pub use action::{ActionState, ActionTracker, ExamActions};
pub use polling::{PollOptions, Poller, QueryState, DEFAULT_POLL_INTERVAL};
