//! Rule-based message filters.
//!
//! A test scripts the network between simulated nodes by registering rules:
//!
//! ```
//! use std::time::Duration;
//! use dtest_core::Message;
//! use dtest_filters::MessageFilters;
//!
//! let filters = MessageFilters::new();
//!
//! // isolate node 3 from everyone, on the receiving side
//! let partition = filters.all_verbs().inbound(true).from([3]).drop();
//!
//! // slow down verb 7 between nodes 1 and 2 when the payload says so
//! filters
//!     .verbs([7])
//!     .from([1])
//!     .to([2])
//!     .messages_matching(|_, _, msg| msg.bytes().starts_with(b"slow"))
//!     .delay(Duration::from_millis(200));
//!
//! assert!(!filters.permit_inbound(3, 1, &Message::new(1, "x")));
//! partition.off();
//! assert!(filters.permit_inbound(3, 1, &Message::new(1, "x")));
//! ```
//!
//! | Step | Method | Default |
//! |------|--------|---------|
//! | Verb scope | [`MessageFilters::verbs`], [`MessageFilters::all_verbs`] | required |
//! | Direction | [`FilterBuilder::inbound`] | outbound |
//! | Source nodes | [`FilterBuilder::from`] | any |
//! | Destination nodes | [`FilterBuilder::to`] | any |
//! | Content predicate | [`FilterBuilder::messages_matching`] | always true |
//! | Action | [`FilterBuilder::drop`], [`FilterBuilder::delay`], [`FilterBuilder::delay_with`] | required |

mod builder;
mod engine;
mod rule;

pub use builder::FilterBuilder;
pub use engine::MessageFilters;
pub use rule::{
    ActionKind, DelaySource, DelaySupplier, Direction, FilterAction, FilterDescription,
    FilterHandle, MessageMatcher, Verdict,
};
