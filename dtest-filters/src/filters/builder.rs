//! Fluent construction of filter rules.

use std::sync::Arc;
use std::time::Duration;

use dtest_core::{Message, NodeId, Verb};

use super::engine::MessageFilters;
use super::rule::{DelaySource, Direction, FilterAction, FilterHandle, MessageMatcher, Scope};

/// Accumulates the scope of a rule until a terminal action registers it.
///
/// Created by [`MessageFilters::verbs`] or [`MessageFilters::all_verbs`].
/// Every step consumes the builder and returns a new one, so nothing is
/// shared between concurrent configuration calls and nothing reaches the
/// engine before [`drop`](Self::drop), [`delay`](Self::delay) or
/// [`delay_with`](Self::delay_with).
///
/// # Panics
///
/// Setting the direction, the source set, the destination set or the content
/// predicate more than once panics at the offending call.
#[must_use = "a filter is only registered by drop(), delay() or delay_with()"]
pub struct FilterBuilder {
    filters: MessageFilters,
    verbs: Scope<Verb>,
    direction: Option<Direction>,
    from: Option<Scope<NodeId>>,
    to: Option<Scope<NodeId>>,
    matcher: Option<MessageMatcher>,
}

impl FilterBuilder {
    pub(crate) fn new(filters: MessageFilters, verbs: Scope<Verb>) -> Self {
        Self {
            filters,
            verbs,
            direction: None,
            from: None,
            to: None,
            matcher: None,
        }
    }

    /// Scope the rule to inbound (`true`) or outbound (`false`) traffic.
    ///
    /// Rules are outbound when this is never called.
    pub fn inbound(mut self, inbound: bool) -> Self {
        assert!(
            self.direction.is_none(),
            "filter direction is already set to {}",
            self.direction.unwrap_or_default()
        );
        self.direction = Some(Direction::from_inbound(inbound));
        self
    }

    /// Only match messages sent by one of `nodes`.
    pub fn from(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        assert!(self.from.is_none(), "filter source nodes are already set");
        self.from = Some(Scope::only(nodes));
        self
    }

    /// Only match messages addressed to one of `nodes`.
    pub fn to(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        assert!(self.to.is_none(), "filter destination nodes are already set");
        self.to = Some(Scope::only(nodes));
        self
    }

    /// Only match messages for which `matcher(from, to, message)` is true.
    ///
    /// The predicate runs only when verb, direction and nodes already match,
    /// exactly once per evaluation. A panic inside it propagates to the
    /// caller of the permit check.
    pub fn messages_matching<F>(mut self, matcher: F) -> Self
    where
        F: Fn(NodeId, NodeId, &Message) -> bool + Send + Sync + 'static,
    {
        assert!(
            self.matcher.is_none(),
            "filter content predicate is already set"
        );
        self.matcher = Some(Arc::new(matcher));
        self
    }

    /// Register the rule so that matching messages are dropped.
    pub fn drop(self) -> FilterHandle {
        self.register(FilterAction::Drop)
    }

    /// Register the rule so that matching messages are delayed by `delay`.
    pub fn delay(self, delay: Duration) -> FilterHandle {
        self.register(FilterAction::Delay(DelaySource::Fixed(delay)))
    }

    /// Register the rule so that matching messages are delayed by the
    /// duration `supplier(from, to, message)` returns.
    pub fn delay_with<F>(self, supplier: F) -> FilterHandle
    where
        F: Fn(NodeId, NodeId, &Message) -> Duration + Send + Sync + 'static,
    {
        self.register(FilterAction::Delay(DelaySource::Computed(Arc::new(
            supplier,
        ))))
    }

    fn register(self, action: FilterAction) -> FilterHandle {
        let Self {
            filters,
            verbs,
            direction,
            from,
            to,
            matcher,
        } = self;
        filters.register(
            direction.unwrap_or_default(),
            verbs,
            from.unwrap_or_default(),
            to.unwrap_or_default(),
            matcher,
            action,
        )
    }
}

impl std::fmt::Debug for FilterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterBuilder")
            .field("verbs", &self.verbs)
            .field("direction", &self.direction)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("matcher", &self.matcher.is_some())
            .finish_non_exhaustive()
    }
}
