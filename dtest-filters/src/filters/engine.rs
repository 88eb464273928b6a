//! The rule chain and its evaluation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use dtest_core::{Message, NodeId, Verb};

use super::builder::FilterBuilder;
use super::rule::{
    Direction, Filter, FilterAction, FilterDescription, FilterHandle, MessageMatcher, Scope,
    Verdict,
};

type FilterList = Arc<Vec<Arc<Filter>>>;

/// Ordered set of message filter rules shared by every node of a cluster.
///
/// Cloning is cheap and clones share the same rules, so one engine can be
/// handed to each simulated node thread.
///
/// # Evaluation
///
/// Rules are consulted in insertion order. A rule is skipped when it is
/// disabled, when it belongs to the other direction, or when the message
/// verb, source or destination falls outside its scope. For an in-scope rule
/// the content predicate runs next; if it fails the scan continues with the
/// next rule. The first rule whose whole chain succeeds decides the outcome.
/// With no match the message is delivered.
///
/// # Concurrency
///
/// Decisions may be taken from any number of threads at once. Each one works
/// on a snapshot of the rule list and holds no lock while predicates run, so
/// a predicate may itself call back into the engine.
///
/// # Example
///
/// ```
/// use dtest_core::Message;
/// use dtest_filters::MessageFilters;
///
/// let filters = MessageFilters::new();
/// filters.verbs([1]).from([1]).to([2]).drop();
///
/// assert!(!filters.permit_outbound(1, 2, &Message::new(1, "m")));
/// assert!(filters.permit_outbound(1, 2, &Message::new(2, "m")));
/// assert!(filters.permit_outbound(2, 1, &Message::new(1, "m")));
/// ```
#[derive(Clone, Default)]
pub struct MessageFilters {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    filters: RwLock<FilterList>,
    next_id: AtomicU64,
}

impl MessageFilters {
    /// Create an engine with no rules; everything is permitted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a rule that applies to the given verbs.
    pub fn verbs(&self, verbs: impl IntoIterator<Item = Verb>) -> FilterBuilder {
        FilterBuilder::new(self.clone(), Scope::only(verbs))
    }

    /// Start a rule that applies to every verb.
    pub fn all_verbs(&self) -> FilterBuilder {
        FilterBuilder::new(self.clone(), Scope::Any)
    }

    /// Whether `message` may be received by `to` from `from`.
    pub fn permit_inbound(&self, from: NodeId, to: NodeId, message: &Message) -> bool {
        self.evaluate(Direction::Inbound, from, to, message).permits()
    }

    /// Whether `message` may be sent by `from` to `to`.
    pub fn permit_outbound(&self, from: NodeId, to: NodeId, message: &Message) -> bool {
        self.evaluate(Direction::Outbound, from, to, message).permits()
    }

    /// Run the rule chain for one transfer and return the decision.
    ///
    /// Delay durations from suppliers are computed here, once per call.
    pub fn evaluate(
        &self,
        direction: Direction,
        from: NodeId,
        to: NodeId,
        message: &Message,
    ) -> Verdict {
        let filters = self.snapshot();
        let Some(filter) = filters
            .iter()
            .find(|filter| filter.matches(direction, from, to, message))
        else {
            return Verdict::Deliver;
        };

        let verdict = filter.verdict(from, to, message);
        tracing::debug!(
            filter = filter.id,
            %direction,
            from,
            to,
            verb = message.verb(),
            id = message.id(),
            ?verdict,
            "message filtered"
        );
        verdict
    }

    /// Remove every rule. Existing handles stay usable but no longer matter.
    pub fn reset(&self) {
        let mut filters = self.write();
        let cleared = filters.len();
        *filters = FilterList::default();
        tracing::debug!(cleared, "message filters reset");
    }

    /// Number of registered rules, enabled or not.
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Whether no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Describe every registered rule in evaluation order.
    pub fn describe(&self) -> Vec<FilterDescription> {
        self.snapshot()
            .iter()
            .map(|filter| filter.describe())
            .collect()
    }

    pub(crate) fn register(
        &self,
        direction: Direction,
        verbs: Scope<Verb>,
        from: Scope<NodeId>,
        to: Scope<NodeId>,
        matcher: Option<MessageMatcher>,
        action: FilterAction,
    ) -> FilterHandle {
        // Ids are taken under the write lock so they follow chain order.
        let mut filters = self.write();
        let filter = Arc::new(Filter {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            direction,
            verbs,
            from,
            to,
            matcher,
            action,
            enabled: AtomicBool::new(true),
        });

        // Copies the list only while an evaluation still holds the old one.
        Arc::make_mut(&mut *filters).push(filter.clone());
        drop(filters);

        tracing::debug!(?filter, "message filter registered");
        FilterHandle::new(filter)
    }

    fn snapshot(&self) -> FilterList {
        self.inner
            .filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, FilterList> {
        self.inner
            .filters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MessageFilters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageFilters")
            .field("filters", &self.snapshot())
            .finish()
    }
}
