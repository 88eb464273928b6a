use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dtest_filters::{Message, MessageFilters, NodeId};

use crate::{msg, MSG1, MSG2, VERB1, VERB2, VERB3};

const I1: NodeId = 1;
const I2: NodeId = 2;
const I3: NodeId = 3;

type Permit = fn(&MessageFilters, NodeId, NodeId, &Message) -> bool;

fn permit_for(inbound: bool) -> Permit {
    if inbound {
        MessageFilters::permit_inbound
    } else {
        MessageFilters::permit_outbound
    }
}

#[test]
fn test_simple_inbound_filters() {
    simple_filters(true);
}

#[test]
fn test_simple_outbound_filters() {
    simple_filters(false);
}

fn simple_filters(inbound: bool) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let filters = MessageFilters::new();
    let permit = permit_for(inbound);

    let filter = filters.all_verbs().inbound(inbound).from([1]).drop();
    assert!(!permit(&filters, I1, I2, &msg(VERB1, MSG1)));
    assert!(!permit(&filters, I1, I2, &msg(VERB2, MSG1)));
    assert!(!permit(&filters, I1, I2, &msg(VERB3, MSG1)));
    assert!(permit(&filters, I2, I1, &msg(VERB1, MSG1)));
    filter.off();
    assert!(permit(&filters, I1, I2, &msg(VERB1, MSG1)));
    filters.reset();

    filters.verbs([VERB1]).inbound(inbound).from([1]).to([2]).drop();
    assert!(!permit(&filters, I1, I2, &msg(VERB1, MSG1)));
    assert!(permit(&filters, I1, I2, &msg(VERB2, MSG1)));
    assert!(permit(&filters, I2, I1, &msg(VERB1, MSG1)));
    assert!(permit(&filters, I2, I3, &msg(VERB2, MSG1)));
    filters.reset();

    let counter = Arc::new(AtomicUsize::new(0));
    let calls = counter.clone();
    filters
        .verbs([VERB1])
        .inbound(inbound)
        .from([1])
        .to([2])
        .messages_matching(move |_, _, m| {
            calls.fetch_add(1, Ordering::SeqCst);
            m.bytes() == MSG1.as_bytes()
        })
        .drop();
    assert!(!permit(&filters, I1, I2, &msg(VERB1, MSG1)));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(permit(&filters, I1, I2, &msg(VERB1, MSG2)));
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    // out-of-scope pairs never reach the content predicate
    assert!(permit(&filters, I2, I1, &msg(VERB1, MSG1)));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert!(permit(&filters, I2, I1, &msg(VERB2, MSG1)));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    filters.reset();

    filters.all_verbs().inbound(inbound).from([3, 2]).to([2, 1]).drop();
    assert!(!permit(&filters, I3, I1, &msg(VERB1, MSG1)));
    assert!(!permit(&filters, I3, I2, &msg(VERB1, MSG1)));
    assert!(!permit(&filters, I2, I1, &msg(VERB1, MSG1)));
    assert!(permit(&filters, I2, I3, &msg(VERB1, MSG1)));
    assert!(permit(&filters, I1, I2, &msg(VERB1, MSG1)));
    assert!(permit(&filters, I1, I3, &msg(VERB1, MSG1)));
    filters.reset();

    counter.store(0, Ordering::SeqCst);
    let calls = counter.clone();
    filters
        .all_verbs()
        .inbound(inbound)
        .from([1])
        .to([2])
        .messages_matching(move |_, _, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            false
        })
        .drop();
    assert!(permit(&filters, I1, I2, &msg(VERB1, MSG1)));
    assert!(permit(&filters, I1, I3, &msg(VERB1, MSG1)));
    assert!(permit(&filters, I1, I2, &msg(VERB1, MSG1)));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn test_verb_scoped_drop_between_two_nodes() {
    let filters = MessageFilters::new();
    filters.verbs([1]).from([1]).to([2]).drop();

    assert!(!filters.permit_outbound(1, 2, &msg(1, MSG1)));
    assert!(filters.permit_outbound(1, 2, &msg(2, MSG1)));
    assert!(filters.permit_outbound(2, 1, &msg(1, MSG1)));
}
