use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use dtest_filters::MessageFilters;

use crate::{msg, MSG1, VERB1};

const THREADS: u32 = 8;
const CALLS_PER_THREAD: usize = 500;

#[test]
fn test_concurrent_decisions_from_node_threads() {
    let filters = MessageFilters::new();
    let evaluations = Arc::new(AtomicUsize::new(0));
    let calls = evaluations.clone();
    filters
        .verbs([VERB1])
        .from([1])
        .messages_matching(move |_, _, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            true
        })
        .drop();

    thread::scope(|s| {
        for node in 1..=THREADS {
            let filters = filters.clone();
            s.spawn(move || {
                for _ in 0..CALLS_PER_THREAD {
                    let permitted = filters.permit_outbound(node, 1, &msg(VERB1, MSG1));
                    assert_eq!(permitted, node != 1);
                }
            });
        }
    });

    // only node 1's traffic reaches the predicate
    assert_eq!(evaluations.load(Ordering::SeqCst), CALLS_PER_THREAD);
}

#[test]
fn test_off_is_visible_to_other_threads() {
    let filters = MessageFilters::new();
    let handle = filters.all_verbs().inbound(true).from([2]).drop();
    let barrier = Arc::new(Barrier::new(2));

    thread::scope(|s| {
        let reader = filters.clone();
        let ready = barrier.clone();
        s.spawn(move || {
            assert!(!reader.permit_inbound(2, 3, &msg(VERB1, MSG1)));
            ready.wait();
            // the main thread disables the rule between the two waits
            ready.wait();
            assert!(reader.permit_inbound(2, 3, &msg(VERB1, MSG1)));
        });

        barrier.wait();
        handle.off();
        barrier.wait();
    });
}

#[test]
fn test_registration_while_evaluating() {
    let filters = MessageFilters::new();
    filters.all_verbs().from([1]).drop();

    thread::scope(|s| {
        let reader = filters.clone();
        s.spawn(move || {
            for _ in 0..CALLS_PER_THREAD {
                // the first rule is never removed, whatever else is added
                assert!(!reader.permit_outbound(1, 2, &msg(VERB1, MSG1)));
            }
        });

        for node in 10..60 {
            filters.all_verbs().from([node]).drop();
        }
    });

    assert_eq!(filters.len(), 51);
}

#[test]
fn test_concurrent_registration_ids_follow_chain_order() {
    let filters = MessageFilters::new();

    thread::scope(|s| {
        for node in 1..=THREADS {
            let filters = filters.clone();
            s.spawn(move || {
                for _ in 0..50 {
                    filters.all_verbs().from([node]).drop();
                }
            });
        }
    });

    let ids: Vec<u64> = filters.describe().iter().map(|rule| rule.id).collect();
    assert_eq!(ids.len(), THREADS as usize * 50);
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "{ids:?}");
}
