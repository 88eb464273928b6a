use std::sync::{Arc, Mutex};

use dtest_filters::{AddressAndPort, Delivery, Envelope, Message, NetworkConfiguration};

use crate::{address, cluster};

#[test]
fn test_sink_receives_permitted_messages() {
    let (network, mut inboxes) = cluster(2, NetworkConfiguration::fast_local());
    let captured: Arc<Mutex<Vec<(AddressAndPort, Envelope)>>> = Arc::default();
    let sink = captured.clone();
    network.set_message_sink(move |to: AddressAndPort, envelope: Envelope| {
        sink.lock().expect("sink lock").push((to, envelope));
    });
    network.filters().verbs([9]).drop();

    assert_eq!(
        network.send(1, 2, Message::new(3, "captured")),
        Ok(Delivery::Delivered)
    );
    assert_eq!(
        network.send(1, 2, Message::new(9, "dropped")),
        Ok(Delivery::Dropped(dtest_filters::Direction::Outbound))
    );

    let captured = captured.lock().expect("sink lock");
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].0, address(2));
    assert_eq!(captured[0].1.message.verb(), 3);
    assert!(inboxes[1].try_recv().is_none());
}

#[test]
fn test_sink_can_reinject_with_deliver() {
    let (network, mut inboxes) = cluster(2, NetworkConfiguration::fast_local());
    let reinject = network.clone();
    network.set_message_sink(move |to: AddressAndPort, envelope: Envelope| {
        assert!(reinject.deliver(&to, envelope));
    });

    network
        .send(2, 1, Message::new(4, "through the sink"))
        .expect("send");
    assert_eq!(inboxes[0].try_recv().map(|e| e.from), Some(2));

    network.clear_message_sink();
    network.send(2, 1, Message::new(5, "direct")).expect("send");
    assert_eq!(inboxes[0].try_recv().map(|e| e.message.verb()), Some(5));
}

#[test]
fn test_deliver_bypasses_filters() {
    let (network, mut inboxes) = cluster(2, NetworkConfiguration::fast_local());
    network.filters().all_verbs().drop();
    network.filters().all_verbs().inbound(true).drop();

    let envelope = Envelope {
        from: 1,
        to: 2,
        message: Message::new(1, "forced"),
    };
    assert!(network.deliver(&address(2), envelope.clone()));
    assert_eq!(inboxes[1].try_recv(), Some(envelope.clone()));

    assert!(!network.deliver(&address(7), envelope));
}
