#[cfg(test)]
pub mod tests {
    use std::time::Duration;

    use devconsole::transport::{MemoryHandle, MemoryTransport};
    use devconsole::{ChannelViewer, ChannelViewerBuilder, ColorTag, ConnectionState};
    use serde_json::json;

    fn subscribed(channel: &str) -> (ChannelViewer<MemoryTransport>, MemoryHandle) {
        let (transport, server) = MemoryTransport::new();
        let mut viewer = ChannelViewer::open(transport, channel);
        viewer.poll();
        assert_eq!(viewer.state(), ConnectionState::Subscribed);
        (viewer, server)
    }

    #[test]
    fn test_open_logs_connect_and_subscribe() {
        let (viewer, _server) = subscribed("company.123");

        let entries = viewer.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "Socket is connected");
        assert_eq!(entries[0].color, ColorTag::Success);
        assert_eq!(
            entries[1].content,
            "Socket subscribed to channel 'company.123'"
        );
        assert_eq!(entries[1].color, ColorTag::Info);
    }

    #[test]
    fn test_payload_is_pretty_printed() {
        let (mut viewer, server) = subscribed("company.123");
        let before = viewer.log().len();

        assert!(server.publish("company.123", json!({ "a": 1 })));
        viewer.poll();

        assert_eq!(viewer.log().len(), before + 1);
        let entry = viewer.log().last().unwrap();
        assert_eq!(entry.content, "{\n  \"a\": 1\n}");
        assert_eq!(entry.color, ColorTag::Success);
    }

    #[test]
    fn test_messages_keep_arrival_order() {
        for n in [0usize, 1, 7, 250] {
            let (mut viewer, server) = subscribed("api.key_1");
            let before = viewer.log().len();

            for i in 0..n {
                server.publish("api.key_1", json!({ "seq": i }));
            }
            viewer.poll();

            assert_eq!(viewer.log().len(), before + n);
            let seqs: Vec<u64> = viewer
                .log()
                .iter()
                .skip(before)
                .map(|e| {
                    serde_json::from_str::<serde_json::Value>(&e.content).unwrap()["seq"]
                        .as_u64()
                        .unwrap()
                })
                .collect();
            assert_eq!(seqs, (0..n as u64).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_duplicates_are_not_collapsed() {
        let (mut viewer, server) = subscribed("company.1");
        let before = viewer.log().len();
        server.publish("company.1", json!("same"));
        server.publish("company.1", json!("same"));
        viewer.poll();
        assert_eq!(viewer.log().len(), before + 2);
    }

    #[test]
    fn test_messages_before_acknowledgment_are_ignored() {
        let (transport, server) = MemoryTransport::new();
        server.hold_acks();
        let mut viewer = ChannelViewer::open(transport, "company.1");

        server.publish("company.1", json!({ "early": true }));
        viewer.poll();
        assert_eq!(viewer.state(), ConnectionState::Connecting);
        assert_eq!(viewer.log().len(), 1);

        server.acknowledge("company.1");
        server.publish("company.1", json!({ "late": true }));
        viewer.poll();
        assert_eq!(viewer.state(), ConnectionState::Subscribed);
        assert_eq!(viewer.log().len(), 3);
    }

    #[test]
    fn test_error_appends_one_entry_and_keeps_subscription() {
        let (mut viewer, server) = subscribed("company.1");
        let before = viewer.log().len();

        server.fail(Some("ECONNRESET"));
        viewer.poll();

        assert_eq!(viewer.log().len(), before + 1);
        let entry = viewer.log().last().unwrap();
        assert_eq!(entry.color, ColorTag::Error);
        assert!(entry.content.starts_with("Socket connection error!"));
        assert_eq!(viewer.state(), ConnectionState::Errored);
        assert!(server.is_subscribed("company.1"));

        server.publish("company.1", json!(1));
        viewer.poll();
        assert_eq!(viewer.log().len(), before + 2);
    }

    #[test]
    fn test_connect_failure_errors_without_retry() {
        let (transport, server) = MemoryTransport::new();
        server.fail_connect("connection refused");

        let mut viewer = ChannelViewer::open(transport, "company.1");
        viewer.poll();

        assert_eq!(viewer.state(), ConnectionState::Errored);
        assert_eq!(viewer.log().len(), 1);
        assert_eq!(
            viewer.log().last().unwrap().content,
            "Socket connection error! (connection refused)"
        );
        assert!(!server.is_subscribed("company.1"));
    }

    #[test]
    fn test_close_clears_from_every_state() {
        // Subscribed
        let (mut viewer, server) = subscribed("company.1");
        viewer.close();
        assert_eq!(viewer.state(), ConnectionState::Closed);
        assert!(viewer.log().is_empty());
        assert_eq!(server.unsubscribed(), vec!["company.1".to_string()]);

        // Connecting
        let (transport, server) = MemoryTransport::new();
        server.hold_acks();
        let mut viewer = ChannelViewer::open(transport, "company.1");
        viewer.poll();
        assert_eq!(viewer.state(), ConnectionState::Connecting);
        viewer.close();
        assert_eq!(viewer.state(), ConnectionState::Closed);
        assert!(viewer.log().is_empty());

        // Errored
        let (mut viewer, server) = subscribed("company.1");
        server.fail(None);
        viewer.poll();
        assert_eq!(viewer.state(), ConnectionState::Errored);
        viewer.close();
        assert_eq!(viewer.state(), ConnectionState::Closed);
        assert!(viewer.log().is_empty());
    }

    #[test]
    fn test_close_twice_is_noop() {
        let (mut viewer, server) = subscribed("company.1");
        viewer.close();
        viewer.close();

        assert_eq!(viewer.state(), ConnectionState::Closed);
        assert!(viewer.log().is_empty());
        assert_eq!(server.unsubscribed().len(), 1);
    }

    #[test]
    fn test_events_after_close_are_dropped() {
        let (mut viewer, server) = subscribed("company.1");
        viewer.close();

        server.fail(Some("late"));
        server.acknowledge("company.1");
        viewer.poll();

        assert_eq!(viewer.state(), ConnectionState::Closed);
        assert!(viewer.log().is_empty());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let (viewer, server) = subscribed("company.1");
        drop(viewer);
        assert!(!server.is_subscribed("company.1"));
        assert_eq!(server.unsubscribed(), vec!["company.1".to_string()]);
    }

    #[test]
    fn test_other_channels_are_ignored() {
        let (mut viewer, server) = subscribed("company.1");
        let before = viewer.log().len();
        server.acknowledge("company.2");
        viewer.apply(devconsole::TransportEvent::Message {
            channel: "company.2".to_string(),
            payload: json!(1),
        });
        viewer.poll();
        assert_eq!(viewer.log().len(), before);
    }

    #[test]
    fn test_subscribe_timeout() {
        let (transport, server) = MemoryTransport::new();
        server.hold_acks();
        let mut viewer = ChannelViewerBuilder::new()
            .subscribe_timeout(Some(Duration::from_millis(50)))
            .open(transport, "company.1");

        viewer.poll_timeout(Duration::from_millis(10));
        viewer.poll_timeout(Duration::from_millis(500));

        assert_eq!(viewer.state(), ConnectionState::Errored);
        let errors = viewer
            .log()
            .iter()
            .filter(|e| e.color == ColorTag::Error)
            .count();
        assert_eq!(errors, 1);

        // Reported once only
        viewer.poll_timeout(Duration::from_millis(20));
        assert_eq!(
            viewer
                .log()
                .iter()
                .filter(|e| e.color == ColorTag::Error)
                .count(),
            1
        );

        // A late acknowledgment still subscribes
        server.acknowledge("company.1");
        viewer.poll();
        assert_eq!(viewer.state(), ConnectionState::Subscribed);
    }

    #[test]
    fn test_subscribe_timeout_without_polling() {
        let (transport, server) = MemoryTransport::new();
        server.hold_acks();
        let mut viewer = ChannelViewerBuilder::new()
            .subscribe_timeout(Some(Duration::from_millis(30)))
            .open(transport, "company.1");
        viewer.poll();
        assert_eq!(viewer.state(), ConnectionState::Connecting);

        assert!(!viewer.check_subscribe_timeout());
        std::thread::sleep(Duration::from_millis(60));

        let before = viewer.log().len();
        assert!(viewer.check_subscribe_timeout());
        assert_eq!(viewer.state(), ConnectionState::Errored);
        assert_eq!(viewer.log().len(), before + 1);
        assert!(!viewer.check_subscribe_timeout());
    }

    #[test]
    fn test_queued_ack_holds_off_subscribe_timeout() {
        let (transport, server) = MemoryTransport::new();
        server.hold_acks();
        let mut viewer = ChannelViewerBuilder::new()
            .subscribe_timeout(Some(Duration::from_millis(30)))
            .open(transport, "company.1");
        viewer.poll();

        server.acknowledge("company.1");
        std::thread::sleep(Duration::from_millis(60));
        assert!(!viewer.check_subscribe_timeout());

        viewer.poll();
        assert_eq!(viewer.state(), ConnectionState::Subscribed);
        assert!(viewer.log().iter().all(|e| e.color != ColorTag::Error));
    }

    #[test]
    fn test_log_limit_keeps_newest() {
        let (transport, server) = MemoryTransport::new();
        let mut viewer = ChannelViewerBuilder::new()
            .log_limit(Some(3))
            .open(transport, "company.1");
        viewer.poll();

        for i in 0..10 {
            server.publish("company.1", json!(i));
        }
        viewer.poll();

        let contents: Vec<String> = viewer.log().iter().map(|e| e.content.clone()).collect();
        assert_eq!(contents, ["7", "8", "9"]);
    }
}
