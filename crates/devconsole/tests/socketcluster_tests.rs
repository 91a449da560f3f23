#[cfg(test)]
pub mod tests {
    use std::time::{Duration, Instant};

    use devconsole::transport::SocketClusterTransport;
    use devconsole::{ChannelViewer, ChannelViewerBuilder, ColorTag, ConnectionState};
    use futures_util::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio::runtime::Runtime;
    use tokio_tungstenite::{accept_async, tungstenite::Message};

    /// Minimal SocketCluster server: acks the handshake and every subscribe,
    /// then publishes `payloads` on the subscribed channel.
    fn fake_server(rt: &Runtime, payloads: Vec<Value>, close_after: bool) -> String {
        let listener = rt
            .block_on(TcpListener::bind("127.0.0.1:0"))
            .expect("Failed to bind fake socket server");
        let port = listener.local_addr().expect("No local address").port();

        rt.spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let Ok(ws) = accept_async(stream).await else {
                return;
            };
            let (mut write, mut read) = ws.split();

            while let Some(Ok(message)) = read.next().await {
                let Message::Text(text) = message else {
                    continue;
                };
                let frame: Value = match serde_json::from_str(&text) {
                    Ok(frame) => frame,
                    Err(_) => continue,
                };
                let cid = frame["cid"].clone();

                match frame["event"].as_str() {
                    Some("#handshake") => {
                        let ack = json!({ "rid": cid, "data": { "id": "socket-1", "pingTimeout": 20000 } });
                        let _ = write.send(Message::Text(ack.to_string())).await;
                        let _ = write.send(Message::Text("#1".to_string())).await;
                    }
                    Some("#subscribe") => {
                        let channel = frame["data"]["channel"].as_str().unwrap_or_default().to_string();
                        let _ = write.send(Message::Text(json!({ "rid": cid }).to_string())).await;
                        for payload in &payloads {
                            let publish = json!({
                                "event": "#publish",
                                "data": { "channel": channel, "data": payload }
                            });
                            let _ = write.send(Message::Text(publish.to_string())).await;
                        }
                        if close_after {
                            let _ = write.send(Message::Close(None)).await;
                            return;
                        }
                    }
                    _ => {}
                }
            }
        });

        format!("ws://127.0.0.1:{}/socketcluster/", port)
    }

    fn poll_until<F>(viewer: &mut ChannelViewer<SocketClusterTransport>, done: F)
    where
        F: Fn(&ChannelViewer<SocketClusterTransport>) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(viewer) {
            assert!(
                Instant::now() < deadline,
                "Timed out, log so far: {:?}",
                viewer.entries()
            );
            viewer.poll_timeout(Duration::from_millis(50));
        }
    }

    #[test]
    fn test_subscribes_and_receives_publications() {
        let rt = Runtime::new().unwrap();
        let url = fake_server(&rt, vec![json!({ "a": 1 }), json!({ "b": [1, 2] })], false);

        let mut viewer = ChannelViewer::open(SocketClusterTransport::new(url), "company.123");
        poll_until(&mut viewer, |v| v.log().len() == 4);

        let contents: Vec<&str> = viewer.log().iter().map(|e| e.content.as_str()).collect();
        assert_eq!(
            contents,
            [
                "Socket is connected",
                "Socket subscribed to channel 'company.123'",
                "{\n  \"a\": 1\n}",
                "{\n  \"b\": [\n    1,\n    2\n  ]\n}",
            ]
        );
        assert_eq!(viewer.state(), ConnectionState::Subscribed);

        viewer.close();
        assert!(viewer.log().is_empty());
    }

    #[test]
    fn test_server_close_is_reported_once() {
        let rt = Runtime::new().unwrap();
        let url = fake_server(&rt, vec![json!("bye")], true);

        let mut viewer = ChannelViewer::open(SocketClusterTransport::new(url), "api.key_1");
        poll_until(&mut viewer, |v| v.state() == ConnectionState::Errored);

        // Nothing follows the error since the transport never reconnects.
        viewer.poll_timeout(Duration::from_millis(300));
        let errors: Vec<_> = viewer
            .log()
            .iter()
            .filter(|e| e.color == ColorTag::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].content.starts_with("Socket connection error!"));
        assert_eq!(viewer.log().last().unwrap().color, ColorTag::Error);
    }

    #[test]
    fn test_refused_connection_errors() {
        let rt = Runtime::new().unwrap();
        let port = rt
            .block_on(async {
                let listener = TcpListener::bind("127.0.0.1:0").await?;
                listener.local_addr()
            })
            .unwrap()
            .port();

        let transport = SocketClusterTransport::new(format!("ws://127.0.0.1:{}/socketcluster/", port))
            .connect_timeout(Duration::from_secs(2));
        let mut viewer = ChannelViewerBuilder::new()
            .subscribe_timeout(None)
            .open(transport, "company.1");

        poll_until(&mut viewer, |v| v.state() == ConnectionState::Errored);
        assert_eq!(viewer.log().len(), 1);
        assert_eq!(viewer.log().last().unwrap().color, ColorTag::Error);
    }
}
