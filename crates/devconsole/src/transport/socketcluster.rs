use std::collections::HashMap;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use eyre::Result;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::protocol::{self, Frame};
use super::{Transport, TransportEvent};
use crate::RT;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
enum Command {
    Subscribe(String),
    Unsubscribe(String),
    Close,
}

#[derive(Debug)]
enum Pending {
    Handshake,
    Subscribe(String),
    Unsubscribe,
}

/// SocketCluster client over a websocket.
///
/// The socket session runs on [`RT`]; commands reach it through an
/// unbounded queue and events come back through a crossbeam channel.
/// A lost connection is reported once and never re-established.
pub struct SocketClusterTransport {
    url: String,
    auth_token: Option<String>,
    connect_timeout: Duration,
    events_tx: Sender<TransportEvent>,
    events_rx: Receiver<TransportEvent>,
    commands: Option<mpsc::UnboundedSender<Command>>,
}

impl SocketClusterTransport {
    pub fn new(url: impl Into<String>) -> Self {
        let (events_tx, events_rx) = unbounded::<TransportEvent>();
        Self {
            url: url.into(),
            auth_token: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            events_tx,
            events_rx,
            commands: None,
        }
    }

    pub fn auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn send_command(&self, command: Command) {
        if let Some(commands) = &self.commands {
            if commands.send(command).is_err() {
                debug!("Socket session for {} has already ended", self.url);
            }
        }
    }
}

impl Transport for SocketClusterTransport {
    fn connect(&mut self) -> Result<()> {
        if self.commands.is_some() {
            return Ok(());
        }

        let (tx, rx) = mpsc::unbounded_channel::<Command>();
        self.commands = Some(tx);

        RT.spawn(run_session(
            self.url.clone(),
            self.auth_token.clone(),
            self.connect_timeout,
            rx,
            self.events_tx.clone(),
        ));
        Ok(())
    }

    fn subscribe(&mut self, channel: &str) -> Result<()> {
        if self.commands.is_none() {
            eyre::bail!("socket is not connected");
        }
        self.send_command(Command::Subscribe(channel.to_string()));
        Ok(())
    }

    fn unsubscribe(&mut self, channel: &str) -> Result<()> {
        self.send_command(Command::Unsubscribe(channel.to_string()));
        Ok(())
    }

    fn events(&self) -> Receiver<TransportEvent> {
        self.events_rx.clone()
    }
}

impl Drop for SocketClusterTransport {
    fn drop(&mut self) {
        self.send_command(Command::Close);
    }
}

/// Protocol state of one socket session, independent of the socket itself.
struct Session {
    events: Sender<TransportEvent>,
    auth_token: Option<String>,
    next_cid: u64,
    pending: HashMap<u64, Pending>,
    handshaken: bool,
    queued: Vec<Command>,
}

impl Session {
    fn new(events: Sender<TransportEvent>, auth_token: Option<String>) -> Self {
        Self {
            events,
            auth_token,
            next_cid: 1,
            pending: HashMap::new(),
            handshaken: false,
            queued: Vec::new(),
        }
    }

    fn cid(&mut self) -> u64 {
        let cid = self.next_cid;
        self.next_cid += 1;
        cid
    }

    fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }

    fn handshake(&mut self) -> String {
        let cid = self.cid();
        self.pending.insert(cid, Pending::Handshake);
        protocol::handshake(cid, self.auth_token.as_deref())
    }

    /// Outgoing frames for a command. Calls are held back until the handshake completes.
    fn on_command(&mut self, command: Command) -> Vec<String> {
        if !self.handshaken {
            self.queued.push(command);
            return Vec::new();
        }

        match command {
            Command::Subscribe(channel) => {
                let cid = self.cid();
                let frame = protocol::subscribe(cid, &channel);
                self.pending.insert(cid, Pending::Subscribe(channel));
                vec![frame]
            }
            Command::Unsubscribe(channel) => {
                let cid = self.cid();
                self.pending.insert(cid, Pending::Unsubscribe);
                vec![protocol::unsubscribe(cid, &channel)]
            }
            Command::Close => Vec::new(),
        }
    }

    /// Outgoing frames in reply to an inbound text frame.
    fn on_text(&mut self, text: &str) -> Vec<String> {
        let frame = match protocol::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Ignoring socket frame: {}", e);
                return Vec::new();
            }
        };

        match frame {
            Frame::Ping { v1 } => vec![protocol::pong(v1).to_string()],
            Frame::Response { rid, error, .. } => {
                let Some(pending) = self.pending.remove(&rid) else {
                    debug!("Response for unknown call {}", rid);
                    return Vec::new();
                };
                self.on_response(pending, error)
            }
            Frame::Publish { channel, data } => {
                self.emit(TransportEvent::Message {
                    channel,
                    payload: data,
                });
                Vec::new()
            }
            Frame::Kicked { channel, message } => {
                let reason = match message {
                    Some(message) => format!("kicked out of '{}': {}", channel, message),
                    None => format!("kicked out of '{}'", channel),
                };
                self.emit(TransportEvent::Error {
                    reason: Some(reason),
                });
                Vec::new()
            }
            Frame::Event { event, .. } => {
                debug!("Unhandled socket event {}", event);
                Vec::new()
            }
        }
    }

    fn on_response(&mut self, pending: Pending, error: Option<serde_json::Value>) -> Vec<String> {
        if let Some(error) = error {
            let reason = protocol::error_reason(&error);
            warn!("Socket call failed: {}", reason);
            self.emit(TransportEvent::Error {
                reason: Some(reason),
            });
            return Vec::new();
        }

        match pending {
            Pending::Handshake => {
                self.handshaken = true;
                self.emit(TransportEvent::Connected);
                let queued = std::mem::take(&mut self.queued);
                queued
                    .into_iter()
                    .flat_map(|command| self.on_command(command))
                    .collect()
            }
            Pending::Subscribe(channel) => {
                debug!("Subscribed to channel {}", channel);
                self.emit(TransportEvent::Subscribed { channel });
                Vec::new()
            }
            Pending::Unsubscribe => Vec::new(),
        }
    }
}

async fn run_session(
    url: String,
    auth_token: Option<String>,
    connect_timeout: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: Sender<TransportEvent>,
) {
    let ws = match tokio::time::timeout(connect_timeout, connect_async(url.as_str())).await {
        Ok(Ok((ws, _))) => ws,
        Ok(Err(e)) => {
            warn!("Socket connection to {} failed: {}", url, e);
            let _ = events.send(TransportEvent::Error {
                reason: Some(e.to_string()),
            });
            return;
        }
        Err(_) => {
            warn!("Socket connection to {} timed out", url);
            let _ = events.send(TransportEvent::Error {
                reason: Some(format!(
                    "connection timed out after {}s",
                    connect_timeout.as_secs()
                )),
            });
            return;
        }
    };

    info!("Socket connected to {}", url);

    let (mut write, mut read) = ws.split();
    let mut session = Session::new(events.clone(), auth_token);

    if let Err(e) = write.send(Message::Text(session.handshake())).await {
        let _ = events.send(TransportEvent::Error {
            reason: Some(e.to_string()),
        });
        return;
    }

    loop {
        let outgoing = tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Close) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    info!("Socket to {} closed", url);
                    break;
                }
                Some(command) => session.on_command(command),
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => session.on_text(&text),
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "connection closed by server".to_string());
                    let _ = events.send(TransportEvent::Error { reason: Some(reason) });
                    break;
                }
                Some(Ok(_)) => Vec::new(),
                Some(Err(e)) => {
                    warn!("Socket error on {}: {}", url, e);
                    let _ = events.send(TransportEvent::Error { reason: Some(e.to_string()) });
                    break;
                }
                None => {
                    let _ = events.send(TransportEvent::Error {
                        reason: Some("connection closed".to_string()),
                    });
                    break;
                }
            },
        };

        for frame in outgoing {
            if let Err(e) = write.send(Message::Text(frame)).await {
                let _ = events.send(TransportEvent::Error {
                    reason: Some(e.to_string()),
                });
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn session() -> (Session, Receiver<TransportEvent>) {
        let (tx, rx) = unbounded();
        (Session::new(tx, Some("token".to_string())), rx)
    }

    #[test]
    fn subscribes_are_queued_until_handshake_ack() {
        let (mut session, events) = session();
        let handshake: Value = serde_json::from_str(&session.handshake()).unwrap();
        assert_eq!(handshake["data"]["authToken"], json!("token"));

        assert!(session
            .on_command(Command::Subscribe("company.1".to_string()))
            .is_empty());

        let frames = session.on_text(r#"{"rid":1,"data":{"id":"abc"}}"#);
        assert_eq!(frames.len(), 1);
        let subscribe: Value = serde_json::from_str(&frames[0]).unwrap();
        assert_eq!(subscribe["event"], json!("#subscribe"));
        assert_eq!(subscribe["cid"], json!(2));

        assert_eq!(events.try_recv().unwrap(), TransportEvent::Connected);

        session.on_text(r#"{"rid":2}"#);
        assert_eq!(
            events.try_recv().unwrap(),
            TransportEvent::Subscribed {
                channel: "company.1".to_string()
            }
        );
    }

    #[test]
    fn replies_to_pings() {
        let (mut session, _events) = session();
        assert_eq!(session.on_text("#1"), vec!["#2".to_string()]);
        assert_eq!(session.on_text(""), vec![String::new()]);
    }

    #[test]
    fn failed_subscribe_reports_error() {
        let (mut session, events) = session();
        session.handshake();
        session.on_text(r#"{"rid":1}"#);
        session.on_command(Command::Subscribe("api.x".to_string()));
        session.on_text(r#"{"rid":2,"error":{"message":"not allowed"}}"#);

        assert_eq!(events.try_recv().unwrap(), TransportEvent::Connected);
        assert_eq!(
            events.try_recv().unwrap(),
            TransportEvent::Error {
                reason: Some("not allowed".to_string())
            }
        );
    }

    #[test]
    fn publishes_become_messages() {
        let (mut session, events) = session();
        session.on_text(r##"{"event":"#publish","data":{"channel":"api.x","data":[1,2]}}"##);
        assert_eq!(
            events.try_recv().unwrap(),
            TransportEvent::Message {
                channel: "api.x".to_string(),
                payload: json!([1, 2])
            }
        );
    }
}
