use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, info, warn};

use crate::event_log::EventLog;
use crate::format::pretty_json;
use crate::subscription::{ChannelSubscription, ConnectionState};
use crate::transport::{Transport, TransportEvent};
use crate::LogEntry;

pub const DEFAULT_SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder for a [`ChannelViewer`] with custom retention and handshake timeout.
///
/// # Examples
///
/// ```
/// use devconsole::transport::MemoryTransport;
/// use devconsole::ChannelViewerBuilder;
///
/// let (transport, _server) = MemoryTransport::new();
/// let viewer = ChannelViewerBuilder::new()
///     .log_limit(Some(500))
///     .subscribe_timeout(None)
///     .open(transport, "company.123");
/// assert_eq!(viewer.channel_name(), "company.123");
/// ```
pub struct ChannelViewerBuilder {
    log_limit: Option<usize>,
    subscribe_timeout: Option<Duration>,
}

impl ChannelViewerBuilder {
    pub fn new() -> Self {
        Self {
            log_limit: None,
            subscribe_timeout: Some(DEFAULT_SUBSCRIBE_TIMEOUT),
        }
    }

    /// Maximum number of retained entries. `None` keeps everything.
    pub fn log_limit(mut self, limit: Option<usize>) -> Self {
        self.log_limit = limit;
        self
    }

    /// How long to wait for the subscription acknowledgment. `None` waits forever.
    pub fn subscribe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.subscribe_timeout = timeout;
        self
    }

    pub fn open<T: Transport>(self, transport: T, channel_name: &str) -> ChannelViewer<T> {
        ChannelViewer::open_with(
            transport,
            channel_name,
            EventLog::with_limit(self.log_limit),
            self.subscribe_timeout,
        )
    }
}

impl Default for ChannelViewerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Live viewer of the events published on one channel.
///
/// Owns the transport, the subscription and its event log. Dropping the
/// viewer closes the subscription and clears the log.
pub struct ChannelViewer<T: Transport> {
    transport: T,
    events: Receiver<TransportEvent>,
    subscription: ChannelSubscription,
    log: EventLog,
    opened_at: Instant,
    subscribe_timeout: Option<Duration>,
    timed_out: bool,
}

impl<T: Transport> ChannelViewer<T> {
    /// Connects `transport` if needed and subscribes to `channel_name`.
    ///
    /// Transport failures do not fail the call: they leave the subscription
    /// errored with an entry in the log.
    pub fn open(transport: T, channel_name: &str) -> Self {
        ChannelViewerBuilder::new().open(transport, channel_name)
    }

    fn open_with(
        transport: T,
        channel_name: &str,
        log: EventLog,
        subscribe_timeout: Option<Duration>,
    ) -> Self {
        let events = transport.events();
        let mut viewer = Self {
            transport,
            events,
            subscription: ChannelSubscription::new(channel_name),
            log,
            opened_at: Instant::now(),
            subscribe_timeout,
            timed_out: false,
        };

        info!("Opening channel viewer for '{}'", channel_name);

        let result = viewer
            .transport
            .connect()
            .and_then(|_| viewer.transport.subscribe(channel_name));

        if let Err(e) = result {
            warn!("Could not subscribe to '{}': {}", channel_name, e);
            viewer.record_error(Some(e.to_string()));
        }

        viewer
    }

    pub fn channel_name(&self) -> &str {
        &self.subscription.channel_name
    }

    pub fn state(&self) -> ConnectionState {
        self.subscription.state
    }

    pub fn subscription(&self) -> &ChannelSubscription {
        &self.subscription
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.log.to_vec()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Applies every event already queued by the transport. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            applied += 1;
        }
        self.check_subscribe_timeout();
        applied
    }

    /// Waits up to `timeout` for the next event, then drains the rest of the queue.
    pub fn poll_timeout(&mut self, timeout: Duration) -> usize {
        let deadline = match self.subscribe_deadline() {
            Some(deadline) => deadline.min(Instant::now() + timeout),
            None => Instant::now() + timeout,
        };
        let wait = deadline.saturating_duration_since(Instant::now());

        match self.events.recv_timeout(wait) {
            Ok(event) => {
                self.apply(event);
                1 + self.poll()
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.check_subscribe_timeout();
                0
            }
        }
    }

    /// Updates the subscription and the log for one transport event.
    pub fn apply(&mut self, event: TransportEvent) {
        if self.subscription.is_closed() {
            debug!("Dropping event for closed channel '{}'", self.channel_name());
            return;
        }

        match event {
            TransportEvent::Connected => {
                self.log.push(LogEntry::success("Socket is connected"));
            }
            TransportEvent::Subscribed { channel } => {
                if channel != self.subscription.channel_name {
                    return;
                }
                if self.subscription.mark_subscribed() {
                    info!("Subscribed to channel '{}'", channel);
                    self.log.push(LogEntry::info(format!(
                        "Socket subscribed to channel '{}'",
                        channel
                    )));
                }
            }
            TransportEvent::Message { channel, payload } => {
                if channel != self.subscription.channel_name
                    || !self.subscription.accepts_messages()
                {
                    return;
                }
                self.log.push(LogEntry::success(pretty_json(&payload)));
            }
            TransportEvent::Error { reason } => {
                warn!(
                    "Socket error on '{}': {}",
                    self.channel_name(),
                    reason.as_deref().unwrap_or("unknown")
                );
                self.record_error(reason);
            }
        }
    }

    /// Unsubscribes, marks the subscription closed and clears the log.
    /// Calling it again does nothing.
    pub fn close(&mut self) {
        if self.subscription.is_closed() {
            return;
        }

        if let Err(e) = self.transport.unsubscribe(&self.subscription.channel_name) {
            warn!(
                "Unsubscribe from '{}' failed: {}",
                self.subscription.channel_name, e
            );
        }

        self.subscription.mark_closed();
        self.log.clear();
        info!("Closed channel viewer for '{}'", self.channel_name());
    }

    fn record_error(&mut self, reason: Option<String>) {
        let content = match reason {
            Some(reason) if !reason.is_empty() => {
                format!("Socket connection error! ({})", reason)
            }
            _ => "Socket connection error!".to_string(),
        };
        self.subscription.mark_errored();
        self.log.push(LogEntry::error(content));
    }

    fn subscribe_deadline(&self) -> Option<Instant> {
        if self.timed_out || self.subscription.state != ConnectionState::Connecting {
            return None;
        }
        self.subscribe_timeout.map(|t| self.opened_at + t)
    }

    /// Fires the subscribe timeout without applying queued events, so a paused
    /// owner still sees it. Nothing fires while events are queued, since one of
    /// them may be the acknowledgment. Returns whether it fired.
    pub fn check_subscribe_timeout(&mut self) -> bool {
        let Some(deadline) = self.subscribe_deadline() else {
            return false;
        };
        if Instant::now() < deadline || !self.events.is_empty() {
            return false;
        }

        self.timed_out = true;
        let secs = self.subscribe_timeout.map(|t| t.as_secs_f64()).unwrap_or(0.0);
        warn!(
            "Subscription to '{}' not acknowledged after {:.1}s",
            self.channel_name(),
            secs
        );
        self.subscription.mark_errored();
        self.log.push(LogEntry::error(format!(
            "Subscription to channel '{}' timed out after {:.1}s",
            self.subscription.channel_name, secs
        )));
        true
    }
}

impl<T: Transport> Drop for ChannelViewer<T> {
    fn drop(&mut self) {
        self.close();
    }
}
