use serde::{Deserialize, Serialize};

/// Lifecycle of a channel subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Subscribed,
    Closed,
    Errored,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Subscribed => "subscribed",
            ConnectionState::Closed => "closed",
            ConnectionState::Errored => "errored",
        }
    }
}

impl Serialize for ConnectionState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConnectionState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "connecting" => Ok(ConnectionState::Connecting),
            "subscribed" => Ok(ConnectionState::Subscribed),
            "closed" => Ok(ConnectionState::Closed),
            "errored" => Ok(ConnectionState::Errored),
            _ => Err(serde::de::Error::custom("invalid connection state")),
        }
    }
}

/// A listen registration on one named channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSubscription {
    pub channel_name: String,
    pub state: ConnectionState,
    /// Set once the transport has acknowledged the subscription.
    pub acknowledged: bool,
}

impl ChannelSubscription {
    pub fn new(channel_name: impl Into<String>) -> Self {
        Self {
            channel_name: channel_name.into(),
            state: ConnectionState::default(),
            acknowledged: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// Whether inbound messages should be recorded.
    ///
    /// Errored does not stop delivery of an acknowledged subscription.
    pub fn accepts_messages(&self) -> bool {
        self.acknowledged
            && matches!(
                self.state,
                ConnectionState::Subscribed | ConnectionState::Errored
            )
    }

    pub(crate) fn mark_subscribed(&mut self) -> bool {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Errored => {
                self.state = ConnectionState::Subscribed;
                self.acknowledged = true;
                true
            }
            ConnectionState::Subscribed | ConnectionState::Closed => false,
        }
    }

    pub(crate) fn mark_errored(&mut self) -> bool {
        if self.state == ConnectionState::Closed {
            return false;
        }
        self.state = ConnectionState::Errored;
        true
    }

    pub(crate) fn mark_closed(&mut self) -> bool {
        if self.state == ConnectionState::Closed {
            return false;
        }
        self.state = ConnectionState::Closed;
        true
    }
}
