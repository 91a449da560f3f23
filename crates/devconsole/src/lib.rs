use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

pub mod channels;
pub mod config;
pub mod event_log;
pub mod format;
pub mod metrics;
pub mod resources;
pub mod subscription;
pub mod table;
pub mod transport;
pub mod viewer;

pub use channels::{known_channels, ChannelKind, KnownChannel};
pub use config::Config;
pub use event_log::EventLog;
pub use subscription::{ChannelSubscription, ConnectionState};
pub use transport::{Transport, TransportEvent};
pub use viewer::{ChannelViewer, ChannelViewerBuilder};

/// Color tag of a rendered log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Info,
    Success,
    Error,
}

impl ColorTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorTag::Info => "info",
            ColorTag::Success => "success",
            ColorTag::Error => "error",
        }
    }
}

impl std::fmt::Display for ColorTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single line of the live event viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub content: String,
    pub color: ColorTag,
}

impl LogEntry {
    pub fn new(content: impl Into<String>, color: ColorTag) -> Self {
        Self {
            timestamp: Utc::now(),
            content: content.into(),
            color,
        }
    }

    pub fn info(content: impl Into<String>) -> Self {
        Self::new(content, ColorTag::Info)
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self::new(content, ColorTag::Success)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(content, ColorTag::Error)
    }

    /// Arrival time in the console date format, local time.
    pub fn time_label(&self) -> String {
        format::console_time(&self.timestamp.with_timezone(&Local))
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "socketcluster")] {
        use std::sync::LazyLock;

        /// Runtime hosting socket sessions for callers that are not async themselves.
        pub static RT: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .thread_name("devconsole-socket")
                .enable_all()
                .build()
                .expect("Failed to build socket runtime")
        });
    }
}
