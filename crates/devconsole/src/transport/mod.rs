use crossbeam_channel::Receiver;
use eyre::Result;
use serde_json::Value;

pub mod memory;
pub mod protocol;

cfg_if::cfg_if! {
    if #[cfg(feature = "socketcluster")] {
        pub mod socketcluster;
        pub use socketcluster::SocketClusterTransport;
    }
}

pub use memory::{MemoryHandle, MemoryTransport};

/// Events delivered by a pub/sub transport to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Subscribed { channel: String },
    Message { channel: String, payload: Value },
    Error { reason: Option<String> },
}

/// Client side of a publish/subscribe transport.
///
/// Implementations push [`TransportEvent`]s into the queue returned by
/// [`Transport::events`]; the owner drains it on its own thread.
pub trait Transport: Send {
    /// Opens the connection. Calling it on an open transport is a no-op.
    fn connect(&mut self) -> Result<()>;

    fn subscribe(&mut self, channel: &str) -> Result<()>;

    fn unsubscribe(&mut self, channel: &str) -> Result<()>;

    fn events(&self) -> Receiver<TransportEvent>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn subscribe(&mut self, channel: &str) -> Result<()> {
        (**self).subscribe(channel)
    }

    fn unsubscribe(&mut self, channel: &str) -> Result<()> {
        (**self).unsubscribe(channel)
    }

    fn events(&self) -> Receiver<TransportEvent> {
        (**self).events()
    }
}
