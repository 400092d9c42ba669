//! Transport seam between the gateway and the external channel.
//!
//! The real channel (framing, compression, authentication) lives outside
//! this crate. A transport implementation only has to push outbound messages
//! somewhere and feed inbound messages into the receiver handed to
//! [`crate::Gateway::connect`].

use thiserror::Error;
use tokio::sync::mpsc;

use squall_wire::Message;

/// Outbound half of a connection.
pub trait Transport: Send + Sync + 'static {
    /// Queue a message for delivery to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`TransportClosed`] once the peer is gone.
    fn send(&self, message: Message) -> Result<(), TransportClosed>;
}

/// The channel to the peer no longer accepts messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("transport closed")]
pub struct TransportClosed;

/// In-memory transport backed by an unbounded channel.
#[derive(Clone)]
pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<Message>,
}

impl ChannelTransport {
    /// Wrap an existing sender, e.g. one drained by a socket writer task.
    #[must_use]
    pub const fn new(outbound: mpsc::UnboundedSender<Message>) -> Self {
        Self { outbound }
    }
}

impl Transport for ChannelTransport {
    fn send(&self, message: Message) -> Result<(), TransportClosed> {
        self.outbound.send(message).map_err(|_| TransportClosed)
    }
}

/// One end of an in-memory duplex connection.
pub struct Endpoint {
    /// Outbound half, handed to a gateway or session.
    pub transport: ChannelTransport,
    /// Inbound half: messages sent by the peer.
    pub inbound: mpsc::UnboundedReceiver<Message>,
}

/// Build a connected pair of in-memory endpoints.
///
/// Used by tests and loopback wiring; dropping one endpoint closes the
/// peer's inbound stream, which the gateway treats as a severed channel.
#[must_use]
pub fn pair() -> (Endpoint, Endpoint) {
    let (to_server, server_inbound) = mpsc::unbounded_channel();
    let (to_client, client_inbound) = mpsc::unbounded_channel();
    (
        Endpoint {
            transport: ChannelTransport::new(to_server),
            inbound: client_inbound,
        },
        Endpoint {
            transport: ChannelTransport::new(to_client),
            inbound: server_inbound,
        },
    )
}
