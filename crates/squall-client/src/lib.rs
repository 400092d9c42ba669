//! Client-side remote call gateway for the Squall daemon protocol.
//!
//! A [`Gateway`] turns local method invocations into [`squall_wire::Message`]
//! calls on a transport and tracks each one until settlement. The returned
//! [`PendingCall`] handle accepts success/failure callbacks that fire exactly
//! once, even when registered after the reply already arrived. Unsolicited
//! daemon notifications arriving on the same connection are decoded into
//! [`squall_events::Event`] values and exposed as a stream.

pub mod error;
pub mod gateway;
pub mod pending;
pub mod transport;

pub use error::{CallError, CallOutcome};
pub use gateway::Gateway;
pub use pending::PendingCall;
pub use transport::{ChannelTransport, Endpoint, Transport, TransportClosed, pair};
