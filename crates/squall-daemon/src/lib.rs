//! Daemon-side integration between the torrent engine and client sessions.
//!
//! The engine itself (piece selection, peer wire protocol, disk I/O) is an
//! external collaborator. This crate adapts its lifecycle into the event
//! protocol: [`EngineHooks`] publishes the matching [`squall_events::Event`]
//! for each engine occurrence, and [`ClientSession`] runs one connected
//! client, forwarding bus events as notifications and dispatching inbound
//! calls to a [`CallHandler`].

pub mod hooks;
pub mod session;

pub use hooks::EngineHooks;
pub use session::{CallHandler, ClientSession};
