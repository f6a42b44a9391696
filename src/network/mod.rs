//! Network layer: TCP accept loop and per-connection framing tasks.

mod connection;
mod gateway;

pub use connection::Connection;
pub use gateway::Gateway;

use std::fmt;
use std::net::SocketAddr;

use skiff_proto::Message;
use tokio::sync::mpsc;

/// Opaque handle for one accepted connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(u64);

impl ConnId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Events fed from connection tasks into the server loop.
///
/// Per-connection ordering is preserved: each reader task pushes its events
/// into the shared channel in arrival order, starting with `Connected` and
/// ending with `Closed`.
#[derive(Debug)]
pub enum Event {
    Connected {
        conn: ConnId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Message>,
    },
    Line {
        conn: ConnId,
        line: String,
    },
    Closed {
        conn: ConnId,
    },
}
