//! The hub - central state owned by the server's event loop.

use skiff_proto::Message;
use tracing::debug;

use crate::network::ConnId;
use crate::state::{Channels, Clients};

/// All protocol state: the client table, the channel table, and the shared
/// server password. Owned exclusively by the server loop; handlers mutate it
/// only while the loop drives them, so no synchronization is needed.
#[derive(Debug)]
pub struct Hub {
    pub clients: Clients,
    pub channels: Channels,
    password: String,
}

impl Hub {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            clients: Clients::new(),
            channels: Channels::new(),
            password: password.into(),
        }
    }

    pub fn password_matches(&self, supplied: &str) -> bool {
        self.password == supplied
    }

    /// Queue a frame for one connection. Best-effort, like every send.
    pub fn send_to(&self, conn: ConnId, msg: Message) {
        if let Some(client) = self.clients.get(conn) {
            client.send(msg);
        }
    }

    /// Tear down one connection: drop its membership in every channel, then
    /// delete the client record (closing its outbound queue, which ends the
    /// writer task and shuts the socket down).
    pub fn teardown(&mut self, conn: ConnId) {
        for channel in self.channels.iter_mut() {
            channel.remove_member(conn);
        }
        if self.clients.remove(conn).is_some() {
            debug!(%conn, "connection torn down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::ConnId;
    use tokio::sync::mpsc;

    #[test]
    fn teardown_removes_every_trace_of_the_connection() {
        let mut hub = Hub::new("secret");
        let conn = ConnId::new(7);

        let (tx, _rx) = mpsc::unbounded_channel();
        hub.clients.add(conn, tx);

        let (chan, _) = hub.channels.get_or_create("#chat");
        chan.add_member(conn, "alice", "alice");
        chan.make_operator(conn);
        chan.invite("alice");

        hub.teardown(conn);

        assert!(hub.clients.get(conn).is_none());
        let chan = hub.channels.get("#chat").unwrap();
        assert!(!chan.is_member(conn));
        assert!(!chan.is_operator(conn));
        assert!(!chan.is_invited("alice"));
        // The emptied channel itself lingers, modes intact.
        assert_eq!(chan.member_count(), 0);
    }
}
