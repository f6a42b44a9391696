//! Client records and the client registry.

use std::collections::HashMap;

use skiff_proto::Message;
use tokio::sync::mpsc;
use tracing::trace;

use crate::network::ConnId;

/// One connected client.
///
/// A client is fully registered once it has passed password authentication
/// and supplied both a nickname and a username; only then are the channel
/// and messaging commands available to it.
#[derive(Debug)]
pub struct Client {
    sender: mpsc::UnboundedSender<Message>,
    pub nickname: Option<String>,
    pub username: Option<String>,
    pub authenticated: bool,
    pub welcome_sent: bool,
    /// Last channel joined. Informational only; channel membership is
    /// authoritative.
    pub current_channel: String,
}

impl Client {
    fn new(sender: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            sender,
            nickname: None,
            username: None,
            authenticated: false,
            welcome_sent: false,
            current_channel: String::new(),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.authenticated && self.nickname.is_some() && self.username.is_some()
    }

    /// The nickname used to address this client in numeric replies,
    /// or `*` before one is set.
    pub fn display_nick(&self) -> &str {
        self.nickname.as_deref().unwrap_or("*")
    }

    /// Queue a frame for this client. Best-effort: a closed connection
    /// drops the frame.
    pub fn send(&self, msg: Message) {
        if self.sender.send(msg).is_err() {
            trace!("dropped frame for closed connection");
        }
    }
}

/// The client registry: connection id to client record.
#[derive(Debug, Default)]
pub struct Clients {
    map: HashMap<ConnId, Client>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conn: ConnId, sender: mpsc::UnboundedSender<Message>) -> &mut Client {
        self.map.entry(conn).or_insert_with(|| Client::new(sender))
    }

    pub fn remove(&mut self, conn: ConnId) -> Option<Client> {
        self.map.remove(&conn)
    }

    pub fn get(&self, conn: ConnId) -> Option<&Client> {
        self.map.get(&conn)
    }

    pub fn get_mut(&mut self, conn: ConnId) -> Option<&mut Client> {
        self.map.get_mut(&conn)
    }

    /// Linear nickname lookup; returns the first match. Nickname uniqueness
    /// is not enforced, so duplicates resolve to an arbitrary holder.
    pub fn find_by_nickname(&self, nick: &str) -> Option<ConnId> {
        self.map
            .iter()
            .find(|(_, client)| client.nickname.as_deref() == Some(nick))
            .map(|(conn, _)| *conn)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
