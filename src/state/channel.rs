//! Channel records and the channel registry.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use skiff_proto::{Message, Prefix, Response};
use tracing::debug;

use crate::network::ConnId;
use crate::state::Clients;

/// Cached identity of a channel member, captured at join time and used to
/// build message prefixes without a registry lookup. Not refreshed on
/// nickname changes.
#[derive(Debug, Clone)]
pub struct Member {
    pub nick: String,
    pub user: String,
}

/// One channel: a named fan-out group with modes.
#[derive(Debug)]
pub struct Channel {
    pub name: String,
    members: BTreeMap<ConnId, Member>,
    operators: BTreeSet<ConnId>,
    invited: BTreeSet<String>,
    pub topic: String,
    key: String,
    user_limit: usize,
    pub invite_only: bool,
    pub topic_restricted: bool,
    /// The anchoring operator (normally the creator). When this member
    /// leaves, the next member in iteration order is promoted.
    founder: Option<ConnId>,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeMap::new(),
            operators: BTreeSet::new(),
            invited: BTreeSet::new(),
            topic: String::new(),
            key: String::new(),
            user_limit: 0,
            invite_only: false,
            topic_restricted: false,
            founder: None,
        }
    }

    /// Add a member, refreshing the cached nick/user. Idempotent on the
    /// membership set.
    pub fn add_member(&mut self, conn: ConnId, nick: impl Into<String>, user: impl Into<String>) {
        self.members.insert(
            conn,
            Member {
                nick: nick.into(),
                user: user.into(),
            },
        );
    }

    /// Remove a member from the membership, operator, and invite sets.
    ///
    /// If the departing member anchored the operator set and members remain,
    /// the first remaining member in iteration order is promoted.
    pub fn remove_member(&mut self, conn: ConnId) {
        let departed = self.members.remove(&conn);
        self.operators.remove(&conn);
        if let Some(member) = departed {
            self.invited.remove(&member.nick);
        }

        if self.founder == Some(conn) {
            self.founder = self.members.keys().next().copied();
            if let Some(next) = self.founder {
                self.operators.insert(next);
            }
        }
    }

    /// Grant operator status. The first operator anchors the set: its
    /// departure triggers promotion of the next member.
    pub fn make_operator(&mut self, conn: ConnId) {
        self.operators.insert(conn);
        if self.founder.is_none() {
            self.founder = Some(conn);
        }
    }

    pub fn is_member(&self, conn: ConnId) -> bool {
        self.members.contains_key(&conn)
    }

    pub fn is_operator(&self, conn: ConnId) -> bool {
        self.operators.contains(&conn)
    }

    pub fn is_invited(&self, nick: &str) -> bool {
        self.invited.contains(nick)
    }

    /// Record an invitation by nickname, consulted on JOIN when the channel
    /// is invite-only.
    pub fn invite(&mut self, nick: impl Into<String>) {
        self.invited.insert(nick.into());
    }

    pub fn member(&self, conn: ConnId) -> Option<&Member> {
        self.members.get(&conn)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn user_limit(&self) -> usize {
        self.user_limit
    }

    /// Member list for a NAMES reply: nicknames in iteration order,
    /// operators prefixed with `@`.
    pub fn names_list(&self) -> String {
        let mut names = String::new();
        for (conn, member) in &self.members {
            if !names.is_empty() {
                names.push(' ');
            }
            if self.operators.contains(conn) {
                names.push('@');
            }
            names.push_str(&member.nick);
        }
        names
    }

    /// Send a frame to every member.
    pub fn broadcast(&self, clients: &Clients, msg: &Message) {
        for conn in self.members.keys() {
            if let Some(client) = clients.get(*conn) {
                client.send(msg.clone());
            }
        }
    }

    /// Send a frame to every member except the sender.
    pub fn relay_from(&self, clients: &Clients, sender: ConnId, msg: &Message) {
        for conn in self.members.keys() {
            if *conn != sender {
                if let Some(client) = clients.get(*conn) {
                    client.send(msg.clone());
                }
            }
        }
    }

    fn member_by_nick(&self, nick: &str) -> Option<ConnId> {
        self.members
            .iter()
            .find(|(_, member)| member.nick == nick)
            .map(|(conn, _)| *conn)
    }

    fn sender_nick(&self, conn: ConnId) -> String {
        self.members
            .get(&conn)
            .map(|m| m.nick.clone())
            .unwrap_or_default()
    }

    /// Apply a two-character mode change (`+X`/`-X`) on behalf of `sender`,
    /// sending error numerics and mode notifications directly.
    ///
    /// Operator demotion is deliberately lopsided: an operator may demote
    /// themselves, but demoting another operator is refused with 482.
    pub fn set_mode(
        &mut self,
        clients: &Clients,
        sender: ConnId,
        mode: &str,
        param: Option<&str>,
    ) {
        let param = param.unwrap_or("");

        match mode {
            "+i" => self.invite_only = true,
            "-i" => self.invite_only = false,
            "+t" => self.topic_restricted = true,
            "-t" => self.topic_restricted = false,
            "+k" => {
                if param.is_empty() {
                    self.send_to(
                        clients,
                        sender,
                        numeric(Response::ERR_NEEDMOREPARAMS)
                            .param(self.sender_nick(sender))
                            .param("MODE")
                            .trailing("Not enough parameters for +k"),
                    );
                    return;
                }
                self.key = param.to_string();
            }
            "-k" => self.key.clear(),
            "+o" => {
                let Some(target) = self.member_by_nick(param) else {
                    self.send_no_such_nick(clients, sender, param);
                    return;
                };
                self.make_operator(target);
                let notice = Message::new("MODE")
                    .with_prefix(self.user_prefix(sender))
                    .param(self.name.clone())
                    .param("+o")
                    .param(param);
                self.broadcast(clients, &notice);
            }
            "-o" => {
                let Some(target) = self.member_by_nick(param) else {
                    self.send_no_such_nick(clients, sender, param);
                    return;
                };
                if self.operators.contains(&sender) && target != sender {
                    self.send_to(
                        clients,
                        sender,
                        numeric(Response::ERR_CHANOPRIVSNEEDED)
                            .param(self.sender_nick(sender))
                            .param(self.name.clone())
                            .trailing("You cannot remove another operator"),
                    );
                    return;
                }
                self.operators.remove(&target);
                self.send_to(
                    clients,
                    target,
                    numeric(Response::RPL_INVITING)
                        .param(self.sender_nick(sender))
                        .param(param)
                        .param(self.name.clone())
                        .trailing("Operator privileges removed"),
                );
            }
            "+l" => {
                let limit = param.parse::<usize>().unwrap_or(0);
                if limit == 0 {
                    self.send_to(
                        clients,
                        sender,
                        numeric(Response::ERR_NEEDMOREPARAMS)
                            .param(self.sender_nick(sender))
                            .param("MODE")
                            .trailing("Invalid parameter for +l"),
                    );
                    return;
                }
                self.user_limit = limit;
            }
            "-l" => self.user_limit = 0,
            _ => {
                self.send_to(
                    clients,
                    sender,
                    numeric(Response::ERR_UNKNOWNMODE)
                        .param(self.sender_nick(sender))
                        .param(mode)
                        .trailing(format!("is unknown mode char for {}", self.name)),
                );
                return;
            }
        }

        debug!(channel = %self.name, mode, param, "mode changed");
    }

    fn user_prefix(&self, conn: ConnId) -> Prefix {
        match self.members.get(&conn) {
            Some(member) => Prefix::user(member.nick.clone(), member.user.clone()),
            None => Prefix::server(),
        }
    }

    fn send_to(&self, clients: &Clients, conn: ConnId, msg: Message) {
        if let Some(client) = clients.get(conn) {
            client.send(msg);
        }
    }

    fn send_no_such_nick(&self, clients: &Clients, sender: ConnId, target: &str) {
        self.send_to(
            clients,
            sender,
            numeric(Response::ERR_NOSUCHNICK)
                .param(self.sender_nick(sender))
                .param(target)
                .trailing("No such nick/channel"),
        );
    }
}

fn numeric(code: Response) -> Message {
    Message::new(code.to_string()).with_prefix(Prefix::server())
}

/// The channel registry: channel name to channel record.
///
/// Channels that empty out are not deleted; they keep their modes.
#[derive(Debug, Default)]
pub struct Channels {
    map: HashMap<String, Channel>,
}

impl Channels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, name: &str) -> (&mut Channel, bool) {
        let created = !self.map.contains_key(name);
        let channel = self
            .map
            .entry(name.to_string())
            .or_insert_with(|| Channel::new(name));
        (channel, created)
    }

    pub fn get(&self, name: &str) -> Option<&Channel> {
        self.map.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.map.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Channel> {
        self.map.remove(name)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Channel> {
        self.map.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn clients_with(conns: &[ConnId]) -> Clients {
        let mut clients = Clients::new();
        for conn in conns {
            let (tx, rx) = mpsc::unbounded_channel();
            std::mem::forget(rx);
            clients.add(*conn, tx);
        }
        clients
    }

    const A: ConnId = ConnId::new(1);
    const B: ConnId = ConnId::new(2);
    const C: ConnId = ConnId::new(3);

    #[test]
    fn add_member_is_idempotent() {
        let mut chan = Channel::new("#chat");
        chan.add_member(A, "alice", "alice");
        chan.add_member(A, "alice", "alice");
        assert_eq!(chan.member_count(), 1);
    }

    #[test]
    fn operators_are_members() {
        let mut chan = Channel::new("#chat");
        chan.add_member(A, "alice", "alice");
        chan.make_operator(A);
        assert!(chan.is_operator(A));
        assert!(chan.is_member(A));
    }

    #[test]
    fn remove_member_clears_operator_and_invite() {
        let mut chan = Channel::new("#chat");
        chan.add_member(A, "alice", "alice");
        chan.make_operator(A);
        chan.invite("alice");

        chan.remove_member(A);
        assert!(!chan.is_member(A));
        assert!(!chan.is_operator(A));
        assert!(!chan.is_invited("alice"));
    }

    #[test]
    fn founder_departure_promotes_next_member() {
        let mut chan = Channel::new("#chat");
        chan.add_member(A, "alice", "alice");
        chan.make_operator(A);
        chan.add_member(B, "bob", "bob");
        chan.add_member(C, "carol", "carol");

        chan.remove_member(A);
        assert!(chan.is_operator(B), "first remaining member is promoted");
        assert!(!chan.is_operator(C));
    }

    #[test]
    fn key_set_clear_set_round_trips() {
        let clients = clients_with(&[A]);
        let mut chan = Channel::new("#chat");
        chan.add_member(A, "alice", "alice");
        chan.make_operator(A);

        chan.set_mode(&clients, A, "+k", Some("k1"));
        assert_eq!(chan.key(), "k1");
        chan.set_mode(&clients, A, "-k", None);
        assert_eq!(chan.key(), "");
        chan.set_mode(&clients, A, "+k", Some("k1"));
        assert_eq!(chan.key(), "k1");
    }

    #[test]
    fn limit_requires_positive_integer() {
        let clients = clients_with(&[A]);
        let mut chan = Channel::new("#chat");
        chan.add_member(A, "alice", "alice");
        chan.make_operator(A);

        chan.set_mode(&clients, A, "+l", Some("0"));
        assert_eq!(chan.user_limit(), 0);
        chan.set_mode(&clients, A, "+l", Some("nope"));
        assert_eq!(chan.user_limit(), 0);
        chan.set_mode(&clients, A, "+l", Some("2"));
        assert_eq!(chan.user_limit(), 2);
        chan.set_mode(&clients, A, "-l", None);
        assert_eq!(chan.user_limit(), 0);
    }

    #[test]
    fn operator_cannot_demote_another_operator() {
        let clients = clients_with(&[A, B]);
        let mut chan = Channel::new("#chat");
        chan.add_member(A, "alice", "alice");
        chan.add_member(B, "bob", "bob");
        chan.make_operator(A);
        chan.make_operator(B);

        chan.set_mode(&clients, A, "-o", Some("bob"));
        assert!(chan.is_operator(B), "cross-demotion is refused");

        chan.set_mode(&clients, A, "-o", Some("alice"));
        assert!(!chan.is_operator(A), "self-demotion is allowed");
    }

    #[test]
    fn names_list_marks_operators() {
        let mut chan = Channel::new("#chat");
        chan.add_member(A, "alice", "alice");
        chan.add_member(B, "bob", "bob");
        chan.make_operator(A);
        assert_eq!(chan.names_list(), "@alice bob");
    }
}
