//! Message prefixes (sources).

use std::fmt;

use crate::{CLIENT_HOST, SERVER_NAME};

/// The source of a message: the server itself, or a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Prefix {
    /// A server name, e.g. `irc.localhost`.
    Server(String),
    /// A client identity, rendered as `nick!user@localhost`.
    User { nick: String, user: String },
}

impl Prefix {
    /// This server's own identity.
    pub fn server() -> Self {
        Prefix::Server(SERVER_NAME.to_string())
    }

    /// A client identity.
    pub fn user(nick: impl Into<String>, user: impl Into<String>) -> Self {
        Prefix::User {
            nick: nick.into(),
            user: user.into(),
        }
    }

    /// Parse a prefix token (without the leading `:`).
    pub fn parse(token: &str) -> Prefix {
        match token.split_once('!') {
            Some((nick, rest)) => {
                let user = rest.split_once('@').map(|(u, _)| u).unwrap_or(rest);
                Prefix::user(nick, user)
            }
            None => Prefix::Server(token.to_string()),
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::Server(name) => f.write_str(name),
            Prefix::User { nick, user } => write!(f, "{}!{}@{}", nick, user, CLIENT_HOST),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prefix_renders_localhost() {
        let p = Prefix::user("alice", "alice");
        assert_eq!(p.to_string(), "alice!alice@localhost");
    }

    #[test]
    fn parse_user_prefix() {
        let p = Prefix::parse("bob!bob@localhost");
        assert_eq!(
            p,
            Prefix::User {
                nick: "bob".into(),
                user: "bob".into()
            }
        );
    }

    #[test]
    fn parse_server_prefix() {
        assert_eq!(
            Prefix::parse("irc.localhost"),
            Prefix::Server("irc.localhost".into())
        );
    }
}
