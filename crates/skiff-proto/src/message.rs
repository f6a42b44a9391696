//! Parsed IRC message representation.
//!
//! A message is a verb plus positional parameters, optionally followed by a
//! single free-text trailing argument introduced by `:` that runs to end of
//! line. The trailing argument is kept apart from the positional parameters
//! so re-serialization reproduces the original argument boundary.

use std::fmt;

use crate::prefix::Prefix;

/// One IRC message, parsed or under construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Message source (`:irc.localhost` or `:nick!user@localhost`).
    pub prefix: Option<Prefix>,
    /// Upper-cased command verb or three-digit numeric.
    pub verb: String,
    /// Whitespace-separated positional parameters.
    pub params: Vec<String>,
    /// Free-text argument introduced by `:`, spanning to end of line.
    pub trailing: Option<String>,
}

impl Message {
    /// Start building a message with the given verb.
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            prefix: None,
            verb: verb.into(),
            params: Vec::new(),
            trailing: None,
        }
    }

    /// Set the message source.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Append a positional parameter.
    #[must_use]
    pub fn param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Set the trailing argument.
    #[must_use]
    pub fn trailing(mut self, trailing: impl Into<String>) -> Self {
        self.trailing = Some(trailing.into());
        self
    }

    /// Parse one line (no terminator) into a message.
    ///
    /// The verb is upper-cased and any leading `/` or `\` characters are
    /// stripped, tolerating clients that forward slash-prefixed commands.
    /// Returns `None` when no verb remains.
    pub fn parse(line: &str) -> Option<Message> {
        let mut rest = trim_leading(line);

        let mut prefix = None;
        if let Some(after) = rest.strip_prefix(':') {
            // A colon before the verb introduces the message source.
            let (token, tail) = split_token(after);
            prefix = Some(Prefix::parse(token));
            rest = trim_leading(tail);
        }

        let (verb_token, mut tail) = split_token(rest);
        let verb = verb_token
            .trim_start_matches(['/', '\\'])
            .to_ascii_uppercase();
        if verb.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        let mut trailing = None;
        loop {
            let t = trim_leading(tail);
            if t.is_empty() {
                break;
            }
            if let Some(text) = t.strip_prefix(':') {
                trailing = Some(text.to_string());
                break;
            }
            let (token, next) = split_token(t);
            params.push(token.to_string());
            tail = next;
        }

        Some(Message {
            prefix,
            verb,
            params,
            trailing,
        })
    }

    /// Positional view over `params` followed by the trailing argument.
    pub fn arg(&self, n: usize) -> Option<&str> {
        if n < self.params.len() {
            Some(&self.params[n])
        } else if n == self.params.len() {
            self.trailing.as_deref()
        } else {
            None
        }
    }
}

fn trim_leading(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_ascii_whitespace())
}

fn split_token(s: &str) -> (&str, &str) {
    match s.find(|c: char| c.is_ascii_whitespace()) {
        Some(i) => (&s[..i], &s[i..]),
        None => (s, ""),
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        f.write_str(&self.verb)?;
        for param in &self.params {
            write!(f, " {}", param)?;
        }
        if let Some(trailing) = &self.trailing {
            write!(f, " :{}", trailing)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_verb_and_params() {
        let msg = Message::parse("KICK #chat bob").unwrap();
        assert_eq!(msg.verb, "KICK");
        assert_eq!(msg.params, vec!["#chat", "bob"]);
        assert_eq!(msg.trailing, None);
    }

    #[test]
    fn parse_trailing_spans_to_end_of_line() {
        let msg = Message::parse("PRIVMSG #chat :hello there world").unwrap();
        assert_eq!(msg.verb, "PRIVMSG");
        assert_eq!(msg.params, vec!["#chat"]);
        assert_eq!(msg.trailing.as_deref(), Some("hello there world"));
    }

    #[test]
    fn parse_strips_slash_prefixes() {
        let msg = Message::parse("/join #chat").unwrap();
        assert_eq!(msg.verb, "JOIN");
        assert_eq!(msg.params, vec!["#chat"]);

        let msg = Message::parse("\\nick alice").unwrap();
        assert_eq!(msg.verb, "NICK");
    }

    #[test]
    fn parse_uppercases_verb() {
        let msg = Message::parse("privmsg bob :hi").unwrap();
        assert_eq!(msg.verb, "PRIVMSG");
    }

    #[test]
    fn parse_empty_verb_is_ignored() {
        assert_eq!(Message::parse(""), None);
        assert_eq!(Message::parse("   "), None);
        assert_eq!(Message::parse("///"), None);
    }

    #[test]
    fn parse_source_prefix() {
        let msg = Message::parse(":irc.localhost 001 alice :Welcome to the IRC server!").unwrap();
        assert_eq!(msg.prefix, Some(Prefix::Server("irc.localhost".into())));
        assert_eq!(msg.verb, "001");
        assert_eq!(msg.params, vec!["alice"]);
        assert_eq!(msg.trailing.as_deref(), Some("Welcome to the IRC server!"));
    }

    #[test]
    fn arg_spans_params_then_trailing() {
        let msg = Message::parse("USER alice 0 * :Alice A").unwrap();
        assert_eq!(msg.arg(0), Some("alice"));
        assert_eq!(msg.arg(1), Some("0"));
        assert_eq!(msg.arg(2), Some("*"));
        assert_eq!(msg.arg(3), Some("Alice A"));
        assert_eq!(msg.arg(4), None);
    }

    #[test]
    fn round_trip_preserves_trailing_boundary() {
        for line in [
            "PRIVMSG #chat :hi",
            "PART #chat :bye",
            ":bob!bob@localhost JOIN #chat",
            ":irc.localhost 353 alice = #chat :@alice bob",
            "PONG :irc.localhost",
        ] {
            let msg = Message::parse(line).unwrap();
            assert_eq!(msg.to_string(), line);
        }
    }
}
