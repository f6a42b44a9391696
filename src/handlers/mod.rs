//! IRC command handlers.
//!
//! This module contains the Handler trait and command registry for
//! dispatching incoming IRC messages, plus the registration automaton that
//! gates every command behind the password / nickname / username handshake.

mod channel;
mod connection;
mod messaging;
mod mode;

pub use channel::{InviteHandler, JoinHandler, KickHandler, PartHandler, TopicHandler};
pub use connection::{NickHandler, PassHandler, PingHandler, PongHandler, QuitHandler, UserHandler};
pub use messaging::{NoticeHandler, PrivmsgHandler};
pub use mode::ModeHandler;

use std::collections::HashMap;

use skiff_proto::{Message, Prefix, Response};
use thiserror::Error;
use tracing::info;

use crate::network::ConnId;
use crate::state::Hub;

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// The connection the message arrived on.
    pub conn: ConnId,
    /// Shared server state.
    pub hub: &'a mut Hub,
}

impl Context<'_> {
    /// Queue a frame for the requesting connection.
    pub fn send(&self, msg: Message) {
        self.hub.send_to(self.conn, msg);
    }

    /// The requesting client's display nickname (`*` until one is set).
    pub fn nick(&self) -> String {
        self.hub
            .clients
            .get(self.conn)
            .map(|c| c.display_nick().to_string())
            .unwrap_or_else(|| "*".to_string())
    }

    /// The requesting client's prefix, `nick!user@localhost`.
    pub fn user_prefix(&self) -> Prefix {
        let client = self.hub.clients.get(self.conn);
        let nick = client
            .and_then(|c| c.nickname.clone())
            .unwrap_or_default();
        let user = client
            .and_then(|c| c.username.clone())
            .unwrap_or_default();
        Prefix::user(nick, user)
    }
}

/// Errors that abort command handling and end the connection.
///
/// Per-command protocol errors never surface here: they are answered with a
/// numeric reply and the handler returns `Ok`.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Disconnect the client; the error reply has already been sent.
    #[error("access denied")]
    AccessDenied,
    /// The client asked to quit.
    #[error("client quit: {0:?}")]
    Quit(Option<String>),
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Trait implemented by all command handlers.
///
/// Handlers run synchronously on the server loop and complete before the
/// next event is taken; they may freely mutate the hub.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult;
}

/// Registry of command handlers, plus the registration automaton that runs
/// ahead of them.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        // Connection/registration handlers
        handlers.insert("PASS", Box::new(PassHandler));
        handlers.insert("NICK", Box::new(NickHandler));
        handlers.insert("USER", Box::new(UserHandler));
        handlers.insert("PING", Box::new(PingHandler));
        handlers.insert("PONG", Box::new(PongHandler));
        handlers.insert("QUIT", Box::new(QuitHandler));

        // Channel handlers
        handlers.insert("JOIN", Box::new(JoinHandler));
        handlers.insert("PART", Box::new(PartHandler));
        handlers.insert("TOPIC", Box::new(TopicHandler));
        handlers.insert("KICK", Box::new(KickHandler));
        handlers.insert("INVITE", Box::new(InviteHandler));
        handlers.insert("MODE", Box::new(ModeHandler));

        // Messaging handlers
        handlers.insert("PRIVMSG", Box::new(PrivmsgHandler));
        handlers.insert("NOTICE", Box::new(NoticeHandler));

        Self { handlers }
    }

    /// Dispatch one message, driving the registration automaton first.
    ///
    /// States: awaiting password -> awaiting nick/user -> registered. PING
    /// is answered in any state. Before authentication only PASS advances;
    /// anything else repeats the password prompt. After authentication,
    /// NICK and USER may arrive in either order; the one-time welcome burst
    /// fires as soon as both have succeeded. Every other command requires
    /// full registration and otherwise draws a 451.
    pub fn dispatch(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let verb = msg.verb.as_str();

        if verb == "PING" {
            return self.run("PING", ctx, msg);
        }

        let Some(client) = ctx.hub.clients.get(ctx.conn) else {
            return Ok(());
        };

        if !client.authenticated {
            if verb == "PASS" {
                return self.run("PASS", ctx, msg);
            }
            ctx.send(password_prompt());
            return Ok(());
        }

        if matches!(verb, "PASS" | "NICK" | "USER") {
            self.run(verb, ctx, msg)?;
            maybe_send_welcome(ctx);
            return Ok(());
        }

        maybe_send_welcome(ctx);

        let registered = ctx
            .hub
            .clients
            .get(ctx.conn)
            .is_some_and(|c| c.is_registered());
        if !registered {
            ctx.send(
                server_reply(Response::ERR_NOTREGISTERED)
                    .param("*")
                    .trailing("You have not registered"),
            );
            return Ok(());
        }

        match self.handlers.get(verb) {
            Some(handler) => handler.handle(ctx, msg),
            None => {
                info!(verb, "unknown command");
                ctx.send(
                    server_reply(Response::ERR_UNKNOWNCOMMAND)
                        .param("*")
                        .param(verb)
                        .trailing("Unknown command"),
                );
                Ok(())
            }
        }
    }

    fn run(&self, verb: &str, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        match self.handlers.get(verb) {
            Some(handler) => handler.handle(ctx, msg),
            None => Ok(()),
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Emit the one-time welcome burst once the client is fully registered.
fn maybe_send_welcome(ctx: &mut Context<'_>) {
    let Some(client) = ctx.hub.clients.get_mut(ctx.conn) else {
        return;
    };
    if client.welcome_sent || !client.is_registered() {
        return;
    }
    client.welcome_sent = true;
    let nick = client.display_nick().to_string();

    info!(conn = %ctx.conn, %nick, "client registered");

    ctx.send(
        server_reply(Response::RPL_WELCOME)
            .param(&nick)
            .trailing("Welcome to the IRC server!"),
    );
    ctx.send(
        server_reply(Response::RPL_MOTDSTART)
            .param(&nick)
            .trailing("- IRC Message of the Day -"),
    );
    ctx.send(
        server_reply(Response::RPL_ENDOFMOTD)
            .param(&nick)
            .trailing("End of /MOTD command."),
    );
}

/// The password prompt sent on connect (with a final period) and repeated
/// on any pre-authentication command (without one).
pub fn greeting() -> Message {
    server_notice("Please enter the password using PASS <password>.")
}

fn password_prompt() -> Message {
    server_notice("Please enter the password using PASS <password>")
}

/// Build a `NOTICE * :<text>` from the server.
pub fn server_notice(text: impl Into<String>) -> Message {
    Message::new("NOTICE")
        .with_prefix(Prefix::server())
        .param("*")
        .trailing(text)
}

/// Start a numeric reply from the server.
pub fn server_reply(code: Response) -> Message {
    Message::new(code.to_string()).with_prefix(Prefix::server())
}

// ============================================================================
// Common error reply helpers
// ============================================================================

/// 461 - not enough parameters.
pub fn err_needmoreparams(nick: &str, command: &str) -> Message {
    server_reply(Response::ERR_NEEDMOREPARAMS)
        .param(nick)
        .param(command)
        .trailing("Not enough parameters")
}

/// 401 - no such nick/channel.
pub fn err_nosuchnick(nick: &str, target: &str) -> Message {
    server_reply(Response::ERR_NOSUCHNICK)
        .param(nick)
        .param(target)
        .trailing("No such nick/channel")
}

/// 403 - no such channel.
pub fn err_nosuchchannel(nick: &str, channel: &str) -> Message {
    server_reply(Response::ERR_NOSUCHCHANNEL)
        .param(nick)
        .param(channel)
        .trailing("No such channel")
}

/// 404 - cannot send to channel.
pub fn err_cannotsendtochan(nick: &str, channel: &str) -> Message {
    server_reply(Response::ERR_CANNOTSENDTOCHAN)
        .param(nick)
        .param(channel)
        .trailing("Cannot send to channel")
}

/// 442 - you're not on that channel.
pub fn err_notonchannel(nick: &str, channel: &str) -> Message {
    server_reply(Response::ERR_NOTONCHANNEL)
        .param(nick)
        .param(channel)
        .trailing("You're not on that channel")
}

/// 441 - they aren't on that channel.
pub fn err_usernotinchannel(nick: &str, target: &str, channel: &str) -> Message {
    server_reply(Response::ERR_USERNOTINCHANNEL)
        .param(nick)
        .param(target)
        .param(channel)
        .trailing("They aren't on that channel")
}

/// 482 - you're not channel operator.
pub fn err_chanoprivsneeded(nick: &str, channel: &str) -> Message {
    server_reply(Response::ERR_CHANOPRIVSNEEDED)
        .param(nick)
        .param(channel)
        .trailing("You're not channel operator")
}
