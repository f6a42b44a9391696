//! Connection and registration handlers: PASS, NICK, USER, PING, PONG, QUIT.

use skiff_proto::{Message, Prefix, Response, SERVER_NAME};
use tracing::{debug, info};

use super::{server_notice, server_reply, Context, Handler, HandlerError, HandlerResult};
use crate::state::Hub;

/// Handler for PASS.
///
/// Compares the supplied password against the server password. A wrong
/// password is answered with 464 and ends the connection.
pub struct PassHandler;

impl Handler for PassHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let already = ctx
            .hub
            .clients
            .get(ctx.conn)
            .is_some_and(|c| c.authenticated);
        if already {
            return Ok(());
        }

        let supplied = msg.arg(0).unwrap_or("");
        if supplied.is_empty() {
            ctx.send(
                server_reply(Response::ERR_NEEDMOREPARAMS)
                    .param("*")
                    .param("PASS")
                    .trailing("Not enough parameters."),
            );
            return Ok(());
        }

        if ctx.hub.password_matches(supplied) {
            if let Some(client) = ctx.hub.clients.get_mut(ctx.conn) {
                client.authenticated = true;
            }
            ctx.send(server_notice(
                "Password accepted. Please enter NICK and USER.",
            ));
            Ok(())
        } else {
            info!(conn = %ctx.conn, "password rejected");
            ctx.send(
                server_reply(Response::ERR_PASSWDMISMATCH)
                    .param("*")
                    .trailing("Incorrect password."),
            );
            Err(HandlerError::AccessDenied)
        }
    }
}

/// Handler for NICK.
///
/// Sets the nickname. Uniqueness is not enforced; a rename does not refresh
/// the nick cached in channel membership.
pub struct NickHandler;

impl Handler for NickHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let nick = msg.arg(0).unwrap_or("");
        if nick.is_empty() {
            ctx.send(
                server_reply(Response::ERR_NONICKNAMEGIVEN)
                    .param("*")
                    .trailing("No nickname given"),
            );
            return Ok(());
        }

        if let Some(client) = ctx.hub.clients.get_mut(ctx.conn) {
            client.nickname = Some(nick.to_string());
            debug!(conn = %ctx.conn, %nick, "nick set");
        }
        Ok(())
    }
}

/// Handler for USER.
///
/// `USER <username> <mode> <unused> :<realname>` - at least four arguments
/// are required; the realname is accepted but not retained. Accepted after
/// registration too, silently overwriting.
pub struct UserHandler;

impl Handler for UserHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        if msg.arg(3).is_none() {
            ctx.send(
                server_reply(Response::ERR_NEEDMOREPARAMS)
                    .param("*")
                    .param("USER")
                    .trailing("Not enough parameters"),
            );
            return Ok(());
        }

        let username = msg.arg(0).unwrap_or("");
        if username.is_empty() {
            ctx.send(
                server_reply(Response::ERR_NEEDMOREPARAMS)
                    .param("*")
                    .param("USER")
                    .trailing("Invalid username"),
            );
            return Ok(());
        }

        if let Some(client) = ctx.hub.clients.get_mut(ctx.conn) {
            client.username = Some(username.to_string());
            debug!(conn = %ctx.conn, user = %username, "user set");
        }
        Ok(())
    }
}

/// Handler for PING. Answered in any registration state.
pub struct PingHandler;

impl Handler for PingHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let token = match msg.arg(0) {
            Some(t) if !t.is_empty() => t,
            _ => SERVER_NAME,
        };
        ctx.send(Message::new("PONG").trailing(token));
        Ok(())
    }
}

/// Handler for PONG. Accepted and ignored; there is no keep-alive tracking.
pub struct PongHandler;

impl Handler for PongHandler {
    fn handle(&self, _ctx: &mut Context<'_>, _msg: &Message) -> HandlerResult {
        Ok(())
    }
}

/// Handler for QUIT.
///
/// Broadcasts a QUIT notification to every channel the client is in (the
/// client still sees its own), removes the membership, and ends the
/// connection.
pub struct QuitHandler;

impl Handler for QuitHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let reason = msg.arg(0).filter(|r| !r.is_empty()).map(str::to_string);

        let (nick, user) = match ctx.hub.clients.get(ctx.conn) {
            Some(client) => (
                client.nickname.clone().unwrap_or_default(),
                client.username.clone().unwrap_or_default(),
            ),
            None => return Err(HandlerError::Quit(reason)),
        };

        let mut quit_msg = Message::new("QUIT").with_prefix(Prefix::user(nick.clone(), user));
        if let Some(reason) = &reason {
            quit_msg = quit_msg.trailing(reason.clone());
        }

        let Hub {
            clients, channels, ..
        } = ctx.hub;
        for channel in channels.iter_mut() {
            if channel.is_member(ctx.conn) {
                channel.broadcast(clients, &quit_msg);
                channel.remove_member(ctx.conn);
            }
        }

        info!(conn = %ctx.conn, %nick, reason = ?reason, "client quit");
        Err(HandlerError::Quit(reason))
    }
}
