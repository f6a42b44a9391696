//! Messaging handlers: PRIVMSG and NOTICE.
//!
//! Both share delivery semantics; they differ only in failure reporting.
//! PRIVMSG failures are answered with numerics, NOTICE failures are logged
//! and otherwise silent, as the protocol demands.

use skiff_proto::{Message, Prefix};
use tracing::debug;

use super::{
    err_cannotsendtochan, err_needmoreparams, err_nosuchchannel, err_nosuchnick, Context,
    Handler, HandlerResult,
};
use crate::state::Hub;

fn is_channel_name(name: &str) -> bool {
    name.starts_with('#') || name.starts_with('&')
}

/// How delivery problems are reported back to the sender.
enum Feedback {
    Numerics,
    Silent,
}

fn deliver(ctx: &mut Context<'_>, msg: &Message, verb: &str, feedback: Feedback) -> HandlerResult {
    let nick = ctx.nick();

    let target = msg.arg(0).unwrap_or("").to_string();
    let text = msg.arg(1).unwrap_or("").to_string();
    if target.is_empty() || text.is_empty() {
        match feedback {
            Feedback::Numerics => ctx.send(err_needmoreparams(&nick, verb)),
            Feedback::Silent => debug!(%nick, verb, "not enough parameters"),
        }
        return Ok(());
    }

    if is_channel_name(&target) {
        let Some(chan) = ctx.hub.channels.get(&target) else {
            match feedback {
                Feedback::Numerics => ctx.send(err_nosuchchannel(&nick, &target)),
                Feedback::Silent => debug!(%nick, %target, "no such channel"),
            }
            return Ok(());
        };
        let Some(member) = chan.member(ctx.conn) else {
            match feedback {
                Feedback::Numerics => ctx.send(err_cannotsendtochan(&nick, &target)),
                Feedback::Silent => debug!(%nick, %target, "not a member of channel"),
            }
            return Ok(());
        };

        // Prefix built from the identity cached on the channel at join time.
        let relay = Message::new(verb)
            .with_prefix(Prefix::user(member.nick.clone(), member.user.clone()))
            .param(&target)
            .trailing(text);

        let Hub {
            clients, channels, ..
        } = ctx.hub;
        if let Some(chan) = channels.get(&target) {
            chan.relay_from(clients, ctx.conn, &relay);
        }
    } else {
        let Some(recipient) = ctx.hub.clients.find_by_nickname(&target) else {
            match feedback {
                Feedback::Numerics => ctx.send(err_nosuchnick(&nick, &target)),
                Feedback::Silent => debug!(%nick, %target, "no such nick"),
            }
            return Ok(());
        };

        let direct = Message::new(verb)
            .with_prefix(ctx.user_prefix())
            .param(&target)
            .trailing(text);
        ctx.hub.send_to(recipient, direct);
    }

    Ok(())
}

/// Handler for PRIVMSG.
pub struct PrivmsgHandler;

impl Handler for PrivmsgHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        deliver(ctx, msg, "PRIVMSG", Feedback::Numerics)
    }
}

/// Handler for NOTICE. Never generates numeric replies.
pub struct NoticeHandler;

impl Handler for NoticeHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        deliver(ctx, msg, "NOTICE", Feedback::Silent)
    }
}
