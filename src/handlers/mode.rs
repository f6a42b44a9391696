//! MODE handler.
//!
//! Validates the request (parameters, channel existence, operator
//! privilege) and delegates the mode table itself to
//! [`Channel::set_mode`](crate::state::Channel::set_mode).

use skiff_proto::Message;

use super::{
    err_chanoprivsneeded, err_needmoreparams, err_nosuchchannel, Context, Handler, HandlerResult,
};
use crate::state::Hub;

fn is_channel_name(name: &str) -> bool {
    name.starts_with('#') || name.starts_with('&')
}

/// Handler for MODE: `MODE <channel> <modespec> [<param>]`.
pub struct ModeHandler;

impl Handler for ModeHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let nick = ctx.nick();

        let name = msg.arg(0).unwrap_or("").to_string();
        let mode = msg.arg(1).unwrap_or("").to_string();
        if name.is_empty() || mode.is_empty() {
            ctx.send(err_needmoreparams(&nick, "MODE"));
            return Ok(());
        }
        let param = msg.arg(2).map(str::to_string);

        if !is_channel_name(&name) || ctx.hub.channels.get(&name).is_none() {
            ctx.send(err_nosuchchannel(&nick, &name));
            return Ok(());
        }

        let is_op = ctx
            .hub
            .channels
            .get(&name)
            .is_some_and(|c| c.is_operator(ctx.conn));
        if !is_op {
            ctx.send(err_chanoprivsneeded(&nick, &name));
            return Ok(());
        }

        let Hub {
            clients, channels, ..
        } = ctx.hub;
        if let Some(chan) = channels.get_mut(&name) {
            chan.set_mode(clients, ctx.conn, &mode, param.as_deref());
        }

        Ok(())
    }
}
