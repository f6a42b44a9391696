//! Channel handlers: JOIN, PART, KICK, INVITE, TOPIC.

use skiff_proto::{Message, Prefix, Response};
use tracing::info;

use super::{
    err_chanoprivsneeded, err_needmoreparams, err_nosuchchannel, err_nosuchnick,
    err_notonchannel, err_usernotinchannel, server_reply, Context, Handler, HandlerResult,
};
use crate::state::Hub;

fn is_channel_name(name: &str) -> bool {
    name.starts_with('#') || name.starts_with('&')
}

/// Handler for JOIN.
///
/// `JOIN <channel> [<key>]` - the `#` prefix is prepended when absent.
/// Invite-only, user-limit, and key gates apply only to channels that
/// already exist; the creator of a new channel becomes its operator.
pub struct JoinHandler;

impl Handler for JoinHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let nick = ctx.nick();

        let raw = msg.arg(0).unwrap_or("");
        if raw.is_empty() {
            ctx.send(err_needmoreparams(&nick, "JOIN"));
            return Ok(());
        }
        let key = msg.arg(1).unwrap_or("");
        let name = if raw.starts_with('#') {
            raw.to_string()
        } else {
            format!("#{raw}")
        };

        if let Some(chan) = ctx.hub.channels.get(&name) {
            if chan.invite_only && !chan.is_invited(&nick) {
                ctx.send(
                    server_reply(Response::ERR_INVITEONLYCHAN)
                        .param(&nick)
                        .param(&name)
                        .trailing("Cannot join: Invite-only channel"),
                );
                return Ok(());
            }
            if chan.user_limit() > 0 && chan.member_count() >= chan.user_limit() {
                ctx.send(
                    server_reply(Response::ERR_CHANNELISFULL)
                        .param(&nick)
                        .param(&name)
                        .trailing("Cannot join: Channel is full"),
                );
                return Ok(());
            }
            if !chan.key().is_empty() && chan.key() != key {
                ctx.send(
                    server_reply(Response::ERR_BADCHANNELKEY)
                        .param(&nick)
                        .param(&name)
                        .trailing("Cannot join: Incorrect channel key"),
                );
                return Ok(());
            }
        }

        let Hub {
            clients, channels, ..
        } = ctx.hub;

        let (cl_nick, cl_user) = match clients.get_mut(ctx.conn) {
            Some(client) => {
                client.current_channel = name.clone();
                (
                    client.nickname.clone().unwrap_or_default(),
                    client.username.clone().unwrap_or_default(),
                )
            }
            None => return Ok(()),
        };

        let (chan, created) = channels.get_or_create(&name);
        chan.add_member(ctx.conn, cl_nick.clone(), cl_user.clone());
        if created {
            chan.make_operator(ctx.conn);
            info!(channel = %name, %cl_nick, "channel created");
        }

        let join_msg = Message::new("JOIN")
            .with_prefix(Prefix::user(cl_nick, cl_user))
            .param(&name);
        chan.broadcast(clients, &join_msg);

        if let Some(joiner) = clients.get(ctx.conn) {
            let topic_reply = if chan.topic.is_empty() {
                server_reply(Response::RPL_NOTOPIC)
                    .param(&nick)
                    .param(&name)
                    .trailing("No topic is set")
            } else {
                server_reply(Response::RPL_TOPIC)
                    .param(&nick)
                    .param(&name)
                    .trailing(chan.topic.clone())
            };
            joiner.send(topic_reply);

            joiner.send(
                server_reply(Response::RPL_NAMREPLY)
                    .param(&nick)
                    .param("=")
                    .param(&name)
                    .trailing(chan.names_list()),
            );
            joiner.send(
                server_reply(Response::RPL_ENDOFNAMES)
                    .param(&nick)
                    .param(&name)
                    .trailing("End of /NAMES list"),
            );
        }

        Ok(())
    }
}

/// Handler for PART.
pub struct PartHandler;

impl Handler for PartHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let nick = ctx.nick();

        let name = msg.arg(0).unwrap_or("");
        if name.is_empty() {
            ctx.send(err_needmoreparams(&nick, "PART"));
            return Ok(());
        }
        let part_text = msg.arg(1).filter(|t| !t.is_empty()).map(str::to_string);

        if !is_channel_name(name) || ctx.hub.channels.get(name).is_none() {
            ctx.send(err_nosuchchannel(&nick, name));
            return Ok(());
        }

        let member = ctx
            .hub
            .channels
            .get(name)
            .is_some_and(|c| c.is_member(ctx.conn));
        if !member {
            ctx.send(err_notonchannel(&nick, name));
            return Ok(());
        }

        let prefix = ctx.user_prefix();
        let mut part_msg = Message::new("PART").with_prefix(prefix).param(name);
        if let Some(text) = part_text {
            part_msg = part_msg.trailing(text);
        }

        let Hub {
            clients, channels, ..
        } = ctx.hub;
        if let Some(chan) = channels.get_mut(name) {
            chan.broadcast(clients, &part_msg);
            chan.remove_member(ctx.conn);
        }

        Ok(())
    }
}

/// Handler for KICK.
///
/// `KICK <channel> <nick>` - operator only; the kick is broadcast to every
/// member, the target included, before the target is removed.
pub struct KickHandler;

impl Handler for KickHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let nick = ctx.nick();

        let name = msg.arg(0).unwrap_or("");
        let target = msg.arg(1).unwrap_or("");
        if name.is_empty() || target.is_empty() {
            ctx.send(err_needmoreparams(&nick, "KICK"));
            return Ok(());
        }

        if !is_channel_name(name) || ctx.hub.channels.get(name).is_none() {
            ctx.send(err_nosuchchannel(&nick, name));
            return Ok(());
        }

        let is_op = ctx
            .hub
            .channels
            .get(name)
            .is_some_and(|c| c.is_operator(ctx.conn));
        if !is_op {
            ctx.send(err_chanoprivsneeded(&nick, name));
            return Ok(());
        }

        let target_conn = ctx.hub.clients.find_by_nickname(target);
        let target_is_member = target_conn.is_some_and(|t| {
            ctx.hub
                .channels
                .get(name)
                .is_some_and(|c| c.is_member(t))
        });
        let Some(target_conn) = target_conn.filter(|_| target_is_member) else {
            ctx.send(err_usernotinchannel(&nick, target, name));
            return Ok(());
        };

        let kick_msg = Message::new("KICK")
            .with_prefix(ctx.user_prefix())
            .param(name)
            .param(target)
            .trailing("Kicked by operator");

        let Hub {
            clients, channels, ..
        } = ctx.hub;
        if let Some(chan) = channels.get_mut(name) {
            chan.broadcast(clients, &kick_msg);
            chan.remove_member(target_conn);
        }

        info!(channel = %name, %target, by = %nick, "member kicked");
        Ok(())
    }
}

/// Handler for INVITE.
///
/// `INVITE <nick> <channel>` - operator only. Records the nickname in the
/// channel's invite set, which invite-only JOIN consults.
pub struct InviteHandler;

impl Handler for InviteHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let nick = ctx.nick();

        let target = msg.arg(0).unwrap_or("");
        let name = msg.arg(1).unwrap_or("");
        if target.is_empty() || name.is_empty() {
            ctx.send(err_needmoreparams(&nick, "INVITE"));
            return Ok(());
        }

        if !is_channel_name(name) || ctx.hub.channels.get(name).is_none() {
            ctx.send(err_nosuchchannel(&nick, name));
            return Ok(());
        }

        let is_op = ctx
            .hub
            .channels
            .get(name)
            .is_some_and(|c| c.is_operator(ctx.conn));
        if !is_op {
            ctx.send(err_chanoprivsneeded(&nick, name));
            return Ok(());
        }

        let Some(target_conn) = ctx.hub.clients.find_by_nickname(target) else {
            ctx.send(err_nosuchnick(&nick, target));
            return Ok(());
        };

        if let Some(chan) = ctx.hub.channels.get_mut(name) {
            chan.invite(target);
        }

        let invite_msg = Message::new("INVITE")
            .with_prefix(ctx.user_prefix())
            .param(target)
            .param(name);
        ctx.hub.send_to(target_conn, invite_msg);

        ctx.send(
            server_reply(Response::RPL_INVITING)
                .param(&nick)
                .param(target)
                .param(name)
                .trailing("Invitation sent"),
        );

        Ok(())
    }
}

/// Handler for TOPIC.
///
/// Without a topic argument this is a query (332/331); with one it sets the
/// topic, which is operator-only when the channel is topic-restricted.
pub struct TopicHandler;

impl Handler for TopicHandler {
    fn handle(&self, ctx: &mut Context<'_>, msg: &Message) -> HandlerResult {
        let nick = ctx.nick();

        let name = msg.arg(0).unwrap_or("");
        if name.is_empty() {
            ctx.send(err_needmoreparams(&nick, "TOPIC"));
            return Ok(());
        }

        if !is_channel_name(name) || ctx.hub.channels.get(name).is_none() {
            ctx.send(err_nosuchchannel(&nick, name));
            return Ok(());
        }

        let Some(new_topic) = msg.arg(1).map(str::to_string) else {
            // Query.
            let reply = match ctx.hub.channels.get(name) {
                Some(chan) if !chan.topic.is_empty() => server_reply(Response::RPL_TOPIC)
                    .param(&nick)
                    .param(name)
                    .trailing(chan.topic.clone()),
                _ => server_reply(Response::RPL_NOTOPIC)
                    .param(&nick)
                    .param(name)
                    .trailing("No topic is set"),
            };
            ctx.send(reply);
            return Ok(());
        };

        let restricted = ctx
            .hub
            .channels
            .get(name)
            .is_some_and(|c| c.topic_restricted && !c.is_operator(ctx.conn));
        if restricted {
            ctx.send(err_chanoprivsneeded(&nick, name));
            return Ok(());
        }

        let notification = Message::new("TOPIC")
            .with_prefix(ctx.user_prefix())
            .param(name)
            .trailing(new_topic.clone());

        let Hub {
            clients, channels, ..
        } = ctx.hub;
        if let Some(chan) = channels.get_mut(name) {
            chan.topic = new_topic;
            chan.broadcast(clients, &notification);
        }

        Ok(())
    }
}
