use crate::errors::ProtocolError;
use crate::message::Message;
use crate::parsers::is_channel_target;
use crate::replies::Reply;
use crate::server_state::ServerState;
use crate::users::UserId;

// RFC 1459, 4.4 Sending messages
//
//    The main purpose of the IRC protocol is to provide a base for
//    clients to communicate with each other. PRIVMSG and NOTICE are the
//    only messages available which actually perform delivery of a text
//    message from one client to another.
//
//    NOTICE must never trigger automatic replies: delivery failures are
//    silent where PRIVMSG would be told 401/403/404. Channel relays go to
//    every member except the sender, carrying the sender's full prefix;
//    outsiders cannot write into a channel at all (+n is permanently on).

pub fn handle_privmsg(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    relay(state, id, msg, false)
}

pub fn handle_notice(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    relay(state, id, msg, true)
}

fn relay(state: &mut ServerState, id: UserId, msg: &Message, notice: bool) -> Result<(), ProtocolError> {
    let command = if notice { "NOTICE" } else { "PRIVMSG" };

    // A lone trailing is text without a recipient, not a recipient.
    let Some(targets) = msg.params.first().cloned() else {
        if notice {
            return Ok(());
        }
        return Err(ProtocolError::NoRecipient(command.to_owned()));
    };
    let text = match msg.arg(1) {
        Some(text) if !text.is_empty() => text.to_owned(),
        _ => {
            if notice {
                return Ok(());
            }
            return Err(ProtocolError::NoTextToSend);
        }
    };

    for target in targets.split(',') {
        if target.is_empty() {
            continue;
        }
        if let Err(err) = relay_one(state, id, target, &text, notice) {
            if !notice {
                state.send_error(id, &err);
            }
        }
    }
    Ok(())
}

fn relay_one(
    state: &mut ServerState,
    id: UserId,
    target: &str,
    text: &str,
    notice: bool,
) -> Result<(), ProtocolError> {
    let prefix = state
        .user(id)
        .map(|u| u.full_prefix())
        .ok_or(ProtocolError::NotRegistered)?;

    if is_channel_target(target) {
        let chan = state
            .channel(target)
            .ok_or_else(|| ProtocolError::NoSuchChannel(target.to_owned()))?;
        if !chan.is_member(id) {
            return Err(ProtocolError::CannotSendToChan(target.to_owned()));
        }
        let display = chan.name.clone();
        let line = render_relay(state, notice, &prefix, &display, text);
        state.broadcast_channel(&display, &line, Some(id));
    } else {
        let target_id = state
            .lookup_nick(target)
            .ok_or_else(|| ProtocolError::NoSuchNick(target.to_owned()))?;
        let line = render_relay(state, notice, &prefix, target, text);
        state.send_line(target_id, &line);
    }
    Ok(())
}

fn render_relay(state: &ServerState, notice: bool, prefix: &str, target: &str, text: &str) -> String {
    if notice {
        state.render(&Reply::Notice { prefix, target, text })
    } else {
        state.render(&Reply::Privmsg { prefix, target, text })
    }
}
