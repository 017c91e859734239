use crate::casemap::casefold;
use crate::errors::ProtocolError;
use crate::message::Message;
use crate::parsers::{is_valid_channel_name, is_valid_key};
use crate::replies::Reply;
use crate::server_state::{ServerState, epoch_secs};
use crate::users::UserId;

use super::miscellanneous::send_names_reply;

// RFC 1459, 4.2 Channel operations
//
//    Note that these messages may take a list of targets. The server
//    answers per target: one bad channel in a JOIN list must not keep the
//    session out of the others, so per-target failures are rendered
//    inline and the loop continues.

// 4.2.1 Join message
//
//       Command: JOIN
//    Parameters: <channel>{,<channel>} [<key>{,<key>}]
//
//    A user's JOIN is gated, in order, by the channel key (+k), the user
//    limit (+l) and the invite-only flag (+i). The first joiner creates
//    the channel and comes out as its operator. A successful join is
//    echoed to every member including the joiner, followed by the topic
//    and the names list. "JOIN 0" leaves every joined channel instead.
pub fn handle_join(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let chans = msg.arg(0).unwrap_or_default().to_owned();
    if chans == "0" {
        return part_all(state, id);
    }
    let keys: Vec<&str> = msg
        .arg(1)
        .map(|list| list.split(',').collect())
        .unwrap_or_default();
    for (idx, name) in chans.split(',').enumerate() {
        if name.is_empty() {
            continue;
        }
        if let Err(err) = join_one(state, id, name, keys.get(idx).copied()) {
            state.send_error(id, &err);
        }
    }
    Ok(())
}

fn join_one(
    state: &mut ServerState,
    id: UserId,
    name: &str,
    key: Option<&str>,
) -> Result<(), ProtocolError> {
    if !is_valid_channel_name(name) {
        return Err(ProtocolError::BadChanMask(name.to_owned()));
    }
    let folded_nick = state
        .user(id)
        .and_then(|u| u.nick.as_deref())
        .map(casefold)
        .ok_or(ProtocolError::NotRegistered)?;

    if let Some(chan) = state.channel(name) {
        if chan.is_member(id) {
            // Already in: no state change, no broadcast.
            return Ok(());
        }
        if let Some(required) = &chan.modes.key {
            // A key that is not even well-formed can never match.
            match key {
                Some(supplied) if is_valid_key(supplied) && supplied == required.as_str() => {}
                _ => return Err(ProtocolError::BadChannelKey(name.to_owned())),
            }
        }
        if chan.is_full() {
            return Err(ProtocolError::ChannelIsFull(name.to_owned()));
        }
        if chan.modes.invite_only && !chan.invited.contains(&folded_nick) {
            return Err(ProtocolError::InviteOnlyChan(name.to_owned()));
        }
    }

    state.add_member(id, name);
    let chan = state.channel_mut(name).expect("just joined");
    chan.invited.remove(&folded_nick);
    let display = chan.name.clone();

    let prefix = state.user(id).expect("session exists").full_prefix();
    let join_line = state.render(&Reply::Join {
        prefix: &prefix,
        channel: &display,
    });
    state.broadcast_channel(&display, &join_line, None);
    send_topic_reply(state, id, &display);
    send_names_reply(state, id, &display);
    Ok(())
}

// 4.2.2 Part message
//
//       Command: PART
//    Parameters: <channel>{,<channel>} [:<Part Message>]
pub fn handle_part(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let chans = msg.arg(0).unwrap_or_default().to_owned();
    let reason = msg.arg(1).map(str::to_owned);
    for name in chans.split(',') {
        if name.is_empty() {
            continue;
        }
        if let Err(err) = part_one(state, id, name, reason.as_deref()) {
            state.send_error(id, &err);
        }
    }
    Ok(())
}

fn part_one(
    state: &mut ServerState,
    id: UserId,
    name: &str,
    reason: Option<&str>,
) -> Result<(), ProtocolError> {
    let chan = state
        .channel(name)
        .ok_or_else(|| ProtocolError::NoSuchChannel(name.to_owned()))?;
    if !chan.is_member(id) {
        return Err(ProtocolError::NotOnChannel(name.to_owned()));
    }
    let display = chan.name.clone();
    let prefix = state.user(id).expect("session exists").full_prefix();
    let line = state.render(&Reply::Part {
        prefix: &prefix,
        channel: &display,
        reason,
    });
    state.broadcast_channel(&display, &line, None);
    state.remove_member(id, &display);
    Ok(())
}

/// JOIN 0: an ordinary PART from every joined channel.
fn part_all(state: &mut ServerState, id: UserId) -> Result<(), ProtocolError> {
    let joined: Vec<String> = state
        .user(id)
        .map(|u| u.member_of.iter().cloned().collect())
        .unwrap_or_default();
    for key in joined {
        if let Err(err) = part_one(state, id, &key, None) {
            state.send_error(id, &err);
        }
    }
    Ok(())
}

// 4.2.8 Kick command
//
//       Command: KICK
//    Parameters: <channel> <user> [<comment>]
//
//    Only a channel operator may kick; the KICK is shown to every member
//    including the target, then the target is removed.
pub fn handle_kick(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let name = msg.arg(0).unwrap_or_default().to_owned();
    let target_nick = msg.arg(1).unwrap_or_default().to_owned();
    let chan = state
        .channel(&name)
        .ok_or_else(|| ProtocolError::NoSuchChannel(name.clone()))?;
    if !chan.is_member(id) {
        return Err(ProtocolError::NotOnChannel(name));
    }
    if !chan.is_operator(id) {
        return Err(ProtocolError::ChanOpPrivsNeeded(name));
    }
    let target_id = state
        .lookup_nick(&target_nick)
        .filter(|t| chan.is_member(*t))
        .ok_or_else(|| ProtocolError::UserNotInChannel(target_nick.clone(), name.clone()))?;
    let display = chan.name.clone();

    let kicker = state.user(id).expect("session exists");
    let prefix = kicker.full_prefix();
    let default_reason = kicker.nick_or_star().to_owned();
    let reason = msg.arg(2).unwrap_or(&default_reason).to_owned();
    let line = state.render(&Reply::Kick {
        prefix: &prefix,
        channel: &display,
        target: &target_nick,
        reason: &reason,
    });
    state.broadcast_channel(&display, &line, None);
    state.remove_member(target_id, &display);
    Ok(())
}

// 4.2.7 Invite message
//
//       Command: INVITE
//    Parameters: <nickname> <channel>
//
//    Only the inviter and the invited hear about it. On an invite-only
//    channel the inviter must be an operator. The invitation lets the
//    target through +i exactly once, and dies with the channel.
pub fn handle_invite(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let target_nick = msg.arg(0).unwrap_or_default().to_owned();
    let name = msg.arg(1).unwrap_or_default().to_owned();

    let target_id = state
        .lookup_nick(&target_nick)
        .ok_or_else(|| ProtocolError::NoSuchNick(target_nick.clone()))?;
    let chan = state
        .channel(&name)
        .ok_or_else(|| ProtocolError::NoSuchChannel(name.clone()))?;
    if !chan.is_member(id) {
        return Err(ProtocolError::NotOnChannel(name));
    }
    if chan.modes.invite_only && !chan.is_operator(id) {
        return Err(ProtocolError::ChanOpPrivsNeeded(name));
    }
    let display = chan.name.clone();

    let target_display = state
        .user(target_id)
        .and_then(|u| u.nick.clone())
        .unwrap_or(target_nick);
    state
        .channel_mut(&display)
        .expect("resolved above")
        .invited
        .insert(casefold(&target_display));

    let inviter = state.user(id).expect("session exists");
    let prefix = inviter.full_prefix();
    let nick = inviter.nick_or_star().to_owned();
    let invite_line = state.render(&Reply::Invite {
        prefix: &prefix,
        target: &target_display,
        channel: &display,
    });
    state.send_line(target_id, &invite_line);
    state.send_reply(
        id,
        &Reply::Inviting {
            nick: &nick,
            target: &target_display,
            channel: &display,
        },
    );
    Ok(())
}

// 4.2.4 Topic message
//
//       Command: TOPIC
//    Parameters: <channel> [<topic>]
//
//    Without a topic argument this is a query. Setting honours +t (ops
//    only); an empty topic clears it. Setter and timestamp are recorded
//    on every set, even one that repeats the current text.
pub fn handle_topic(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let name = msg.arg(0).unwrap_or_default().to_owned();
    let chan = state
        .channel(&name)
        .ok_or_else(|| ProtocolError::NoSuchChannel(name.clone()))?;
    if !chan.is_member(id) {
        return Err(ProtocolError::NotOnChannel(name));
    }
    let display = chan.name.clone();

    let Some(new_topic) = msg.arg(1).map(str::to_owned) else {
        send_topic_reply(state, id, &display);
        return Ok(());
    };

    let chan = state.channel(&display).expect("resolved above");
    if chan.modes.topic_lock && !chan.is_operator(id) {
        return Err(ProtocolError::ChanOpPrivsNeeded(display));
    }
    let user = state.user(id).expect("session exists");
    let prefix = user.full_prefix();
    let setter = user.nick_or_star().to_owned();

    let chan = state.channel_mut(&display).expect("resolved above");
    chan.topic = (!new_topic.is_empty()).then(|| new_topic.clone());
    chan.topic_set_by = Some(setter);
    chan.topic_set_at = Some(epoch_secs());

    let line = state.render(&Reply::TopicSet {
        prefix: &prefix,
        channel: &display,
        topic: &new_topic,
    });
    state.broadcast_channel(&display, &line, None);
    Ok(())
}

/// 332 (+333) or 331 for one channel; used by TOPIC queries and the JOIN
/// burst.
pub fn send_topic_reply(state: &mut ServerState, id: UserId, name: &str) {
    let Some(chan) = state.channel(name) else {
        return;
    };
    let display = chan.name.clone();
    let topic = chan.topic.clone();
    let set_by = chan.topic_set_by.clone();
    let set_at = chan.topic_set_at;
    let nick = state
        .user(id)
        .map(|u| u.nick_or_star().to_owned())
        .unwrap_or_else(|| "*".to_owned());

    match topic {
        Some(topic) => {
            state.send_reply(
                id,
                &Reply::TopicIs {
                    nick: &nick,
                    channel: &display,
                    topic: &topic,
                },
            );
            if let (Some(setter), Some(at)) = (set_by, set_at) {
                state.send_reply(
                    id,
                    &Reply::TopicWhoTime {
                        nick: &nick,
                        channel: &display,
                        setter: &setter,
                        set_at: at,
                    },
                );
            }
        }
        None => state.send_reply(
            id,
            &Reply::NoTopic {
                nick: &nick,
                channel: &display,
            },
        ),
    }
}

// 4.2.3 Mode message (channel form)
//
//       Command: MODE
//    Parameters: <channel> {[+|-]|i|t|s|n|k|l|o|b} [<args>]
//
//    A bare channel argument queries 324/329. Changes require operator
//    rights and are re-broadcast as one normalized MODE line describing
//    only what actually changed. Argument consumption: +k and +o/-o and
//    -k each take one, +l takes a positive integer, -l takes none. The
//    ban list is not kept; querying it answers the empty 368.
pub fn handle_channel_mode(
    state: &mut ServerState,
    id: UserId,
    msg: &Message,
) -> Result<(), ProtocolError> {
    let name = msg.arg(0).unwrap_or_default().to_owned();
    let chan = state
        .channel(&name)
        .ok_or_else(|| ProtocolError::NoSuchChannel(name.clone()))?;
    let display = chan.name.clone();
    let nick = state
        .user(id)
        .map(|u| u.nick_or_star().to_owned())
        .unwrap_or_else(|| "*".to_owned());

    let Some(modestring) = msg.arg(1).map(str::to_owned) else {
        let chan = state.channel(&display).expect("resolved above");
        let modes = chan.modes.mode_string();
        let created_at = chan.created_at;
        state.send_reply(
            id,
            &Reply::ChannelModeIs {
                nick: &nick,
                channel: &display,
                modes: &modes,
            },
        );
        state.send_reply(
            id,
            &Reply::CreationTime {
                nick: &nick,
                channel: &display,
                created_at,
            },
        );
        return Ok(());
    };

    // Ban-list query stands alone: no rights needed, constant answer.
    if msg.arg_count() == 2 && modestring.trim_start_matches(['+', '-']) == "b" {
        state.send_reply(
            id,
            &Reply::EndOfBanList {
                nick: &nick,
                channel: &display,
            },
        );
        return Ok(());
    }

    let chan = state.channel(&display).expect("resolved above");
    if !chan.is_member(id) {
        return Err(ProtocolError::NotOnChannel(display));
    }
    if !chan.is_operator(id) {
        return Err(ProtocolError::ChanOpPrivsNeeded(display));
    }

    apply_channel_modes(state, id, &display, &modestring, msg)
}

/// One applied change; `arg` rides along into the normalized broadcast.
struct AppliedMode {
    sign: char,
    letter: char,
    arg: Option<String>,
}

fn apply_channel_modes(
    state: &mut ServerState,
    id: UserId,
    display: &str,
    modestring: &str,
    msg: &Message,
) -> Result<(), ProtocolError> {
    let mut applied: Vec<AppliedMode> = Vec::new();
    let mut sign = '+';
    // Args start after <channel> <modestring>.
    let mut next_arg = 2usize;
    let mut take_arg = || -> Option<String> {
        let arg = msg.arg(next_arg).map(str::to_owned);
        if arg.is_some() {
            next_arg += 1;
        }
        arg
    };

    for letter in modestring.chars() {
        match letter {
            '+' | '-' => sign = letter,
            'i' => {
                let chan = state.channel_mut(display).expect("resolved");
                let on = sign == '+';
                if chan.modes.invite_only != on {
                    chan.modes.invite_only = on;
                    applied.push(AppliedMode { sign, letter, arg: None });
                }
            }
            't' => {
                let chan = state.channel_mut(display).expect("resolved");
                let on = sign == '+';
                if chan.modes.topic_lock != on {
                    chan.modes.topic_lock = on;
                    applied.push(AppliedMode { sign, letter, arg: None });
                }
            }
            's' => {
                let chan = state.channel_mut(display).expect("resolved");
                let on = sign == '+';
                if chan.modes.secret != on {
                    chan.modes.secret = on;
                    applied.push(AppliedMode { sign, letter, arg: None });
                }
            }
            // No-external-messages is permanently on: +n is a no-change,
            // -n is ignored.
            'n' => {}
            'k' => {
                if sign == '+' {
                    let key = take_arg()
                        .ok_or_else(|| ProtocolError::NeedMoreParams("MODE".to_owned()))?;
                    if !is_valid_key(&key) {
                        log::debug!("ignoring malformed MODE +k argument {key:?}");
                        continue;
                    }
                    let chan = state.channel_mut(display).expect("resolved");
                    if chan.modes.key.as_deref() != Some(key.as_str()) {
                        chan.modes.key = Some(key.clone());
                        applied.push(AppliedMode { sign, letter, arg: Some(key) });
                    }
                } else {
                    // Unset consumes a key argument if one is there, but
                    // never compares it.
                    let _ = take_arg();
                    let chan = state.channel_mut(display).expect("resolved");
                    if chan.modes.key.take().is_some() {
                        applied.push(AppliedMode { sign, letter, arg: None });
                    }
                }
            }
            'l' => {
                if sign == '+' {
                    let raw = take_arg()
                        .ok_or_else(|| ProtocolError::NeedMoreParams("MODE".to_owned()))?;
                    match raw.parse::<usize>() {
                        Ok(limit) if limit > 0 => {
                            let chan = state.channel_mut(display).expect("resolved");
                            if chan.modes.limit != Some(limit) {
                                chan.modes.limit = Some(limit);
                                applied.push(AppliedMode { sign, letter, arg: Some(raw) });
                            }
                        }
                        _ => log::debug!("ignoring non-positive MODE +l argument {raw:?}"),
                    }
                } else {
                    let chan = state.channel_mut(display).expect("resolved");
                    if chan.modes.limit.take().is_some() {
                        applied.push(AppliedMode { sign, letter, arg: None });
                    }
                }
            }
            'o' => {
                let target_nick = take_arg()
                    .ok_or_else(|| ProtocolError::NeedMoreParams("MODE".to_owned()))?;
                let target_id = state
                    .lookup_nick(&target_nick)
                    .filter(|t| state.channel(display).is_some_and(|c| c.is_member(*t)));
                let Some(target_id) = target_id else {
                    state.send_error(
                        id,
                        &ProtocolError::UserNotInChannel(target_nick, display.to_owned()),
                    );
                    continue;
                };
                let chan = state.channel_mut(display).expect("resolved");
                let changed = if sign == '+' {
                    chan.operators.insert(target_id)
                } else {
                    chan.operators.remove(&target_id)
                };
                if changed {
                    applied.push(AppliedMode { sign, letter, arg: Some(target_nick) });
                }
            }
            // Ban masks are consumed but not kept.
            'b' => {
                let _ = take_arg();
            }
            other => state.send_error(id, &ProtocolError::UnknownMode(other)),
        }
    }

    if applied.is_empty() {
        return Ok(());
    }

    let mut modes = String::new();
    let mut args: Vec<String> = Vec::new();
    let mut current_sign = '\0';
    for change in applied {
        if change.sign != current_sign {
            modes.push(change.sign);
            current_sign = change.sign;
        }
        modes.push(change.letter);
        if let Some(arg) = change.arg {
            args.push(arg);
        }
    }
    for arg in args {
        modes.push(' ');
        modes.push_str(&arg);
    }

    let prefix = state.user(id).expect("session exists").full_prefix();
    let line = state.render(&Reply::ModeChange {
        prefix: &prefix,
        target: display,
        modes: &modes,
    });
    state.broadcast_channel(display, &line, None);
    Ok(())
}
