use crate::casemap::casefold_eq;
use crate::errors::ProtocolError;
use crate::message::Message;
use crate::replies::Reply;
use crate::server_state::ServerState;
use crate::users::UserId;

use super::registration::send_motd;

// RFC 1459, 4.6 Miscellaneous messages and 4.5 User based queries: the
// PING/PONG pair, the query commands and the user form of MODE.

// 4.6.2 Ping message
//
//       Command: PING
//    Parameters: <server1> [<server2>]
//
//    When a PING message is received, the appropriate PONG message must
//    be sent as reply as soon as possible. Server forwarding is out of
//    scope here; the token is echoed back server-prefixed.
pub fn handle_ping(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let token = msg.arg(0).unwrap_or_default().to_owned();
    state.send_reply(id, &Reply::Pong { token: &token });
    Ok(())
}

// 4.2.3 Mode message (user form)
//
//       Command: MODE
//    Parameters: <nickname> {[+|-]|i|w|s|o}
//
//    A user may only inspect and change their own modes. '+o' cannot be
//    self-granted and is dropped silently; '-o' always works. The
//    effective mode string is reported back as 221 either way. An unknown
//    flag rejects the whole command, nothing half-applies.
pub fn handle_user_mode(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let target = msg.arg(0).unwrap_or_default();
    let me = state.user(id).ok_or(ProtocolError::NotRegistered)?;
    if !casefold_eq(target, me.nick_or_star()) {
        return Err(ProtocolError::UsersDontMatch);
    }

    if let Some(modestring) = msg.arg(1) {
        let mut sign = '+';
        let mut changes: Vec<(char, char)> = Vec::new();
        for flag in modestring.chars() {
            match flag {
                '+' | '-' => sign = flag,
                'i' | 's' | 'w' => changes.push((sign, flag)),
                'o' if sign == '-' => changes.push(('-', 'o')),
                'o' => {} // +o is a server grant, never self-service
                _ => return Err(ProtocolError::UModeUnknownFlag),
            }
        }
        let user = state.user_mut(id).expect("session exists");
        for (sign, flag) in changes {
            if sign == '+' {
                user.modes.insert(flag);
            } else {
                user.modes.remove(&flag);
            }
        }
    }

    let user = state.user(id).expect("session exists");
    let nick = user.nick_or_star().to_owned();
    let modes = user.mode_string();
    state.send_reply(
        id,
        &Reply::UModeIs {
            nick: &nick,
            modes: &modes,
        },
    );
    Ok(())
}

/// 353/366 for one channel; the same burst serves JOIN and NAMES. Secret
/// channels only show their names list to members, but the terminating
/// 366 always comes.
pub fn send_names_reply(state: &mut ServerState, id: UserId, name: &str) {
    let nick = state
        .user(id)
        .map(|u| u.nick_or_star().to_owned())
        .unwrap_or_else(|| "*".to_owned());

    let mut display = name.to_owned();
    let mut names = String::new();
    let mut visible = false;
    if let Some(chan) = state.channel(name) {
        display = chan.name.clone();
        visible = !chan.modes.secret || chan.is_member(id);
        for member in &chan.members {
            let Some(user) = state.user(*member) else {
                continue;
            };
            if !names.is_empty() {
                names.push(' ');
            }
            if chan.is_operator(*member) {
                names.push('@');
            }
            names.push_str(user.nick_or_star());
        }
    }

    if visible && !names.is_empty() {
        state.send_reply(
            id,
            &Reply::NamReply {
                nick: &nick,
                channel: &display,
                names: &names,
            },
        );
    }
    state.send_reply(
        id,
        &Reply::EndOfNames {
            nick: &nick,
            channel: &display,
        },
    );
}

// 4.5.5 Names message
//
//       Command: NAMES
//    Parameters: [<channel>{,<channel>}]
//
//    Without arguments, every visible channel is listed.
pub fn handle_names(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    match msg.arg(0) {
        Some(list) => {
            for name in list.split(',') {
                if !name.is_empty() {
                    send_names_reply(state, id, name);
                }
            }
        }
        None => {
            for key in state.channel_keys() {
                // The sweep must not even name secret channels.
                let visible = state
                    .channel(&key)
                    .is_some_and(|c| !c.modes.secret || c.is_member(id));
                if visible {
                    send_names_reply(state, id, &key);
                }
            }
        }
    }
    Ok(())
}

// 4.2.6 List message
//
//       Command: LIST
//    Parameters: [<channel>{,<channel>}]
//
//    Secret channels are omitted unless the requester is on them.
pub fn handle_list(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let nick = state
        .user(id)
        .map(|u| u.nick_or_star().to_owned())
        .unwrap_or_else(|| "*".to_owned());
    state.send_reply(id, &Reply::ListStart { nick: &nick });

    let keys: Vec<String> = match msg.arg(0) {
        Some(list) => list.split(',').map(str::to_owned).collect(),
        None => state.channel_keys(),
    };
    for key in keys {
        let Some(chan) = state.channel(&key) else {
            continue;
        };
        if chan.modes.secret && !chan.is_member(id) {
            continue;
        }
        let display = chan.name.clone();
        let visible = chan.members.len();
        let topic = chan.topic.clone().unwrap_or_default();
        state.send_reply(
            id,
            &Reply::ListItem {
                nick: &nick,
                channel: &display,
                visible,
                topic: &topic,
            },
        );
    }
    state.send_reply(id, &Reply::ListEnd { nick: &nick });
    Ok(())
}

// 4.5.1 Who query
//
//       Command: WHO
//    Parameters: [<name>]
//
//    A channel name lists its members; a nickname lists that user; no
//    argument sweeps every connected user. Flags are H (here) plus @ for
//    channel operators.
pub fn handle_who(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let nick = state
        .user(id)
        .map(|u| u.nick_or_star().to_owned())
        .unwrap_or_else(|| "*".to_owned());
    let mask = msg.arg(0).unwrap_or("*").to_owned();

    let mut rows: Vec<(String, UserId, String)> = Vec::new();
    if crate::parsers::is_channel_target(&mask) {
        if let Some(chan) = state.channel(&mask) {
            if !chan.modes.secret || chan.is_member(id) {
                for member in &chan.members {
                    let flags = if chan.is_operator(*member) { "H@" } else { "H" };
                    rows.push((chan.name.clone(), *member, flags.to_owned()));
                }
            }
        }
    } else if mask == "*" {
        for target in state.user_ids() {
            if state.user(target).is_some_and(|u| u.is_registered()) {
                rows.push(("*".to_owned(), target, "H".to_owned()));
            }
        }
    } else if let Some(target) = state.lookup_nick(&mask) {
        rows.push(("*".to_owned(), target, "H".to_owned()));
    }

    for (channel, target, flags) in rows {
        let Some(user) = state.user(target) else {
            continue;
        };
        let username = user.username.clone().unwrap_or_default();
        let host = user.host.clone();
        let target_nick = user.nick_or_star().to_owned();
        let realname = user.realname.clone().unwrap_or_default();
        state.send_reply(
            id,
            &Reply::WhoReply {
                nick: &nick,
                channel: &channel,
                user: &username,
                host: &host,
                target: &target_nick,
                flags: &flags,
                realname: &realname,
            },
        );
    }
    state.send_reply(
        id,
        &Reply::EndOfWho {
            nick: &nick,
            mask: &mask,
        },
    );
    Ok(())
}

// 4.5.2 Whois query
//
//       Command: WHOIS
//    Parameters: <nickmask>
pub fn handle_whois(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let mask = msg.arg(0).unwrap_or_default();
    // Mask lists are accepted but only the first target is answered.
    let target_nick = mask.split(',').next().unwrap_or_default().to_owned();
    let target_id = state
        .lookup_nick(&target_nick)
        .ok_or_else(|| ProtocolError::NoSuchNick(target_nick.clone()))?;

    let nick = state
        .user(id)
        .map(|u| u.nick_or_star().to_owned())
        .unwrap_or_else(|| "*".to_owned());
    let target = state.user(target_id).ok_or_else(|| ProtocolError::NoSuchNick(target_nick.clone()))?;
    let target_display = target.nick_or_star().to_owned();
    let username = target.username.clone().unwrap_or_default();
    let host = target.host.clone();
    let realname = target.realname.clone().unwrap_or_default();
    let memberships: Vec<String> = target.member_of.iter().cloned().collect();

    state.send_reply(
        id,
        &Reply::WhoisUser {
            nick: &nick,
            target: &target_display,
            user: &username,
            host: &host,
            realname: &realname,
        },
    );

    let mut channels = String::new();
    for key in memberships {
        let Some(chan) = state.channel(&key) else {
            continue;
        };
        if chan.modes.secret && !chan.is_member(id) {
            continue;
        }
        if !channels.is_empty() {
            channels.push(' ');
        }
        if chan.is_operator(target_id) {
            channels.push('@');
        }
        channels.push_str(&chan.name);
    }
    if !channels.is_empty() {
        state.send_reply(
            id,
            &Reply::WhoisChannels {
                nick: &nick,
                target: &target_display,
                channels: &channels,
            },
        );
    }

    let info = state.config.server.version.clone();
    state.send_reply(
        id,
        &Reply::WhoisServer {
            nick: &nick,
            target: &target_display,
            info: &info,
        },
    );
    state.send_reply(
        id,
        &Reply::EndOfWhois {
            nick: &nick,
            target: &target_display,
        },
    );
    Ok(())
}

// 4.3.1 Motd, 4.3.7 Info, 4.3.2 Version
pub fn handle_motd(state: &mut ServerState, id: UserId, _msg: &Message) -> Result<(), ProtocolError> {
    send_motd(state, id);
    Ok(())
}

pub fn handle_info(state: &mut ServerState, id: UserId, _msg: &Message) -> Result<(), ProtocolError> {
    let nick = state
        .user(id)
        .map(|u| u.nick_or_star().to_owned())
        .unwrap_or_else(|| "*".to_owned());
    for line in state.config.server.info.clone() {
        state.send_reply(
            id,
            &Reply::Info {
                nick: &nick,
                line: &line,
            },
        );
    }
    state.send_reply(id, &Reply::EndOfInfo { nick: &nick });
    Ok(())
}

pub fn handle_version(state: &mut ServerState, id: UserId, _msg: &Message) -> Result<(), ProtocolError> {
    let nick = state
        .user(id)
        .map(|u| u.nick_or_star().to_owned())
        .unwrap_or_else(|| "*".to_owned());
    let version = state.config.server.version.clone();
    state.send_reply(
        id,
        &Reply::Version {
            nick: &nick,
            version: &version,
        },
    );
    Ok(())
}
