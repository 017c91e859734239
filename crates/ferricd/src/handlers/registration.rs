use crate::errors::{ProtocolError, SessionEnd};
use crate::message::Message;
use crate::parsers::is_valid_nickname;
use crate::replies::Reply;
use crate::server_state::ServerState;
use crate::users::{UserId, UserStatus, USERNAME_MAX};
use log::{debug, info};

// RFC 1459, 4.1 Connection Registration
//
//    The recommended order for a client to register is as follows:
//
//            1. Pass message
//            2. Nick message
//            3. User message
//
// Registration completes once all three are in (PASS being implicit when
// no password is configured); at that point the welcome burst and MOTD go
// out and the session may use the full command set.

/// Tokens advertised in RPL 005 once a session registers.
pub const ISUPPORT_TOKENS: &str =
    "CHANTYPES=#& PREFIX=(o)@ CHANMODES=,k,l,itns NICKLEN=9 CHANNELLEN=50 CASEMAPPING=rfc1459";

/// User modes and channel modes listed in RPL 004.
const USER_MODES: &str = "iosw";
const CHAN_MODES: &str = "iklnost";

// 4.1.1 Password message
//
//       Command: PASS
//    Parameters: <password>
//
//    The password can and must be set before any attempt to register the
//    connection is made.
pub fn handle_pass(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let user = state.user(id).ok_or(ProtocolError::NotRegistered)?;
    if user.is_registered() {
        return Err(ProtocolError::AlreadyRegistered);
    }
    let supplied = msg.arg(0).unwrap_or_default();
    if !state.password.is_empty() && supplied != state.password {
        // Rendered as 464 and the connection is torn down after the flush.
        return Err(ProtocolError::PasswdMismatch);
    }
    let user = state.user_mut(id).expect("session exists");
    user.pass_accepted = true;
    if user.status == UserStatus::AwaitingPass {
        user.status = UserStatus::AwaitingNickUser;
    }
    Ok(())
}

// 4.1.2 Nick message
//
//       Command: NICK
//    Parameters: <nickname>
//
//    NICK message is used to give user a nickname or change the previous
//    one. A registered user's rename is shown to the user itself and to
//    every channel peer, each exactly once.
pub fn handle_nick(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let nick = msg.arg(0).unwrap_or_default().to_owned();
    if !is_valid_nickname(&nick) {
        return Err(ProtocolError::ErroneusNickname(nick));
    }
    if state.nick_taken(&nick, id) {
        return Err(ProtocolError::NicknameInUse(nick));
    }

    let user = state.user(id).ok_or(ProtocolError::NotRegistered)?;
    if user.nick.as_deref() == Some(nick.as_str()) {
        return Ok(());
    }
    if user.is_registered() {
        let old_prefix = user.full_prefix();
        let peers = state.channel_peers(id);
        state.bind_nick(id, &nick);
        let line = state.render(&Reply::NickChange {
            prefix: &old_prefix,
            new_nick: &nick,
        });
        state.send_line(id, &line);
        for peer in peers {
            state.send_line(peer, &line);
        }
        Ok(())
    } else {
        state.bind_nick(id, &nick);
        try_complete_registration(state, id)
    }
}

// 4.1.3 User message
//
//       Command: USER
//    Parameters: <username> <hostname> <servername> <realname>
//
//    The hostname and servername parameters are ignored for a directly
//    connected client; the realname is the trailing and may contain
//    spaces. USER from a registered session is refused.
pub fn handle_user(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let user = state.user(id).ok_or(ProtocolError::NotRegistered)?;
    if user.is_registered() {
        return Err(ProtocolError::AlreadyRegistered);
    }
    let mut username = msg.arg(0).unwrap_or_default().to_owned();
    if username.len() > USERNAME_MAX {
        let mut cut = USERNAME_MAX;
        while !username.is_char_boundary(cut) {
            cut -= 1;
        }
        username.truncate(cut);
    }
    let realname = msg.arg(3).unwrap_or_default().to_owned();

    let user = state.user_mut(id).expect("session exists");
    user.username = Some(username);
    user.realname = Some(realname);
    try_complete_registration(state, id)
}

/// NICK and USER both funnel here; once both halves of the identity are
/// present the password verdict is final and the welcome burst goes out.
fn try_complete_registration(state: &mut ServerState, id: UserId) -> Result<(), ProtocolError> {
    let user = state.user(id).ok_or(ProtocolError::NotRegistered)?;
    if user.is_registered() || user.nick.is_none() || user.username.is_none() {
        return Ok(());
    }
    if !user.pass_accepted {
        return Err(ProtocolError::PasswdMismatch);
    }
    state.user_mut(id).expect("session exists").status = UserStatus::Registered;
    send_welcome_burst(state, id);
    Ok(())
}

fn send_welcome_burst(state: &mut ServerState, id: UserId) {
    let user = state.user(id).expect("session exists");
    let nick = user.nick.clone().expect("registered implies nick");
    let username = user.username.clone().expect("registered implies username");
    let host = user.host.clone();
    let version = state.config.server.version.clone();
    let date = state.started_at.clone();
    info!("[{id}] registered as {nick}");

    state.send_reply(
        id,
        &Reply::Welcome {
            nick: &nick,
            user: &username,
            host: &host,
        },
    );
    state.send_reply(
        id,
        &Reply::YourHost {
            nick: &nick,
            version: &version,
        },
    );
    state.send_reply(
        id,
        &Reply::Created {
            nick: &nick,
            date: &date,
        },
    );
    state.send_reply(
        id,
        &Reply::MyInfo {
            nick: &nick,
            version: &version,
            user_modes: USER_MODES,
            chan_modes: CHAN_MODES,
        },
    );
    state.send_reply(
        id,
        &Reply::ISupport {
            nick: &nick,
            tokens: ISUPPORT_TOKENS,
        },
    );
    send_motd(state, id);
}

/// 375/372/376 burst, or 422 when no MOTD is configured. Shared between
/// registration and the MOTD command.
pub fn send_motd(state: &mut ServerState, id: UserId) {
    let Some(user) = state.user(id) else {
        return;
    };
    let nick = user.nick_or_star().to_owned();
    match state.config.server.motd.clone() {
        Some(motd) => {
            state.send_reply(id, &Reply::MotdStart { nick: &nick });
            for line in motd.lines() {
                state.send_reply(id, &Reply::Motd { nick: &nick, line });
            }
            state.send_reply(id, &Reply::EndOfMotd { nick: &nick });
        }
        None => state.send_reply(id, &Reply::NoMotd { nick: &nick }),
    }
}

// IRCv3 CAP negotiation, reduced to the no-op handshake: LS advertises an
// empty capability set and END is accepted silently, which is all a
// standard client needs to proceed with the RFC 1459 registration.
pub fn handle_cap(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    match msg.arg(0).unwrap_or_default().to_ascii_uppercase().as_str() {
        "LS" => {
            let nick = state
                .user(id)
                .map(|u| u.nick_or_star().to_owned())
                .unwrap_or_else(|| "*".to_owned());
            state.send_reply(id, &Reply::CapLs { nick: &nick });
            Ok(())
        }
        "END" => Ok(()),
        other => {
            debug!("[{id}] ignoring CAP {other}");
            Ok(())
        }
    }
}

// 4.1.6 Quit
//
//       Command: QUIT
//    Parameters: [<Quit message>]
pub fn handle_quit(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let reason = msg.arg(0).map(str::to_owned);
    state.quit_user(id, SessionEnd::Quit(reason));
    Ok(())
}
