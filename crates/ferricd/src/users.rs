use crate::message_models::OutboundTx;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

pub type UserId = usize;

/// Usernames longer than this are stored truncated.
pub const USERNAME_MAX: usize = 10;

static NEXT_USER_ID: AtomicUsize = AtomicUsize::new(1);

/// Ids are allocated by the accepting side before the broker sees the
/// connection, so the counter is global rather than registry state.
pub fn next_user_id() -> UserId {
    NEXT_USER_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStatus {
    /// Connected; the configured password has not been presented yet.
    AwaitingPass,
    /// Password cleared (or none configured); waiting for NICK and USER.
    AwaitingNickUser,
    /// Handshake complete, welcome burst sent. Fully active.
    Registered,
    /// Teardown decided; the record stays only until the socket closes.
    QuittingSoon,
}

/// One connected session. Owned by the registry; only the broker task
/// touches it, so the fields are plain data.
#[derive(Debug)]
pub struct User {
    pub id: UserId,
    pub host: String,
    pub status: UserStatus,
    pub nick: Option<String>,
    pub username: Option<String>,
    pub realname: Option<String>,
    pub pass_accepted: bool,
    /// User modes out of {i, s, w, o}; ordered so 221 renders stably.
    pub modes: BTreeSet<char>,
    /// Casefolded keys of joined channels; mirror of each channel's
    /// member set.
    pub member_of: BTreeSet<String>,
    pub tx: OutboundTx,
    pub last_activity: Instant,
    /// Cookie of an outstanding liveness probe, if one was sent.
    pub ping_probe: Option<String>,
}

impl User {
    pub fn new(id: UserId, host: String, tx: OutboundTx, pass_required: bool) -> Self {
        User {
            id,
            host,
            status: if pass_required {
                UserStatus::AwaitingPass
            } else {
                UserStatus::AwaitingNickUser
            },
            nick: None,
            username: None,
            realname: None,
            pass_accepted: !pass_required,
            modes: BTreeSet::new(),
            member_of: BTreeSet::new(),
            tx,
            last_activity: Instant::now(),
            ping_probe: None,
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self.status, UserStatus::Registered)
    }

    /// Reply recipient: the nick once set, `*` during the handshake.
    pub fn nick_or_star(&self) -> &str {
        self.nick.as_deref().unwrap_or("*")
    }

    /// `nick!user@host`, the originator prefix peers see on relays.
    pub fn full_prefix(&self) -> String {
        format!(
            "{}!{}@{}",
            self.nick_or_star(),
            self.username.as_deref().unwrap_or("unknown"),
            self.host
        )
    }

    /// Effective user mode string, `+` followed by the set flags.
    pub fn mode_string(&self) -> String {
        let mut out = String::from("+");
        out.extend(self.modes.iter());
        out
    }
}
