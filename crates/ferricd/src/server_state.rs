use crate::casemap::casefold;
use crate::channels::Channel;
use crate::config::Config;
use crate::errors::{ProtocolError, SessionEnd};
use crate::message_models::{Outbound, OutboundTx};
use crate::replies::Reply;
use crate::users::{User, UserId, UserStatus};
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::error::TrySendError;

pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// The whole mutable world: user table, nick index, channel table. Owned
/// by the broker task; nothing else ever touches it, which is what makes
/// the membership updates atomic without a lock in sight. Both indices are
/// keyed by RFC 1459 casefolded strings.
pub struct ServerState {
    pub config: Config,
    /// Empty string means clients are not asked for PASS.
    pub password: String,
    /// Human-readable startup date, for RPL 003.
    pub started_at: String,
    users: HashMap<UserId, User>,
    nicks: HashMap<String, UserId>,
    channels: HashMap<String, Channel>,
    /// Sessions whose send-q overflowed while output was being queued.
    /// Processed by `flush_teardowns` once the current command finishes.
    pending_teardown: Vec<(UserId, SessionEnd)>,
}

impl ServerState {
    pub fn new(config: Config, password: String) -> Self {
        ServerState {
            config,
            password,
            started_at: chrono::Local::now().to_rfc2822(),
            users: HashMap::new(),
            nicks: HashMap::new(),
            channels: HashMap::new(),
            pending_teardown: Vec::new(),
        }
    }

    pub fn server_name(&self) -> &str {
        &self.config.server.name
    }

    pub fn render(&self, reply: &Reply<'_>) -> String {
        reply.format(self.server_name())
    }

    // --- users ---

    pub fn add_user(&mut self, id: UserId, host: String, tx: OutboundTx) {
        let pass_required = !self.password.is_empty();
        info!("[{id}] connected from {host}");
        self.users.insert(id, User::new(id, host, tx, pass_required));
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn user_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users.get_mut(&id)
    }

    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.users.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn lookup_nick(&self, nick: &str) -> Option<UserId> {
        self.nicks.get(&casefold(nick)).copied()
    }

    /// True when some other session already holds the nick.
    pub fn nick_taken(&self, nick: &str, requester: UserId) -> bool {
        self.lookup_nick(nick).is_some_and(|holder| holder != requester)
    }

    /// Points the nick index at `id`, releasing any previous binding of
    /// that session. Collision checks happen before this is called.
    pub fn bind_nick(&mut self, id: UserId, nick: &str) {
        if let Some(user) = self.users.get_mut(&id) {
            if let Some(old) = user.nick.take() {
                self.nicks.remove(&casefold(&old));
            }
            user.nick = Some(nick.to_owned());
            self.nicks.insert(casefold(nick), id);
        }
    }

    // --- channels ---

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(&casefold(name))
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut Channel> {
        self.channels.get_mut(&casefold(name))
    }

    /// Casefolded channel keys in sorted order, for LIST/NAMES sweeps.
    pub fn channel_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.channels.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Puts `id` into the channel, creating it if needed; the creator of a
    /// fresh channel comes out as its operator. Both sides of the
    /// membership relation are updated here and nowhere else.
    pub fn add_member(&mut self, id: UserId, name: &str) {
        let key = casefold(name);
        let chan = self
            .channels
            .entry(key.clone())
            .or_insert_with(|| {
                info!("channel {name} created");
                Channel::new(name.to_owned(), epoch_secs())
            });
        let first_joiner = chan.members.is_empty();
        chan.add_member(id, first_joiner);
        if let Some(user) = self.users.get_mut(&id) {
            user.member_of.insert(key);
        }
    }

    /// Removes `id` from the channel and destroys the channel on last
    /// leave; pending invites die with it.
    pub fn remove_member(&mut self, id: UserId, name: &str) {
        let key = casefold(name);
        if let Some(chan) = self.channels.get_mut(&key) {
            if chan.remove_member(id) {
                info!("channel {} destroyed", chan.name);
                self.channels.remove(&key);
            }
        }
        if let Some(user) = self.users.get_mut(&id) {
            user.member_of.remove(&key);
        }
    }

    /// Everyone sharing at least one channel with `id`, each exactly once,
    /// in id order. The set QUIT and NICK broadcasts walk.
    pub fn channel_peers(&self, id: UserId) -> BTreeSet<UserId> {
        let mut peers = BTreeSet::new();
        if let Some(user) = self.users.get(&id) {
            for key in &user.member_of {
                if let Some(chan) = self.channels.get(key) {
                    peers.extend(chan.members.iter().copied());
                }
            }
        }
        peers.remove(&id);
        peers
    }

    // --- output ---

    /// Queues one line for a session. A full queue means the client has
    /// stopped reading: the session is marked for teardown instead of
    /// the server ever waiting on it.
    pub fn send_line(&mut self, id: UserId, line: &str) {
        let Some(user) = self.users.get(&id) else {
            return;
        };
        if user.status == UserStatus::QuittingSoon {
            return;
        }
        match user.tx.try_send(Outbound::line(line)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("[{id}] send-q exceeded, scheduling teardown");
                self.pending_teardown.push((id, SessionEnd::SendQExceeded));
            }
            Err(TrySendError::Closed(_)) => {
                debug!("[{id}] writer already gone");
            }
        }
    }

    pub fn send_reply(&mut self, id: UserId, reply: &Reply<'_>) {
        let line = self.render(reply);
        self.send_line(id, &line);
    }

    pub fn send_error(&mut self, id: UserId, err: &ProtocolError) {
        let recipient = self
            .users
            .get(&id)
            .map(|u| u.nick_or_star().to_owned())
            .unwrap_or_else(|| "*".to_owned());
        let line = err.render(self.server_name(), &recipient);
        self.send_line(id, &line);
    }

    /// One line to every member, in member-set order. `skip` excludes the
    /// originator where the RFC wants peers only.
    pub fn broadcast_channel(&mut self, name: &str, line: &str, skip: Option<UserId>) {
        let Some(chan) = self.channels.get(&casefold(name)) else {
            return;
        };
        let members: Vec<UserId> = chan.members.iter().copied().collect();
        for member in members {
            if Some(member) != skip {
                self.send_line(member, line);
            }
        }
    }

    // --- teardown ---

    /// Ends a session: QUIT to every channel peer (once each), scrub from
    /// all channels and the nick index, then a closing ERROR and the
    /// flush-and-close sentinel for the writer. The record stays, marked
    /// `QuittingSoon`, until the socket actually closes.
    pub fn quit_user(&mut self, id: UserId, end: SessionEnd) {
        let Some(user) = self.users.get(&id) else {
            return;
        };
        if user.status == UserStatus::QuittingSoon {
            return;
        }
        let prefix = user.full_prefix();
        let host = user.host.clone();
        let was_registered = user.is_registered();
        let channel_keys: Vec<String> = user.member_of.iter().cloned().collect();
        let reason = end.reason().to_owned();
        info!("[{id}] session ends: {reason}");

        if was_registered {
            let quit_line = self.render(&Reply::Quit {
                prefix: &prefix,
                reason: &reason,
            });
            for peer in self.channel_peers(id) {
                self.send_line(peer, &quit_line);
            }
        }
        for key in channel_keys {
            self.remove_member(id, &key);
        }

        let server = self.server_name().to_owned();
        let user = self.users.get_mut(&id).expect("checked above");
        if let Some(nick) = &user.nick {
            let folded = casefold(nick);
            self.nicks.remove(&folded);
        }
        let user = self.users.get_mut(&id).expect("checked above");
        user.status = UserStatus::QuittingSoon;
        let closing = Reply::ErrorClosing {
            host: &host,
            reason: &reason,
        }
        .format(&server);
        let _ = user.tx.try_send(Outbound::line(closing));
        let _ = user.tx.try_send(Outbound::Shutdown);
    }

    /// Forgets a session whose socket is gone. An abrupt loss (no QUIT
    /// seen) still broadcasts to peers first.
    pub fn remove_user(&mut self, id: UserId) {
        if self.users.get(&id).is_some_and(|u| u.status != UserStatus::QuittingSoon) {
            self.quit_user(id, SessionEnd::ConnectionLost);
        }
        self.users.remove(&id);
        debug!("[{id}] record released");
    }

    /// Runs queued send-q teardowns until none remain; a teardown's own
    /// broadcasts may overflow further peers.
    pub fn flush_teardowns(&mut self) {
        loop {
            let batch = std::mem::take(&mut self.pending_teardown);
            if batch.is_empty() {
                return;
            }
            for (id, end) in batch {
                self.quit_user(id, end);
            }
        }
    }

    /// Structural invariants of the registry, checked after mutations in
    /// tests: no empty channels, ops within members, membership symmetry,
    /// nick index consistency.
    #[cfg(test)]
    pub fn assert_invariants(&self) {
        for (key, chan) in &self.channels {
            assert!(!chan.members.is_empty(), "channel {key} exists but is empty");
            assert!(
                chan.operators.is_subset(&chan.members),
                "ops not a subset of members in {key}"
            );
            for member in &chan.members {
                let user = self.users.get(member).expect("member points at a live user");
                assert!(
                    user.member_of.contains(key),
                    "membership asymmetry for user {member} in {key}"
                );
            }
        }
        for (id, user) in &self.users {
            if user.status == UserStatus::QuittingSoon {
                continue;
            }
            for key in &user.member_of {
                let chan = self.channels.get(key).expect("membership points at a live channel");
                assert!(chan.members.contains(id), "membership asymmetry for {id}");
            }
            if user.is_registered() {
                assert!(user.nick.is_some(), "registered user {id} lacks a nick");
                assert!(user.username.is_some(), "registered user {id} lacks a username");
            }
            if let Some(nick) = &user.nick {
                assert_eq!(self.nicks.get(&casefold(nick)), Some(id), "nick index stale");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_models::{OutboundRx, SENDQ_LINES, outbound_channel};
    use crate::users::next_user_id;

    fn state() -> ServerState {
        ServerState::new(Config::default(), String::new())
    }

    fn connect(state: &mut ServerState) -> (UserId, OutboundRx) {
        let (tx, rx) = outbound_channel();
        let id = next_user_id();
        state.add_user(id, "host".to_owned(), tx);
        (id, rx)
    }

    #[test]
    fn membership_stays_symmetric() {
        let mut state = state();
        let (a, _rx_a) = connect(&mut state);
        let (b, _rx_b) = connect(&mut state);
        state.add_member(a, "#Chat");
        state.add_member(b, "#chat");
        state.assert_invariants();

        let chan = state.channel("#CHAT").unwrap();
        assert_eq!(chan.members.len(), 2);
        assert!(chan.is_operator(a), "first joiner is operator");
        assert!(!chan.is_operator(b));

        state.remove_member(a, "#chat");
        state.assert_invariants();
        state.remove_member(b, "#chat");
        assert!(state.channel("#chat").is_none(), "empty channel destroyed");
        state.assert_invariants();
    }

    #[test]
    fn nick_binding_is_casefolded_and_exclusive() {
        let mut state = state();
        let (a, _rx_a) = connect(&mut state);
        let (b, _rx_b) = connect(&mut state);
        state.bind_nick(a, "Nick[1]");
        assert_eq!(state.lookup_nick("nick{1}"), Some(a));
        assert!(state.nick_taken("NICK[1]", b));
        assert!(!state.nick_taken("NICK[1]", a), "own nick never collides");

        state.bind_nick(a, "other");
        assert_eq!(state.lookup_nick("nick{1}"), None, "old binding released");
        state.assert_invariants();
    }

    #[test]
    fn channel_peers_are_deduplicated() {
        let mut state = state();
        let (a, _rx_a) = connect(&mut state);
        let (b, _rx_b) = connect(&mut state);
        state.add_member(a, "#a");
        state.add_member(b, "#a");
        state.add_member(a, "#b");
        state.add_member(b, "#b");
        let peers = state.channel_peers(a);
        assert_eq!(peers.into_iter().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn sendq_overflow_schedules_teardown() {
        let mut state = state();
        let (a, _rx_a) = connect(&mut state);
        // Never drained: the bounded queue fills, the session must go.
        for _ in 0..SENDQ_LINES + 1 {
            state.send_line(a, "NOTICE * :flood");
        }
        state.flush_teardowns();
        assert_eq!(
            state.user(a).unwrap().status,
            UserStatus::QuittingSoon,
            "overflowed session is quitting"
        );
        state.assert_invariants();
    }

    #[test]
    fn quit_scrubs_channels_and_nick() {
        let mut state = state();
        let (a, _rx_a) = connect(&mut state);
        let (b, _rx_b) = connect(&mut state);
        state.bind_nick(a, "alice");
        state.add_member(a, "#a");
        state.add_member(b, "#a");

        state.quit_user(a, SessionEnd::Quit(Some("bye".to_owned())));
        assert_eq!(state.lookup_nick("alice"), None);
        assert!(!state.channel("#a").unwrap().is_member(a));
        state.assert_invariants();

        state.remove_user(a);
        assert!(state.user(a).is_none());
    }
}
