use crate::errors::{ProtocolError, SessionEnd};
use crate::message::{Message, MessageError};
use crate::parsers::is_channel_target;
use crate::server_state::ServerState;
use crate::users::{UserId, UserStatus};
use log::debug;

use super::{channels, messages, miscellanneous, registration};

/// What the dispatcher checks before a handler ever runs: the argument
/// floor and whether the session must be registered.
struct CommandSpec {
    min_args: usize,
    needs_registration: bool,
}

fn command_spec(command: &str) -> Option<CommandSpec> {
    let spec = |min_args, needs_registration| {
        Some(CommandSpec {
            min_args,
            needs_registration,
        })
    };
    match command {
        // pre-registration surface
        "PASS" => spec(1, false),
        "NICK" => spec(1, false),
        "USER" => spec(4, false),
        "CAP" => spec(1, false),
        "QUIT" => spec(0, false),
        "PING" => spec(1, false),
        // everything else wants a completed handshake
        "PONG" => spec(0, true),
        "JOIN" => spec(1, true),
        "PART" => spec(1, true),
        "KICK" => spec(2, true),
        "INVITE" => spec(2, true),
        "TOPIC" => spec(1, true),
        "MODE" => spec(1, true),
        // PRIVMSG/NOTICE report their own 411/412 instead of 461
        "PRIVMSG" => spec(0, true),
        "NOTICE" => spec(0, true),
        "WHO" => spec(0, true),
        "WHOIS" => spec(1, true),
        "LIST" => spec(0, true),
        "NAMES" => spec(0, true),
        "MOTD" => spec(0, true),
        "INFO" => spec(0, true),
        "VERSION" => spec(0, true),
        _ => None,
    }
}

/// Entry point for one complete inbound line: parse, gate, dispatch,
/// render whatever error comes back, then run any teardowns the output
/// queues forced.
pub fn handle_line(state: &mut ServerState, id: UserId, line: &str) {
    let Some(user) = state.user(id) else {
        return;
    };
    if user.status == UserStatus::QuittingSoon {
        return;
    }
    debug!("[{id}] >> {line}");

    match line.parse::<Message>() {
        Ok(msg) => {
            if let Err(err) = dispatch(state, id, &msg) {
                let fatal = err.is_fatal();
                state.send_error(id, &err);
                if fatal {
                    state.quit_user(id, SessionEnd::PasswordRejected);
                }
            }
        }
        Err(MessageError::Empty) => {}
        Err(e) => {
            debug!("[{id}] unparseable line ({e}): {line:?}");
            let token = line.split_whitespace().next().unwrap_or("").to_owned();
            let err = if state.user(id).is_some_and(|u| u.is_registered()) {
                ProtocolError::UnknownCommand(token)
            } else {
                ProtocolError::NotRegistered
            };
            state.send_error(id, &err);
        }
    }
    state.flush_teardowns();
}

fn dispatch(state: &mut ServerState, id: UserId, msg: &Message) -> Result<(), ProtocolError> {
    let command = msg.command.as_str();
    let registered = state.user(id).is_some_and(|u| u.is_registered());

    let Some(spec) = command_spec(command) else {
        return Err(if registered {
            ProtocolError::UnknownCommand(command.to_owned())
        } else {
            ProtocolError::NotRegistered
        });
    };
    if spec.needs_registration && !registered {
        return Err(ProtocolError::NotRegistered);
    }
    if msg.arg_count() < spec.min_args {
        return Err(ProtocolError::NeedMoreParams(command.to_owned()));
    }

    match command {
        "PASS" => registration::handle_pass(state, id, msg),
        "NICK" => registration::handle_nick(state, id, msg),
        "USER" => registration::handle_user(state, id, msg),
        "CAP" => registration::handle_cap(state, id, msg),
        "QUIT" => registration::handle_quit(state, id, msg),
        "PING" => miscellanneous::handle_ping(state, id, msg),
        // Any inbound line already cleared the liveness probe.
        "PONG" => Ok(()),
        "JOIN" => channels::handle_join(state, id, msg),
        "PART" => channels::handle_part(state, id, msg),
        "KICK" => channels::handle_kick(state, id, msg),
        "INVITE" => channels::handle_invite(state, id, msg),
        "TOPIC" => channels::handle_topic(state, id, msg),
        "MODE" => {
            if msg.arg(0).is_some_and(is_channel_target) {
                channels::handle_channel_mode(state, id, msg)
            } else {
                miscellanneous::handle_user_mode(state, id, msg)
            }
        }
        "PRIVMSG" => messages::handle_privmsg(state, id, msg),
        "NOTICE" => messages::handle_notice(state, id, msg),
        "WHO" => miscellanneous::handle_who(state, id, msg),
        "WHOIS" => miscellanneous::handle_whois(state, id, msg),
        "LIST" => miscellanneous::handle_list(state, id, msg),
        "NAMES" => miscellanneous::handle_names(state, id, msg),
        "MOTD" => miscellanneous::handle_motd(state, id, msg),
        "INFO" => miscellanneous::handle_info(state, id, msg),
        "VERSION" => miscellanneous::handle_version(state, id, msg),
        other => Err(ProtocolError::UnknownCommand(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::message_models::{Outbound, OutboundRx, outbound_channel};
    use crate::users::next_user_id;

    fn server(password: &str) -> ServerState {
        ServerState::new(Config::default(), password.to_owned())
    }

    fn connect(state: &mut ServerState) -> (UserId, OutboundRx) {
        let (tx, rx) = outbound_channel();
        let id = next_user_id();
        state.add_user(id, "host".to_owned(), tx);
        (id, rx)
    }

    /// Everything queued for one session so far, terminators stripped;
    /// the flush-and-close sentinel shows up as `<closed>`.
    fn drain(rx: &mut OutboundRx) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(out) = rx.try_recv() {
            match out {
                Outbound::Line(line) => lines.push(line.trim_end().to_owned()),
                Outbound::Shutdown => lines.push("<closed>".to_owned()),
            }
        }
        lines
    }

    fn numerics(lines: &[String]) -> Vec<String> {
        lines
            .iter()
            .filter_map(|l| l.split_whitespace().nth(1))
            .map(str::to_owned)
            .collect()
    }

    fn register(state: &mut ServerState, id: UserId, rx: &mut OutboundRx, nick: &str) {
        handle_line(state, id, &format!("NICK {nick}"));
        handle_line(state, id, &format!("USER {nick} 0 * :{nick}"));
        let burst = drain(rx);
        assert!(
            burst.first().is_some_and(|l| l.contains(" 001 ")),
            "registration should produce a welcome burst, got {burst:?}"
        );
    }

    // Scenario: registration happy path.
    #[test]
    fn registration_happy_path() {
        let mut state = server("secret");
        let (alice, mut rx) = connect(&mut state);

        handle_line(&mut state, alice, "PASS secret");
        handle_line(&mut state, alice, "NICK alice");
        assert!(drain(&mut rx).is_empty(), "nothing before USER arrives");
        handle_line(&mut state, alice, "USER alice 0 * :Alice");

        let burst = drain(&mut rx);
        assert_eq!(
            numerics(&burst),
            vec!["001", "002", "003", "004", "005", "375", "372", "376"]
        );
        for line in &burst {
            assert_eq!(line.split_whitespace().nth(2), Some("alice"));
            assert!(line.starts_with(":ferric.local "));
        }
        assert!(burst[0].ends_with(":Welcome to the Internet Relay Network alice!alice@host"));
        state.assert_invariants();
    }

    // Scenario: nick collision during registration.
    #[test]
    fn nick_collision_blocks_second_registration() {
        let mut state = server("");
        let (bob1, mut rx1) = connect(&mut state);
        register(&mut state, bob1, &mut rx1, "bob");

        let (bob2, mut rx2) = connect(&mut state);
        handle_line(&mut state, bob2, "NICK bob");
        assert_eq!(
            drain(&mut rx2),
            vec![":ferric.local 433 * bob :Nickname is already in use"]
        );
        handle_line(&mut state, bob2, "USER bob 0 * :Bob");
        assert!(
            drain(&mut rx2).is_empty(),
            "registration must not complete without a nick"
        );

        // The collision is recoverable: a fresh nick finishes the handshake.
        handle_line(&mut state, bob2, "NICK robert");
        let burst = drain(&mut rx2);
        assert!(burst.first().is_some_and(|l| l.contains(" 001 robert ")));
        state.assert_invariants();
    }

    // Scenario: invite-only gate.
    #[test]
    fn invite_only_gate() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        register(&mut state, bob, &mut rx_bob, "bob");

        handle_line(&mut state, alice, "JOIN #dev");
        handle_line(&mut state, alice, "MODE #dev +i");
        drain(&mut rx_alice);

        handle_line(&mut state, bob, "JOIN #dev");
        assert_eq!(
            drain(&mut rx_bob),
            vec![":ferric.local 473 bob #dev :Cannot join channel (+i)"]
        );

        handle_line(&mut state, alice, "INVITE bob #dev");
        assert_eq!(drain(&mut rx_bob), vec![":alice!alice@host INVITE bob :#dev"]);
        assert_eq!(drain(&mut rx_alice), vec![":ferric.local 341 alice bob #dev"]);

        handle_line(&mut state, bob, "JOIN #dev");
        let joined = drain(&mut rx_bob);
        assert!(joined.contains(&":bob!bob@host JOIN #dev".to_owned()));
        assert!(drain(&mut rx_alice).contains(&":bob!bob@host JOIN #dev".to_owned()));

        // The invitation was single-use.
        handle_line(&mut state, bob, "PART #dev");
        drain(&mut rx_bob);
        handle_line(&mut state, bob, "JOIN #dev");
        assert_eq!(
            drain(&mut rx_bob),
            vec![":ferric.local 473 bob #dev :Cannot join channel (+i)"]
        );
        state.assert_invariants();
    }

    // Scenario: channel message fan-out.
    #[test]
    fn privmsg_fans_out_to_peers_only() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        let (carol, mut rx_carol) = connect(&mut state);
        for (id, rx, nick) in [
            (alice, &mut rx_alice, "alice"),
            (bob, &mut rx_bob, "bob"),
            (carol, &mut rx_carol, "carol"),
        ] {
            register(&mut state, id, rx, nick);
            handle_line(&mut state, id, "JOIN #chat");
        }
        drain(&mut rx_alice);
        drain(&mut rx_bob);
        drain(&mut rx_carol);

        handle_line(&mut state, alice, "PRIVMSG #chat :hi");
        let expected = ":alice!alice@host PRIVMSG #chat :hi".to_owned();
        assert_eq!(drain(&mut rx_bob), vec![expected.clone()]);
        assert_eq!(drain(&mut rx_carol), vec![expected]);
        assert!(drain(&mut rx_alice).is_empty(), "no echo to the sender");
    }

    // Scenario: KICK without operator rights.
    #[test]
    fn kick_without_ops_is_refused() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        let (carol, mut rx_carol) = connect(&mut state);
        for (id, rx, nick) in [
            (alice, &mut rx_alice, "alice"),
            (bob, &mut rx_bob, "bob"),
            (carol, &mut rx_carol, "carol"),
        ] {
            register(&mut state, id, rx, nick);
            handle_line(&mut state, id, "JOIN #chat");
        }
        drain(&mut rx_bob);

        handle_line(&mut state, bob, "KICK #chat carol :go");
        assert_eq!(
            drain(&mut rx_bob),
            vec![":ferric.local 482 bob #chat :You're not channel operator"]
        );
        assert!(state.channel("#chat").unwrap().is_member(carol));

        // The operator's kick goes through and is seen by everyone.
        handle_line(&mut state, alice, "KICK #chat carol :go");
        drain(&mut rx_alice);
        drain(&mut rx_carol);
        assert!(!state.channel("#chat").unwrap().is_member(carol));
        state.assert_invariants();
    }

    // Scenario: QUIT fan-out deduplication.
    #[test]
    fn quit_broadcast_reaches_each_peer_once() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        register(&mut state, bob, &mut rx_bob, "bob");
        for chan in ["#a", "#b"] {
            handle_line(&mut state, alice, &format!("JOIN {chan}"));
            handle_line(&mut state, bob, &format!("JOIN {chan}"));
        }
        drain(&mut rx_alice);
        drain(&mut rx_bob);

        handle_line(&mut state, alice, "QUIT :bye");
        let bob_sees: Vec<String> = drain(&mut rx_bob);
        assert_eq!(bob_sees, vec![":alice!alice@host QUIT :bye"]);

        let alice_sees = drain(&mut rx_alice);
        assert!(alice_sees.iter().any(|l| l.starts_with("ERROR :Closing Link: host (bye)")));
        assert_eq!(alice_sees.last().map(String::as_str), Some("<closed>"));
        assert!(!state.channel("#a").unwrap().is_member(alice));
        state.assert_invariants();
    }

    #[test]
    fn commands_require_registration() {
        let mut state = server("");
        let (id, mut rx) = connect(&mut state);
        handle_line(&mut state, id, "JOIN #chat");
        assert_eq!(
            drain(&mut rx),
            vec![":ferric.local 451 * :You have not registered"]
        );
    }

    #[test]
    fn arity_shortfall_is_461_and_unknown_is_421() {
        let mut state = server("");
        let (id, mut rx) = connect(&mut state);
        handle_line(&mut state, id, "NICK");
        assert_eq!(
            drain(&mut rx),
            vec![":ferric.local 461 * NICK :Not enough parameters"]
        );
        register(&mut state, id, &mut rx, "dora");
        handle_line(&mut state, id, "EXPLORE the map");
        assert_eq!(
            drain(&mut rx),
            vec![":ferric.local 421 dora EXPLORE :Unknown command"]
        );
    }

    #[test]
    fn overlong_nickname_is_erroneus() {
        let mut state = server("");
        let (id, mut rx) = connect(&mut state);
        handle_line(&mut state, id, "NICK ninechars9");
        assert_eq!(
            drain(&mut rx),
            vec![":ferric.local 432 * ninechars9 :Erroneus nickname"]
        );
        handle_line(&mut state, id, "NICK ninechars");
        assert!(drain(&mut rx).is_empty(), "nine characters bind quietly");
        assert_eq!(state.lookup_nick("ninechars"), Some(id));
    }

    #[test]
    fn wrong_password_is_fatal() {
        let mut state = server("secret");
        let (id, mut rx) = connect(&mut state);
        handle_line(&mut state, id, "PASS wrong");
        let lines = drain(&mut rx);
        assert_eq!(lines[0], ":ferric.local 464 * :Password incorrect");
        assert_eq!(lines.last().map(String::as_str), Some("<closed>"));
    }

    #[test]
    fn registering_around_the_password_is_fatal_too() {
        let mut state = server("secret");
        let (id, mut rx) = connect(&mut state);
        handle_line(&mut state, id, "NICK sneaky");
        handle_line(&mut state, id, "USER sneaky 0 * :Sneaky");
        let lines = drain(&mut rx);
        assert_eq!(lines[0], ":ferric.local 464 sneaky :Password incorrect");
        assert_eq!(lines.last().map(String::as_str), Some("<closed>"));
    }

    #[test]
    fn join_is_idempotent() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        register(&mut state, bob, &mut rx_bob, "bob");
        handle_line(&mut state, alice, "JOIN #chat");
        handle_line(&mut state, bob, "JOIN #chat");
        drain(&mut rx_alice);
        drain(&mut rx_bob);

        handle_line(&mut state, alice, "JOIN #chat");
        assert!(drain(&mut rx_alice).is_empty(), "rejoin produces nothing");
        assert!(drain(&mut rx_bob).is_empty(), "and nothing for peers");
    }

    #[test]
    fn user_limit_gates_the_next_joiner() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        let (carol, mut rx_carol) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        register(&mut state, bob, &mut rx_bob, "bob");
        register(&mut state, carol, &mut rx_carol, "carol");

        handle_line(&mut state, alice, "JOIN #room");
        handle_line(&mut state, alice, "MODE #room +l 2");
        handle_line(&mut state, bob, "JOIN #room");
        drain(&mut rx_bob);
        handle_line(&mut state, carol, "JOIN #room");
        assert_eq!(
            drain(&mut rx_carol),
            vec![":ferric.local 471 carol #room :Cannot join channel (+l)"]
        );
    }

    #[test]
    fn keyed_channel_needs_the_key() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        register(&mut state, bob, &mut rx_bob, "bob");
        handle_line(&mut state, alice, "JOIN #vault");
        handle_line(&mut state, alice, "MODE #vault +k hunter2");
        drain(&mut rx_alice);

        handle_line(&mut state, bob, "JOIN #vault");
        assert_eq!(
            drain(&mut rx_bob),
            vec![":ferric.local 475 bob #vault :Cannot join channel (+k)"]
        );

        // A malformed replacement key is discarded and the old one stands.
        handle_line(&mut state, alice, &format!("MODE #vault +k {}", "k".repeat(24)));
        assert!(drain(&mut rx_alice).is_empty(), "overlong key applies nothing");

        handle_line(&mut state, bob, "JOIN #vault hunter2");
        assert!(drain(&mut rx_bob).iter().any(|l| l.ends_with("JOIN #vault")));
    }

    #[test]
    fn mode_changes_are_broadcast_normalized() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        register(&mut state, bob, &mut rx_bob, "bob");
        handle_line(&mut state, alice, "JOIN #m");
        handle_line(&mut state, bob, "JOIN #m");
        drain(&mut rx_alice);
        drain(&mut rx_bob);

        handle_line(&mut state, alice, "MODE #m +ik sesame");
        let expected = ":alice!alice@host MODE #m +ik sesame".to_owned();
        assert_eq!(drain(&mut rx_alice), vec![expected.clone()]);
        assert_eq!(drain(&mut rx_bob), vec![expected]);

        // Re-applying +i changes nothing, so nothing is broadcast.
        handle_line(&mut state, alice, "MODE #m +i");
        assert!(drain(&mut rx_alice).is_empty());

        handle_line(&mut state, alice, "MODE #m");
        let query = drain(&mut rx_alice);
        assert_eq!(numerics(&query), vec!["324", "329"]);
        assert!(query[0].contains("#m +ikn sesame"));
    }

    #[test]
    fn mode_o_promotes_and_demotes() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        register(&mut state, bob, &mut rx_bob, "bob");
        handle_line(&mut state, alice, "JOIN #m");
        handle_line(&mut state, bob, "JOIN #m");
        drain(&mut rx_alice);
        drain(&mut rx_bob);

        handle_line(&mut state, alice, "MODE #m +o bob");
        assert_eq!(
            drain(&mut rx_bob),
            vec![":alice!alice@host MODE #m +o bob"]
        );
        assert!(state.channel("#m").unwrap().is_operator(bob));
        drain(&mut rx_alice);

        handle_line(&mut state, alice, "MODE #m -o nobody");
        assert_eq!(
            drain(&mut rx_alice),
            vec![":ferric.local 441 alice nobody #m :They aren't on that channel"]
        );
        state.assert_invariants();
    }

    #[test]
    fn topic_set_honours_lock_and_updates_setter() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        register(&mut state, bob, &mut rx_bob, "bob");
        handle_line(&mut state, alice, "JOIN #t");
        handle_line(&mut state, bob, "JOIN #t");
        drain(&mut rx_alice);
        drain(&mut rx_bob);

        handle_line(&mut state, bob, "TOPIC #t :hello world");
        assert_eq!(
            drain(&mut rx_alice),
            vec![":bob!bob@host TOPIC #t :hello world"]
        );
        assert_eq!(
            state.channel("#t").unwrap().topic_set_by.as_deref(),
            Some("bob")
        );

        handle_line(&mut state, alice, "MODE #t +t");
        drain(&mut rx_alice);
        drain(&mut rx_bob);
        handle_line(&mut state, bob, "TOPIC #t :mine now");
        assert_eq!(
            drain(&mut rx_bob),
            vec![":ferric.local 482 bob #t :You're not channel operator"]
        );

        // Re-setting the same text still broadcasts and re-stamps.
        handle_line(&mut state, alice, "TOPIC #t :hello world");
        assert_eq!(
            drain(&mut rx_bob),
            vec![":alice!alice@host TOPIC #t :hello world"]
        );
        assert_eq!(
            state.channel("#t").unwrap().topic_set_by.as_deref(),
            Some("alice")
        );

        handle_line(&mut state, bob, "TOPIC #t");
        let query = drain(&mut rx_bob);
        assert_eq!(numerics(&query), vec!["332", "333"]);
        assert!(query[0].ends_with("#t :hello world"));
    }

    #[test]
    fn nick_change_reaches_each_peer_once() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        register(&mut state, bob, &mut rx_bob, "bob");
        for chan in ["#a", "#b"] {
            handle_line(&mut state, alice, &format!("JOIN {chan}"));
            handle_line(&mut state, bob, &format!("JOIN {chan}"));
        }
        drain(&mut rx_alice);
        drain(&mut rx_bob);

        handle_line(&mut state, alice, "NICK alicia");
        let rename = ":alice!alice@host NICK :alicia".to_owned();
        assert_eq!(drain(&mut rx_alice), vec![rename.clone()]);
        assert_eq!(drain(&mut rx_bob), vec![rename]);
        assert_eq!(state.lookup_nick("alicia"), Some(alice));
        assert_eq!(state.lookup_nick("alice"), None);
        state.assert_invariants();
    }

    #[test]
    fn privmsg_error_surface() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");

        handle_line(&mut state, alice, "PRIVMSG nobody :hi");
        assert_eq!(
            drain(&mut rx_alice),
            vec![":ferric.local 401 alice nobody :No such nick/channel"]
        );
        handle_line(&mut state, alice, "PRIVMSG #nowhere :hi");
        assert_eq!(
            drain(&mut rx_alice),
            vec![":ferric.local 403 alice #nowhere :No such channel"]
        );
        handle_line(&mut state, alice, "PRIVMSG :just text");
        assert_eq!(
            drain(&mut rx_alice),
            vec![":ferric.local 411 alice :No recipient given (PRIVMSG)"]
        );
        handle_line(&mut state, alice, "PRIVMSG alice");
        assert_eq!(
            drain(&mut rx_alice),
            vec![":ferric.local 412 alice :No text to send"]
        );

        // NOTICE swallows every one of those.
        for line in [
            "NOTICE nobody :hi",
            "NOTICE #nowhere :hi",
            "NOTICE :just text",
            "NOTICE alice",
        ] {
            handle_line(&mut state, alice, line);
        }
        assert!(drain(&mut rx_alice).is_empty());
    }

    #[test]
    fn ping_gets_a_server_prefixed_pong() {
        let mut state = server("");
        let (id, mut rx) = connect(&mut state);
        register(&mut state, id, &mut rx, "pinger");
        handle_line(&mut state, id, "PING 12345");
        assert_eq!(
            drain(&mut rx),
            vec![":ferric.local PONG ferric.local :12345"]
        );
    }

    #[test]
    fn cap_ls_is_an_empty_noop_handshake() {
        let mut state = server("");
        let (id, mut rx) = connect(&mut state);
        handle_line(&mut state, id, "CAP LS 302");
        assert_eq!(drain(&mut rx), vec![":ferric.local CAP * LS :"]);
        handle_line(&mut state, id, "CAP END");
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn user_mode_is_self_service_only() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        register(&mut state, bob, &mut rx_bob, "bob");

        handle_line(&mut state, alice, "MODE bob +i");
        assert_eq!(
            drain(&mut rx_alice),
            vec![":ferric.local 502 alice :Cant change mode for other users"]
        );

        handle_line(&mut state, alice, "MODE alice +iwo");
        let lines = drain(&mut rx_alice);
        assert_eq!(lines, vec![":ferric.local 221 alice :+iw"], "+o self-grant dropped");

        handle_line(&mut state, alice, "MODE alice +q");
        assert_eq!(
            drain(&mut rx_alice),
            vec![":ferric.local 501 alice :Unknown MODE flag"]
        );
    }

    #[test]
    fn part_and_empty_channel_destruction() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        handle_line(&mut state, alice, "JOIN #solo");
        drain(&mut rx_alice);

        handle_line(&mut state, alice, "PART #solo :done");
        assert_eq!(drain(&mut rx_alice), vec![":alice!alice@host PART #solo :done"]);
        assert!(state.channel("#solo").is_none(), "last leave destroys the channel");

        handle_line(&mut state, alice, "PART #solo");
        assert_eq!(
            drain(&mut rx_alice),
            vec![":ferric.local 403 alice #solo :No such channel"]
        );
        state.assert_invariants();
    }

    #[test]
    fn join_zero_parts_everything() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        handle_line(&mut state, alice, "JOIN #a,#b");
        drain(&mut rx_alice);

        handle_line(&mut state, alice, "JOIN 0");
        let parts = drain(&mut rx_alice);
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|l| l.starts_with(":alice!alice@host PART #")));
        assert!(state.user(alice).unwrap().member_of.is_empty());
        state.assert_invariants();
    }

    #[test]
    fn bad_channel_names_are_rejected() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        handle_line(&mut state, alice, "JOIN badname");
        assert_eq!(
            drain(&mut rx_alice),
            vec![":ferric.local 476 alice badname :Bad Channel Mask"]
        );
    }

    #[test]
    fn ban_mode_answers_the_empty_list() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        handle_line(&mut state, alice, "JOIN #b");
        drain(&mut rx_alice);
        handle_line(&mut state, alice, "MODE #b +b");
        assert_eq!(
            drain(&mut rx_alice),
            vec![":ferric.local 368 alice #b :End of channel ban list"]
        );
    }

    #[test]
    fn whois_and_list_smoke() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        register(&mut state, bob, &mut rx_bob, "bob");
        handle_line(&mut state, bob, "JOIN #chat");
        drain(&mut rx_bob);

        handle_line(&mut state, alice, "WHOIS bob");
        let whois = drain(&mut rx_alice);
        assert_eq!(numerics(&whois), vec!["311", "319", "312", "318"]);
        assert!(whois[1].ends_with(":@#chat"));

        handle_line(&mut state, alice, "LIST");
        let list = drain(&mut rx_alice);
        assert_eq!(numerics(&list), vec!["321", "322", "323"]);
        assert!(list[1].contains("#chat 1"));

        handle_line(&mut state, alice, "WHOIS ghost");
        assert_eq!(
            drain(&mut rx_alice),
            vec![":ferric.local 401 alice ghost :No such nick/channel"]
        );
    }

    #[test]
    fn secret_channels_hide_from_outsiders() {
        let mut state = server("");
        let (alice, mut rx_alice) = connect(&mut state);
        let (bob, mut rx_bob) = connect(&mut state);
        register(&mut state, alice, &mut rx_alice, "alice");
        register(&mut state, bob, &mut rx_bob, "bob");
        handle_line(&mut state, alice, "JOIN #hidden");
        handle_line(&mut state, alice, "MODE #hidden +s");
        drain(&mut rx_alice);

        handle_line(&mut state, bob, "LIST");
        let list = drain(&mut rx_bob);
        assert_eq!(numerics(&list), vec!["321", "323"], "no 322 for the secret room");

        handle_line(&mut state, bob, "NAMES #hidden");
        let names = drain(&mut rx_bob);
        assert_eq!(numerics(&names), vec!["366"], "names list withheld");
    }
}
