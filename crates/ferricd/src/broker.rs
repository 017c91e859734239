use crate::errors::SessionEnd;
use crate::handlers::request;
use crate::message_models::OutboundTx;
use crate::replies::Reply;
use crate::server_state::ServerState;
use crate::users::{UserId, UserStatus};
use log::info;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

/// Everything that can happen to the server, serialized into one queue.
/// Connection tasks produce these; only the broker consumes them.
#[derive(Debug)]
pub enum Event {
    Connected {
        id: UserId,
        host: String,
        tx: OutboundTx,
    },
    Line {
        id: UserId,
        line: String,
    },
    RecvOverflow {
        id: UserId,
    },
    Disconnected {
        id: UserId,
    },
    Shutdown,
}

/// Granularity of the liveness sweep; the idle thresholds themselves come
/// from the config.
const LIVENESS_TICK: Duration = Duration::from_secs(5);

/// The event loop. It owns the `ServerState` outright: every mutation of
/// users, channels and the indices happens on this task, in event order,
/// which serializes command processing exactly the way the wire protocol
/// promises it (per-connection arrival order, deterministic fan-out).
pub async fn run(mut state: ServerState, mut events: mpsc::Receiver<Event>) {
    let mut tick = time::interval(LIVENESS_TICK);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(Event::Connected { id, host, tx }) => state.add_user(id, host, tx),
                Some(Event::Line { id, line }) => {
                    if let Some(user) = state.user_mut(id) {
                        // Any traffic proves liveness and retires the probe.
                        user.last_activity = Instant::now();
                        user.ping_probe = None;
                    }
                    request::handle_line(&mut state, id, &line);
                }
                Some(Event::RecvOverflow { id }) => {
                    state.quit_user(id, SessionEnd::RecvQExceeded);
                    state.flush_teardowns();
                }
                Some(Event::Disconnected { id }) => {
                    state.remove_user(id);
                    state.flush_teardowns();
                }
                Some(Event::Shutdown) | None => break,
            },
            _ = tick.tick() => {
                check_liveness(&mut state);
                state.flush_teardowns();
            }
        }
    }

    shutdown(&mut state);
}

/// Idle sweep: a session silent past the ping interval gets a PING with a
/// random cookie; one that stays silent past the timeout is gone. Any inbound line
/// clears the probe, so an outstanding probe plus more silence means a
/// dead peer.
fn check_liveness(state: &mut ServerState) {
    let ping_after = Duration::from_secs(state.config.limits.ping_interval_secs);
    let drop_after = Duration::from_secs(state.config.limits.ping_timeout_secs);
    let now = Instant::now();

    for id in state.user_ids() {
        let Some(user) = state.user(id) else {
            continue;
        };
        if user.status == UserStatus::QuittingSoon {
            continue;
        }
        let idle = now.duration_since(user.last_activity);
        let probed = user.ping_probe.is_some();

        if probed {
            if idle >= ping_after + drop_after {
                state.quit_user(id, SessionEnd::PingTimeout);
            }
        } else if idle >= ping_after {
            let cookie = format!("{:08x}", rand::random::<u32>());
            let line = state.render(&Reply::PingProbe { cookie: &cookie });
            state.send_line(id, &line);
            if let Some(user) = state.user_mut(id) {
                user.ping_probe = Some(cookie);
            }
        }
    }
}

/// Orderly shutdown: every client is told once, then dropping the state
/// drops every outbound sender, and each writer task flushes its queue
/// and closes its socket.
fn shutdown(state: &mut ServerState) {
    info!("shutting down, notifying {} clients", state.user_count());
    let line = state.render(&Reply::ErrorLine {
        text: SessionEnd::ServerShutdown.reason(),
    });
    for id in state.user_ids() {
        state.send_line(id, &line);
    }
}
