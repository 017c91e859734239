use crate::broker::Event;
use crate::message::ReadBuffer;
use crate::message_models::{Outbound, OutboundRx, outbound_channel};
use crate::users::{UserId, next_user_id};
use log::debug;
use std::net::SocketAddr;
use tokio::io::{self, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

/// Entry point for an accepted connection: allocate the session id, wire
/// up the outbound queue, split the socket into a reader and a writer
/// task. Neither task touches server state; they only move bytes between
/// the socket and the broker.
pub async fn spawn_connection(socket: TcpStream, addr: SocketAddr, events: mpsc::Sender<Event>) {
    let id = next_user_id();
    let host = addr.ip().to_string();
    let (tx_outbound, rx_outbound) = outbound_channel();

    // The broker must learn of the session before any of its lines.
    if events
        .send(Event::Connected {
            id,
            host,
            tx: tx_outbound,
        })
        .await
        .is_err()
    {
        return;
    }

    let (read_half, write_half) = io::split(socket);
    tokio::spawn(client_reader_task(read_half, id, events));
    tokio::spawn(client_writer_task(write_half, id, rx_outbound));
}

/// Reads raw bytes, feeds the framing buffer, forwards each complete line
/// in arrival order. A recv-q overflow or EOF ends the task; the broker
/// handles the consequences.
async fn client_reader_task(
    mut reader: io::ReadHalf<TcpStream>,
    id: UserId,
    events: mpsc::Sender<Event>,
) {
    let mut chunk = [0u8; 1024];
    let mut read_buffer = ReadBuffer::new();
    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!("[{id}] read error: {e}");
                break;
            }
        };
        match read_buffer.push(&chunk[..n]) {
            Ok(lines) => {
                for line in lines {
                    if events.send(Event::Line { id, line }).await.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                debug!("[{id}] {e}");
                let _ = events.send(Event::RecvOverflow { id }).await;
                return;
            }
        }
    }
    let _ = events.send(Event::Disconnected { id }).await;
}

/// Drains the session's outbound queue onto the socket. `Shutdown` (or
/// the broker dropping the sender) flushes whatever was queued ahead of
/// it and closes the connection, which is exactly the QUIT ordering the
/// protocol wants.
async fn client_writer_task(mut writer: io::WriteHalf<TcpStream>, id: UserId, mut rx: OutboundRx) {
    while let Some(out) = rx.recv().await {
        match out {
            Outbound::Line(line) => {
                if let Err(e) = writer.write_all(line.as_bytes()).await {
                    debug!("[{id}] write error: {e}");
                    break;
                }
            }
            Outbound::Shutdown => break,
        }
    }
    let _ = writer.flush().await;
    let _ = writer.shutdown().await;
    debug!("[{id}] writer closed");
}
