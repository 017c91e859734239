//! Load-generating IRC client: registers a swarm of virtual users, puts
//! them all in one channel and keeps them chatting.
//!
//!     ferricd_stress [addr] [password] [clients]

use std::error::Error;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{self, Duration};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:6667".to_owned());
    let password = args.next().unwrap_or_default();
    let num_clients: usize = args.next().and_then(|n| n.parse().ok()).unwrap_or(100);
    let interval_ms = 1000;

    println!("Starting stress test: {num_clients} clients against {addr}...");

    for i in 0..num_clients {
        let addr = addr.clone();
        let password = password.clone();
        tokio::spawn(async move {
            if let Err(e) = run_client(i, &addr, &password, interval_ms).await {
                eprintln!("client {i} error: {e}");
            }
        });

        // Small delay between spawns to avoid overwhelming the OS accept() queue
        time::sleep(Duration::from_millis(5)).await;
    }

    // Keep the main task alive forever
    std::future::pending::<()>().await;
    Ok(())
}

async fn run_client(id: usize, addr: &str, password: &str, interval: u64) -> io::Result<()> {
    let stream = TcpStream::connect(addr).await?;
    let (read_half, mut write_half) = stream.into_split();
    let nick = format!("bot{id}");

    // 1. Handshake
    let mut login = String::new();
    if !password.is_empty() {
        login.push_str(&format!("PASS {password}\r\n"));
    }
    login.push_str(&format!("NICK {nick}\r\nUSER {nick} 0 * :Load Tester\r\n"));
    write_half.write_all(login.as_bytes()).await?;

    // 2. Join a common channel to exercise the broadcast fan-out
    write_half.write_all(b"JOIN #stress_test\r\n").await?;

    // 3. Drain server output and surface PINGs, so idle probes never
    // reap the bots and the send-q never fills.
    let (tx_pong, mut rx_pong) = mpsc::channel::<String>(8);
    tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(token) = line.strip_prefix("PING ") {
                let _ = tx_pong.send(token.trim_start_matches(':').to_owned()).await;
            }
        }
    });

    let mut ticker = time::interval(Duration::from_millis(interval));
    let mut counter = 0usize;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let msg = format!("PRIVMSG #stress_test :message {counter} from {nick}\r\n");
                counter += 1;
                if write_half.write_all(msg.as_bytes()).await.is_err() {
                    break; // connection lost
                }
            }
            Some(token) = rx_pong.recv() => {
                let pong = format!("PONG :{token}\r\n");
                if write_half.write_all(pong.as_bytes()).await.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}
