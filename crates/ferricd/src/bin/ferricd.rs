use clap::Parser;
use clap::error::ErrorKind;
use ferricd::broker::{self, Event};
use ferricd::config::{Cli, Config};
use ferricd::errors::ServerError;
use ferricd::handlers::client::spawn_connection;
use ferricd::server_state::ServerState;
use flexi_logger::Logger;
use log::{error, info};
use std::process::ExitCode;
use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.log_to_stderr().start())
        .ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };
    let config = match cli.config.as_ref().map(Config::load).transpose() {
        Ok(loaded) => loaded.unwrap_or_default(),
        Err(e) => {
            let err = ServerError::BadArgs(format!("cannot load configuration: {e}"));
            error!("{err}");
            return ExitCode::from(err.exit_code());
        }
    };

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<(), ServerError> {
    let listener = TcpListener::bind(("0.0.0.0", cli.port))
        .await
        .map_err(ServerError::Bind)?;
    info!("{} listening on port {}", config.server.name, cli.port);

    let state = ServerState::new(config, cli.password);
    let (tx_events, rx_events) = mpsc::channel::<Event>(1024);
    let broker = tokio::spawn(broker::run(state, rx_events));

    let mut sigint =
        signal(SignalKind::interrupt()).map_err(|e| ServerError::Fatal(e.to_string()))?;
    let mut sigterm =
        signal(SignalKind::terminate()).map_err(|e| ServerError::Fatal(e.to_string()))?;

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((socket, addr)) => spawn_connection(socket, addr, tx_events.clone()).await,
                Err(e) => error!("accept failed: {e}"),
            },
            _ = sigint.recv() => break,
            _ = sigterm.recv() => break,
        }
    }

    info!("signal received, shutting down");
    let _ = tx_events.send(Event::Shutdown).await;
    drop(tx_events);
    broker
        .await
        .map_err(|e| ServerError::Fatal(format!("broker task failed: {e}")))?;
    Ok(())
}
