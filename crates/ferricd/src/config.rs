use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// `ferricd <port> <password>`. The password is mandatory on the command
/// line; passing the empty string runs the server without one. Environment
/// variables stand in when a positional is absent.
#[derive(Parser, Debug)]
#[command(name = "ferricd", about = "An RFC 1459 IRC server")]
pub struct Cli {
    /// TCP port to listen on (1-65535)
    #[arg(value_parser = clap::value_parser!(u16).range(1..), env = "PORT")]
    pub port: u16,

    /// Connection password; the empty string disables the PASS check
    #[arg(env = "PASSWORD")]
    pub password: String,

    /// Optional TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    /// Message of the day; absent means clients get ERR_NOMOTD.
    pub motd: Option<String>,
    pub info: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "ferric.local".to_owned(),
            version: concat!("ferricd-", env!("CARGO_PKG_VERSION")).to_owned(),
            motd: Some("Welcome to ferric. Mind the sparks.".to_owned()),
            info: vec![
                "ferricd, an RFC 1459 IRC server".to_owned(),
                "Single-threaded core, tokio reactor".to_owned(),
            ],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    /// Seconds of silence before the server sends a PING probe.
    pub ping_interval_secs: u64,
    /// Seconds after a probe before an unanswered connection is dropped.
    pub ping_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: 120,
            ping_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Loads and parses the TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
