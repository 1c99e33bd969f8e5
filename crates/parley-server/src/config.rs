//! Binary CLI arguments.

use clap::Parser;

use crate::history::DEFAULT_HISTORY_CAP;

/// Command-line arguments for `parley-server`.
#[derive(Debug, Parser)]
#[command(name = "parley-server", about = "Room-scoped real-time chat server")]
pub struct Args {
    /// Interface to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 3000, env = "PARLEY_PORT")]
    pub port: u16,

    /// Maximum retained chat messages across all rooms combined.
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAP)]
    pub history_cap: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["parley-server"]);
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, 3000);
        assert_eq!(args.history_cap, DEFAULT_HISTORY_CAP);
    }

    #[test]
    fn overrides() {
        let args = Args::parse_from([
            "parley-server",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--history-cap",
            "50",
        ]);
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 8080);
        assert_eq!(args.history_cap, 50);
    }
}
