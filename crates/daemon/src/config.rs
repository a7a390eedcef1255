//! Command-line configuration for the daemon binary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use protocol::DEFAULT_PORT;

/// Parsed daemon configuration, decoupled from [`clap`] so callers can build
/// one directly (tests, embedders) without going through argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    /// Address and port to bind the listening socket to.
    pub bind: SocketAddr,
    /// Whether verbose per-request logging is enabled.
    pub verbose: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            verbose: false,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "netfiled", about = "Remote file access daemon", version)]
struct Cli {
    /// Address to bind the listening socket to.
    #[arg(long, short = 'a', default_value = "0.0.0.0")]
    address: IpAddr,

    /// Port to bind the listening socket to.
    #[arg(long, short = 'p', default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Enable verbose per-request logging.
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl DaemonConfig {
    /// Parses a [`DaemonConfig`] from the given argument iterator, mirroring
    /// [`clap::Parser::try_parse_from`]'s error handling so callers can print
    /// clap's own usage text on failure.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;
        Ok(Self {
            bind: SocketAddr::new(cli.address, cli.port),
            verbose: cli.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_to_all_interfaces_on_the_standard_port() {
        let config = DaemonConfig::try_parse_from(["netfiled"]).unwrap();
        assert_eq!(config.bind, SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT));
        assert!(!config.verbose);
    }

    #[test]
    fn accepts_address_port_and_verbose_flags() {
        let config =
            DaemonConfig::try_parse_from(["netfiled", "--address", "127.0.0.1", "--port", "9001", "-v"])
                .unwrap();
        assert_eq!(config.bind, SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9001));
        assert!(config.verbose);
    }

    #[test]
    fn rejects_an_unparsable_port() {
        let err = DaemonConfig::try_parse_from(["netfiled", "--port", "not-a-port"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
