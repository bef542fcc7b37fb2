//! Process configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;
use crate::server::DEFAULT_MAX_BODY_SIZE;

/// Runtime settings for the demo server.
#[derive(Clone, Debug)]
pub struct Config {
    /// Interface to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Directory served by the static-file middleware.
    pub public_dir: PathBuf,
    /// How long `?slow=true` holds a request before it continues.
    pub slow_delay: Duration,
    /// Largest request body accepted, in bytes.
    pub max_body_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 3000,
            public_dir: PathBuf::from("public"),
            slow_delay: Duration::from_millis(3000),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl Config {
    /// Loads configuration from `MIDWAY_*` environment variables, falling
    /// back to the defaults for anything unset.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let defaults = Self::default();
        Ok(Self {
            host: lookup("MIDWAY_HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "MIDWAY_PORT")?.unwrap_or(defaults.port),
            public_dir: lookup("MIDWAY_PUBLIC_DIR").map(PathBuf::from).unwrap_or(defaults.public_dir),
            slow_delay: parse(&lookup, "MIDWAY_SLOW_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.slow_delay),
            max_body_size: parse(&lookup, "MIDWAY_MAX_BODY_BYTES")?.unwrap_or(defaults.max_body_size),
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, Error> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|source| Error::Address { addr, source })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, Error> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => {
            let parsed = value.trim().parse();
            parsed.map(Some).map_err(|_| Error::Config { var, value })
        }
    }
}
