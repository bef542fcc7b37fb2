//! Unified error type.

use std::net::AddrParseError;

use thiserror::Error;

/// The error type returned by midway's fallible operations.
///
/// Application-level errors (400, 401, 404, etc.) are expressed as HTTP
/// responses, see [`Rejection`](crate::Rejection). This type surfaces
/// infrastructure failures: loading configuration, binding to a port or
/// accepting a connection.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{addr}`: {source}")]
    Address {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("invalid value `{value}` for {var}")]
    Config { var: &'static str, value: String },
}
