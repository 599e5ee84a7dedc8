//! Serving: one TCP listener, two protocol surfaces.

mod mux;
mod shutdown;

use std::io;
use std::net::SocketAddr;

pub use mux::serve;
pub use shutdown::shutdown_signal;

/// Result alias for serving.
pub type ServeResult<T = ()> = Result<T, ServeError>;

/// Errors terminating the serve loop.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The accept loop failed irrecoverably.
    #[error("server runtime error: {0}")]
    Runtime(#[from] io::Error),
}

impl ServeError {
    /// Operator hint for common failures.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Bind { source, .. } => match source.kind() {
                io::ErrorKind::AddrInUse => {
                    Some("another process is using this port; pick a different --port")
                }
                io::ErrorKind::PermissionDenied => {
                    Some("binding requires elevated privileges; use a port above 1024")
                }
                _ => None,
            },
            Self::Runtime(_) => None,
        }
    }
}
