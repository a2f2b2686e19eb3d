use std::io;

/// Errors that abort a scan before or instead of probing.
///
/// Per-port connection failures are never represented here: a probe that
/// fails for any reason simply reports the port as closed.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("invalid port {0}: must be between 1 and 65535")]
    InvalidPort(u32),

    #[error("invalid port value: '{0}'")]
    ParsePort(String),

    #[error("invalid port range {start}-{end}: start port must be less than or equal to end port")]
    InvalidRange { start: u16, end: u16 },

    #[error("'{host}' is not a valid host: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("'{host}' did not resolve to any address")]
    NoAddress { host: String },
}

impl ScanError {
    /// True for errors caused by the target host rather than the arguments.
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolve { .. } | Self::NoAddress { .. })
    }
}
