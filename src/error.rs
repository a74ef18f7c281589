use std::fmt;

/// Configuration validation errors: bad version range, missing cert,
/// oversized path, empty secret — surfaced before any resource is acquired.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String, String),
    MissingField(String),
    OutOfRange(String, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue(key, value) => {
                write!(f, "invalid value '{}' for '{}'", value, key)
            }
            ConfigError::MissingField(field) => write!(f, "missing required field: '{}'", field),
            ConfigError::OutOfRange(field, reason) => {
                write!(f, "'{}' out of range: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error taxonomy surfaced by the core (§7): `would_block` is recovered
/// locally by every component and should never reach a caller, but the
/// variant exists so `Stream::read`/`write` can report it uniformly.
#[derive(Debug)]
pub enum CoreError {
    /// Non-blocking op has no progress right now.
    WouldBlock,
    /// Orderly far-end close.
    Closed,
    /// Idle / connect / handshake / overall deadline elapsed.
    Timeout(&'static str),
    /// TLS/DTLS/SRP/telnet invariant violation.
    Protocol(String),
    /// OS-level I/O failure.
    Io(std::io::Error),
    /// Invalid caller-supplied configuration.
    Config(ConfigError),
    /// Exec session exceeded its hard buffer ceiling.
    ExecFlow(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::WouldBlock => write!(f, "operation would block"),
            CoreError::Closed => write!(f, "connection closed"),
            CoreError::Timeout(which) => write!(f, "{} timed out", which),
            CoreError::Protocol(msg) => write!(f, "protocol error: {}", msg),
            CoreError::Io(err) => write!(f, "I/O error: {}", err),
            CoreError::Config(err) => write!(f, "configuration error: {}", err),
            CoreError::ExecFlow(msg) => write!(f, "exec flow control error: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoreError::Io(err) => Some(err),
            CoreError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::WouldBlock => CoreError::WouldBlock,
            ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe => CoreError::Closed,
            ErrorKind::TimedOut => CoreError::Timeout("I/O"),
            _ => CoreError::Io(err),
        }
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        CoreError::Config(err)
    }
}

impl From<openssl::error::ErrorStack> for CoreError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        CoreError::Protocol(err.to_string())
    }
}

/// Result type alias for core transfer-engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_would_block_maps_to_would_block() {
        let err = std::io::Error::from(std::io::ErrorKind::WouldBlock);
        assert!(matches!(CoreError::from(err), CoreError::WouldBlock));
    }

    #[test]
    fn io_connection_reset_maps_to_closed() {
        let err = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
        assert!(matches!(CoreError::from(err), CoreError::Closed));
    }

    #[test]
    fn config_error_displays_field_and_reason() {
        let err = CoreError::Config(ConfigError::OutOfRange(
            "mtu".to_string(),
            "must be >= 576".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "configuration error: 'mtu' out of range: must be >= 576"
        );
    }
}
