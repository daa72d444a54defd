use thiserror::Error;

pub type Result<T, E = TransportError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
    #[error("operation not supported on this transport: {0}")]
    Unsupported(&'static str),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("timeout")]
    Timeout,
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => TransportError::Timeout,
            std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::BrokenPipe => {
                TransportError::Closed
            }
            _ => TransportError::Io(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_io_error_kinds() {
        assert!(matches!(
            TransportError::from(IoError::from(ErrorKind::TimedOut)),
            TransportError::Timeout
        ));
        assert!(matches!(
            TransportError::from(IoError::from(ErrorKind::BrokenPipe)),
            TransportError::Closed
        ));
        assert!(matches!(
            TransportError::from(IoError::new(ErrorKind::Other, "boom")),
            TransportError::Io(msg) if msg == "boom"
        ));
    }
}
