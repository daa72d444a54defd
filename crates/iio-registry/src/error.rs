use iio_transport::TransportError;
use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

// POSIX error numbers reported back to the protocol engine.
const EIO: i32 = 5;
const ENOENT: i32 = 2;
const ENOMEM: i32 = 12;
const EINVAL: i32 = 22;
const ENOSPC: i32 = 28;
const ENOSYS: i32 = 38;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
    #[error("out of memory")]
    OutOfMemory,
    #[error("already registered: {0}")]
    AlreadyExists(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid device id: {0:?}")]
    InvalidDeviceId(String),
    #[error("{field} is {len} bytes, limit is {max}")]
    NameTooLong {
        field: &'static str,
        max: usize,
        len: usize,
    },
    #[error("invalid {field}: {value:?}")]
    InvalidName { field: &'static str, value: String },
    #[error("context descriptor needs {needed} bytes, capacity is {capacity}")]
    DescriptorOverflow { needed: usize, capacity: usize },
    #[error("accessor failed with errno {0}")]
    Errno(i32),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl Error {
    /// Negative POSIX error code for the protocol engine's wire reply.
    pub fn errno(&self) -> i32 {
        match self {
            Error::NotFound(_) => -ENOENT,
            Error::Unsupported(_) => -ENOSYS,
            Error::OutOfMemory => -ENOMEM,
            Error::AlreadyExists(_)
            | Error::InvalidArgument(_)
            | Error::InvalidDeviceId(_)
            | Error::NameTooLong { .. }
            | Error::InvalidName { .. } => -EINVAL,
            Error::DescriptorOverflow { .. } => -ENOSPC,
            Error::Errno(n) => -n.saturating_abs(),
            Error::Transport(_) => -EIO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(Error::NotFound("device 3".into()).errno(), -2);
        assert_eq!(Error::Unsupported("read_data").errno(), -38);
        assert_eq!(Error::OutOfMemory.errno(), -12);
        assert_eq!(Error::AlreadyExists("attribute raw".into()).errno(), -22);
        assert_eq!(Error::InvalidDeviceId("adc".into()).errno(), -22);
        assert_eq!(Error::Errno(5).errno(), -5);
        assert_eq!(Error::Errno(-16).errno(), -16);
        assert_eq!(Error::Transport(TransportError::Timeout).errno(), -5);
    }
}
