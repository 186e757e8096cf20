//! Our error types for the PZEM-6L24 driver.

use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for PZEM-6L24 communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    SerialError(I),
    #[error("Communication timeout")]
    Timeout,
    #[error("Checksum mismatch: computed {computed:#06X}, received {received:#06X}")]
    ChecksumMismatch { computed: u16, received: u16 },
    #[error("Response shorter than reported")]
    ShortRead,
    #[error("Invalid range")]
    InvalidRange,
    #[error("Buffer capacity exceeded")]
    BufferError,
    #[error("Observer capacity exceeded")]
    TooManyObservers,
}

impl<I: embedded_io::Error> From<embedded_io::ReadExactError<I>> for Error<I> {
    fn from(err: embedded_io::ReadExactError<I>) -> Self {
        match err {
            embedded_io::ReadExactError::UnexpectedEof => Error::ShortRead,
            embedded_io::ReadExactError::Other(inner) => Error::SerialError(inner),
        }
    }
}
