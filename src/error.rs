//! Our error types for the acquisition pipeline.

use thiserror::Error;

pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Failures that can stop a sweep or keep the firmware from starting.
///
/// `E` is the error type of the converter bus in use. Frame transmission failures are not
/// represented here, a frame that fails to send is dropped and counted instead.
#[derive(Error, Debug)]
pub enum Error<E: core::fmt::Debug> {
    /// The converter bus failed mid sweep. Channels already sampled in this cycle keep their
    /// new values, the rest keep the previous cycle's.
    #[error("Converter bus transport error")]
    Transport(E),
    /// The converter could not be configured at startup.
    #[error("Converter setup failed")]
    Setup(E),
}

impl<E: core::fmt::Debug> Error<E> {
    /// The underlying bus error.
    pub fn source_error(&self) -> &E {
        match self {
            Error::Transport(e) | Error::Setup(e) => e,
        }
    }
}
