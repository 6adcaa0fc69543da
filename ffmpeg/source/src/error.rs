/*!
    Errors for fatal probe setup failures.
*/

use thiserror::Error;

/**
    Fatal errors raised while setting up a probe.

    Each variant corresponds to one setup step that cannot be recovered from.
    The outcome of the open-input call itself is never an error, see
    [`ProbeResult`](crate::ProbeResult).
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("ffmpeg initialization failed: {0}")]
    Init(String),

    #[error("av_malloc({0}) failed")]
    BufferAlloc(usize),

    #[error("avformat_alloc_context() failed")]
    ContextAlloc,

    #[error("avio_alloc_context() failed")]
    IoContextAlloc,

    #[error("av_find_input_format(\"{0}\") failed")]
    FormatNotFound(String),

    #[error("invalid {kind} '{value}': contains a NUL byte")]
    InvalidName { kind: &'static str, value: String },

    #[error("buffer size {0} does not fit in a C int")]
    BufferTooLarge(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
