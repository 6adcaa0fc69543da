/*!
    Classification of `avformat_open_input` status codes.
*/

use std::ffi::c_int;

use ffmpeg_next::{error::EAGAIN, ffi};

/**
    What an open-input attempt amounted to.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeResult {
    /// The demuxer accepted the input.
    Success,
    /// The source ran out of bytes before the header was complete.
    EndOfStream,
    /// The bytes did not form a valid container.
    InvalidData,
    /// The source had nothing to offer yet (`AVERROR(EAGAIN)`).
    NotAvailable,
    /// Any other non-zero status.
    Failed(c_int),
}

impl ProbeResult {
    pub fn from_status(status: c_int) -> Self {
        if status == 0 {
            Self::Success
        } else if status == ffi::AVERROR_EOF {
            Self::EndOfStream
        } else if status == ffi::AVERROR_INVALIDDATA {
            Self::InvalidData
        } else if status == ffi::AVERROR(EAGAIN) {
            Self::NotAvailable
        } else {
            Self::Failed(status)
        }
    }

    /**
        Classify an open status together with the read error left on the
        I/O context.

        Demuxers turn a source that never produced bytes into their own
        status (the mov demuxer reports a missing `moov` atom as
        `AVERROR_INVALIDDATA`). When the source itself answered
        `AVERROR(EAGAIN)`, that is the real cause, so it wins.
    */
    pub fn from_open(status: c_int, io_error: c_int) -> Self {
        match Self::from_status(status) {
            Self::Success => Self::Success,
            _ if io_error == ffi::AVERROR(EAGAIN) => Self::NotAvailable,
            result => result,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "avformat_open_input() succeeded",
            Self::EndOfStream => "avformat_open_input() failed, EOF reached",
            Self::InvalidData => "avformat_open_input() failed, invalid input data",
            Self::NotAvailable => {
                "avformat_open_input() failed, input is not available at this state"
            }
            Self::Failed(_) => "avformat_open_input() failed",
        }
    }
}

impl std::fmt::Display for ProbeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/**
    Render the magnitude of a negative FFmpeg status as a four-character tag.

    Many FFmpeg errors are negated FourCCs (`AVERROR_EOF` is `-'EOF '`).
    Bytes are taken little-endian; anything that is not printable ASCII is
    shown as `.`, so errno-style codes come out as e.g. `"...."`.
*/
pub fn fourcc_tag(status: c_int) -> String {
    status
        .wrapping_neg()
        .to_le_bytes()
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

/**
    One-line diagnostic for a failed open, with the raw code and its tag.
*/
pub fn describe_status(status: c_int, result: ProbeResult) -> String {
    format!(
        "avformat_open_input() returned {} ({}): {}",
        status,
        fourcc_tag(status),
        result
    )
}
