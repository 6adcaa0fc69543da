/*!
    Memory-backed media source and input probing for the ffmpeg crate ecosystem.

    This crate feeds FFmpeg's demuxers from memory through a custom
    `AVIOContext` instead of a file or URL, and reports how
    `avformat_open_input` reacts. A [`MemorySource`] that is not
    blocking-capable never produces bytes and answers every read with
    `AVERROR(EAGAIN)`, which makes it useful for observing how a demuxer
    behaves on a source that is not ready yet.

    # Probing

    ```ignore
    use ffmpeg_source::{ProbeConfig, probe};

    let report = probe(ProbeConfig::default())?;
    eprintln!("{}", report.describe());
    ```
*/

mod error;
mod format;
mod io;
mod memory;
mod outcome;
mod probe;

pub use error::{Error, Result};
pub use format::{FormatContext, InputFormat, OpenedInput, find_input_format, input_formats};
pub use io::IoContext;
pub use memory::{AvBuffer, DEFAULT_BUFFER_SIZE, MemorySource};
pub use outcome::{ProbeResult, describe_status, fourcc_tag};
pub use probe::{ProbeConfig, ProbeReport, init, probe, probe_default};
