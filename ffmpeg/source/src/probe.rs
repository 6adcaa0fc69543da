/*!
    Probe driver: open an input through a memory source with a forced format.
*/

use std::ffi::c_int;

use crate::error::{Error, Result};
use crate::format::{FormatContext, OpenedInput, find_input_format};
use crate::io::IoContext;
use crate::memory::{DEFAULT_BUFFER_SIZE, MemorySource};
use crate::outcome::{ProbeResult, describe_status};

/**
    Configuration for a single probe attempt.
*/
#[derive(Clone, Debug)]
pub struct ProbeConfig {
    /// Demuxer to force (None = let FFmpeg detect the container).
    pub format: Option<String>,
    /// Name handed to `avformat_open_input`. Never opened as a resource.
    pub url: String,
    /// Size of the scratch buffer given to the I/O context.
    pub buffer_size: usize,
    /// Whether the memory source may serve data.
    pub blocking: bool,
    /// Bytes served by a blocking source.
    pub data: Option<Vec<u8>>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            format: Some("mp4".to_string()),
            url: "stream".to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            blocking: false,
            data: None,
        }
    }
}

/**
    Result of a probe whose setup succeeded.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeReport {
    /// Raw status returned by `avformat_open_input`.
    pub status: c_int,
    /// Classified status.
    pub result: ProbeResult,
    /// Details of the opened input, on success.
    pub opened: Option<OpenedInput>,
}

impl ProbeReport {
    /**
        Diagnostic line for this attempt.
    */
    pub fn describe(&self) -> String {
        if self.result.is_success() {
            self.result.to_string()
        } else {
            describe_status(self.status, self.result)
        }
    }
}

/**
    Initialize FFmpeg. Safe to call more than once.
*/
pub fn init() -> Result<()> {
    ffmpeg_next::init().map_err(|e| Error::Init(e.to_string()))
}

/**
    Run one probe attempt.

    Setup failures (context allocation, I/O binding, format lookup) are
    returned as errors. A failed open is not: it is classified and returned
    in the report.

    # Example

    ```ignore
    let report = probe(ProbeConfig::default())?;
    if !report.result.is_success() {
        eprintln!("{}", report.describe());
    }
    ```
*/
pub fn probe(config: ProbeConfig) -> Result<ProbeReport> {
    init()?;

    let format = FormatContext::alloc()?;

    let source = match config.data {
        Some(data) => MemorySource::with_data(config.buffer_size, data)?,
        None => MemorySource::new(config.buffer_size, config.blocking)?,
    };
    let io = IoContext::bind(source)?;

    let mut format = format.attach_io(&io);

    let input_format = config.format.as_deref().map(find_input_format).transpose()?;

    let status = format.open_input(&config.url, input_format)?;
    // The context stays attached to io after a failed open, so its read error is still there.
    let io_error = io.error();
    let result = ProbeResult::from_open(status, io_error);
    let opened = format.opened_input();

    tracing::debug!(status, io_error, ?result, "open input finished");

    Ok(ProbeReport {
        status,
        result,
        opened,
    })
}

/**
    Run one probe attempt with the default configuration: forced `"mp4"`,
    a 4096 byte buffer and a source that is never ready.
*/
pub fn probe_default() -> Result<ProbeReport> {
    probe(ProbeConfig::default())
}
