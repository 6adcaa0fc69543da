use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use ffmpeg_source::{DEFAULT_BUFFER_SIZE, ProbeConfig, probe};

#[derive(Parser, Debug)]
pub struct ProbeCommand {
    /// Container format to force before opening
    #[arg(short, long, default_value = "mp4")]
    pub format: String,

    /// Let FFmpeg detect the container instead of forcing one
    #[arg(long, conflicts_with = "format")]
    pub auto: bool,

    /// Placeholder name passed to avformat_open_input
    #[arg(long, default_value = "stream")]
    pub url: String,

    /// Size of the I/O buffer handed to FFmpeg, in bytes
    #[arg(short, long, default_value = "4096")]
    pub buffer_size: usize,

    /// Allow the memory source to serve bytes instead of reporting EAGAIN
    #[arg(long)]
    pub blocking: bool,

    /// File whose contents the memory source serves (implies --blocking)
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

impl Default for ProbeCommand {
    fn default() -> Self {
        Self {
            format: "mp4".to_string(),
            auto: false,
            url: "stream".to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            blocking: false,
            input: None,
        }
    }
}

impl ProbeCommand {
    pub fn config(&self) -> Result<ProbeConfig> {
        let data = match &self.input {
            Some(path) => Some(
                std::fs::read(path)
                    .with_context(|| format!("Failed to read input file {}", path.display()))?,
            ),
            None => None,
        };

        Ok(ProbeConfig {
            format: (!self.auto).then(|| self.format.clone()),
            url: self.url.clone(),
            buffer_size: self.buffer_size,
            blocking: self.blocking || data.is_some(),
            data,
        })
    }

    /// Run a single probe. Setup failures are returned; a failed open is
    /// logged and the run still succeeds.
    pub fn run(self) -> Result<()> {
        let config = self.config()?;
        tracing::debug!(
            format = config.format.as_deref().unwrap_or("auto"),
            buffer_size = config.buffer_size,
            blocking = config.blocking,
            "probing memory source"
        );

        let report = probe(config)?;

        match &report.opened {
            Some(opened) => {
                tracing::info!(
                    format = opened.format_name.as_deref().unwrap_or("unknown"),
                    streams = opened.stream_count,
                    duration = ?opened.duration,
                    "{}",
                    report.describe()
                );
            }
            None => tracing::warn!("{}", report.describe()),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config_matches_library_default() {
        let config = ProbeCommand::default().config().unwrap();
        let expected = ProbeConfig::default();
        assert_eq!(config.format, expected.format);
        assert_eq!(config.url, expected.url);
        assert_eq!(config.buffer_size, expected.buffer_size);
        assert_eq!(config.blocking, expected.blocking);
        assert!(config.data.is_none());
    }

    #[test]
    fn auto_drops_forced_format() {
        let cmd = ProbeCommand {
            auto: true,
            ..ProbeCommand::default()
        };
        assert!(cmd.config().unwrap().format.is_none());
    }

    #[test]
    fn input_file_implies_blocking() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x00\x00\x00\x08free").unwrap();

        let cmd = ProbeCommand {
            input: Some(file.path().to_path_buf()),
            ..ProbeCommand::default()
        };
        let config = cmd.config().unwrap();
        assert!(config.blocking);
        assert_eq!(config.data.as_deref(), Some(&b"\x00\x00\x00\x08free"[..]));
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = ProbeCommand {
            input: Some(dir.path().join("missing.mp4")),
            ..ProbeCommand::default()
        };
        let err = cmd.config().unwrap_err();
        assert!(err.to_string().starts_with("Failed to read input file"));
    }

    #[test]
    fn failed_open_is_not_fatal() {
        assert!(ProbeCommand::default().run().is_ok());
    }

    #[test]
    fn unknown_format_is_fatal() {
        let cmd = ProbeCommand {
            format: "doesnotexist".to_string(),
            ..ProbeCommand::default()
        };
        let err = cmd.run().unwrap_err();
        assert!(err.to_string().contains("doesnotexist"));
    }
}
