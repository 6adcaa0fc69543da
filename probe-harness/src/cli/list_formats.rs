use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug, Default)]
pub struct ListFormatsCommand {
    /// Only show demuxers whose name contains this string
    pub filter: Option<String>,
}

impl ListFormatsCommand {
    pub fn run(self) -> Result<()> {
        ffmpeg_source::init()?;

        let formats = ffmpeg_source::input_formats();
        let mut shown = 0;

        for format in &formats {
            let name = format.name();
            if let Some(filter) = &self.filter
                && !name.contains(filter.as_str())
            {
                continue;
            }
            shown += 1;
            println!(
                "  {:<24} {}",
                name,
                format.long_name().as_deref().unwrap_or("")
            );
        }

        println!();
        println!("{} of {} demuxer(s)", shown, formats.len());

        Ok(())
    }
}
