use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::segmentation::Cue;

// @module: Cue rendering to subtitle files

// @const: SRT timing line
static TIMING_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}:\d{2}:\d{2}[,.]\d{3}) --> (\d{2,}:\d{2}:\d{2}[,.]\d{3})$").unwrap()
});

// @enum: Supported subtitle syntaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// SubRip
    #[default]
    Srt,
}

impl OutputFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Srt => "srt",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "srt" => Ok(OutputFormat::Srt),
            other => Err(anyhow!("Unsupported output format: {} (only srt is supported)", other)),
        }
    }
}

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm), rounded to the nearest millisecond
pub fn format_timestamp(seconds: f64) -> String {
    format_millis(to_millis(seconds))
}

fn to_millis(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}

fn format_millis(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Parse an SRT timestamp into seconds; a '.' separator is accepted too
pub fn parse_timestamp(timestamp: &str) -> Result<f64> {
    let parts: Vec<&str> = timestamp.trim().split([':', ',', '.']).collect();
    if parts.len() != 4 {
        return Err(anyhow!("Invalid timestamp format: {}", timestamp));
    }

    let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
    let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
    let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
    let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

    if minutes >= 60 || seconds >= 60 || millis >= 1000 || parts[3].len() != 3 {
        return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
    }

    let total_ms = hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis;
    Ok(total_ms as f64 / 1000.0)
}

/// Millisecond ranges as written to disk
///
/// Rounding can collapse a cue shorter than half a millisecond, so each start
/// is held at or after the previous rendered end and each end at least one
/// millisecond after its start.
pub fn rendered_ranges(cues: &[Cue]) -> Vec<(u64, u64)> {
    let mut previous_end = 0;
    cues.iter()
        .map(|cue| {
            let start = to_millis(cue.start).max(previous_end);
            let end = to_millis(cue.end).max(start + 1);
            previous_end = end;
            (start, end)
        })
        .collect()
}

// @struct: One rendered SRT block with its millisecond range
struct SrtBlock<'a> {
    cue: &'a Cue,
    range: (u64, u64),
}

impl fmt::Display for SrtBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cue = self.cue;
        writeln!(f, "{}", cue.index)?;
        writeln!(f, "{} --> {}", format_millis(self.range.0), format_millis(self.range.1))?;
        for line in &cue.lines {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)
    }
}

/// Renders cues as SubRip text
#[derive(Debug, Clone, Copy, Default)]
pub struct SrtFormatter;

impl SrtFormatter {
    /// Render all cues; blocks are separated by a blank line
    pub fn render(cues: &[Cue]) -> String {
        Self::blocks(cues).map(|block| block.to_string()).collect()
    }

    fn blocks(cues: &[Cue]) -> impl Iterator<Item = SrtBlock<'_>> {
        cues.iter()
            .zip(rendered_ranges(cues))
            .map(|(cue, range)| SrtBlock { cue, range })
    }

    /// Write cues to `path`, creating parent directories as needed
    pub fn write_to_file<P: AsRef<Path>>(cues: &[Cue], path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for block in Self::blocks(cues) {
            write!(writer, "{}", block)?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;

        Ok(())
    }

    /// Parse SubRip text back into cues
    pub fn parse(content: &str) -> Result<Vec<Cue>> {
        let normalized = content.replace("\r\n", "\n");
        let mut cues = Vec::new();

        for block in normalized.split("\n\n").map(str::trim).filter(|b| !b.is_empty()) {
            let mut lines = block.lines();
            let index_line = lines.next().unwrap_or_default();
            let index: usize = index_line
                .trim()
                .parse()
                .with_context(|| format!("Invalid cue index: {}", index_line))?;

            let timing = lines
                .next()
                .ok_or_else(|| anyhow!("Cue {} has no timing line", index))?;
            let caps = TIMING_LINE_REGEX
                .captures(timing.trim())
                .ok_or_else(|| anyhow!("Cue {} has an invalid timing line: {}", index, timing))?;

            cues.push(Cue {
                index,
                start: parse_timestamp(&caps[1])?,
                end: parse_timestamp(&caps[2])?,
                lines: lines.map(str::to_string).collect(),
            });
        }

        Ok(cues)
    }
}
