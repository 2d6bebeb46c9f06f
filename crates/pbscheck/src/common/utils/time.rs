use std::time::Duration;

use anyhow::anyhow;
use nom::character::complete::char;
use nom::combinator::{map_res, opt};
use nom::error::context;
use nom::sequence::{preceded, tuple};

use crate::common::parser::{NomResult, consume_all, p_u32};

// Allows specifying humantime format or HH:MM:SS
crate::arg_wrapper!(ExtendedArgDuration, Duration, parse_hms_or_human_time);

fn parse_hms_or_human_time(text: &str) -> anyhow::Result<Duration> {
    parse_hms_time(text)
        .or_else(|_| humantime::parse_duration(text))
        .map_err(|e| {
            anyhow!(
                "Could not parse walltime. Use either `HH:MM:SS` or humantime format (2hours): {:?}",
                e
            )
        })
}

fn p_hms_time(input: &str) -> NomResult<'_, Duration> {
    context(
        "[[HH:]MM:]SS value",
        map_res(
            tuple((
                p_u32,
                opt(preceded(char(':'), p_u32)),
                opt(preceded(char(':'), p_u32)),
            )),
            |parsed| match parsed {
                (seconds, None, None) => Ok(Duration::from_secs(seconds as u64)),
                (minutes, Some(seconds), None) => {
                    Ok(Duration::from_secs(minutes as u64 * 60 + seconds as u64))
                }
                (hours, Some(minutes), Some(seconds)) => Ok(Duration::from_secs(
                    hours as u64 * 3600 + minutes as u64 * 60 + seconds as u64,
                )),
                _ => Err(anyhow!("Invalid time specification")),
            },
        ),
    )(input)
}

/// Parses time strings in the format [[hh:]mm:]ss.
/// Individual time values may be zero padded.
pub fn parse_hms_time(input: &str) -> anyhow::Result<Duration> {
    consume_all(p_hms_time, input.trim())
}

/// Format a duration as a PBS time string, e.g. 01:05:02
pub fn format_hms_duration(duration: &Duration) -> String {
    let mut seconds = duration.as_secs();
    let hours = seconds / 3600;
    seconds %= 3600;
    let minutes = seconds / 60;
    seconds %= 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
