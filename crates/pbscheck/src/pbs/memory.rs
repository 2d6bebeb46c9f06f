use std::fmt::{Display, Formatter};
use std::str::FromStr;

use nom::character::complete::{alpha0, space0};
use nom::error::context;
use nom::sequence::tuple;
use serde::{Deserialize, Serialize};

use crate::common::parser::{NomResult, consume_all, p_u64};

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;
const TB: u64 = 1024 * GB;

/// Amount of memory as reported by PBS (`resources_available.mem`, `resources_max.mem`, ...).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemorySize {
    bytes: u64,
}

impl MemorySize {
    pub const ZERO: MemorySize = MemorySize { bytes: 0 };

    pub fn from_gb(gb: u64) -> Self {
        Self {
            bytes: gb.saturating_mul(GB),
        }
    }

    /// Fractional gigabytes are truncated to whole megabytes.
    pub fn from_gb_f64(gb: f64) -> Self {
        let mb = (gb.max(0.0) * 1024.0) as u64;
        Self {
            bytes: mb.saturating_mul(MB),
        }
    }

    pub fn mb(&self) -> u64 {
        self.bytes / MB
    }

    /// Whole gigabytes, rounded down.
    pub fn gb(&self) -> u64 {
        self.bytes / GB
    }

    pub fn saturating_sub(self, other: MemorySize) -> MemorySize {
        MemorySize {
            bytes: self.bytes.saturating_sub(other.bytes),
        }
    }
}

impl Display for MemorySize {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let bytes = self.bytes;
        if bytes == 0 {
            return f.write_str("0b");
        }
        for (unit, size) in [("tb", TB), ("gb", GB), ("mb", MB), ("kb", KB)] {
            if bytes % size == 0 {
                return write!(f, "{}{unit}", bytes / size);
            }
        }
        write!(f, "{bytes}b")
    }
}

fn unit_size(unit: &str) -> Option<u64> {
    match unit.to_ascii_lowercase().as_str() {
        "b" => Some(1),
        "kb" => Some(KB),
        "mb" => Some(MB),
        "gb" => Some(GB),
        "tb" => Some(TB),
        _ => None,
    }
}

fn p_memory(input: &str) -> NomResult<'_, (u64, &str)> {
    let (input, (value, _, unit)) =
        context("memory amount <N><unit>", tuple((p_u64, space0, alpha0)))(input)?;
    Ok((input, (value, unit)))
}

/// Parses a PBS size string such as `128gb`, `4194304kb` or `512mb`.
///
/// A missing or unrecognized unit is an error: the caller decides whether
/// that means "unknown" or "nothing".
pub fn parse_memory_size(text: &str) -> anyhow::Result<MemorySize> {
    let (value, unit) = consume_all(p_memory, text.trim())?;
    if unit.is_empty() {
        anyhow::bail!("Memory amount `{}` has no unit", text.trim());
    }
    let size = unit_size(unit)
        .ok_or_else(|| anyhow::anyhow!("Unknown memory unit `{}` in `{}`", unit, text.trim()))?;
    let bytes = value
        .checked_mul(size)
        .ok_or_else(|| anyhow::anyhow!("Memory amount `{}` is too large", text.trim()))?;
    Ok(MemorySize { bytes })
}

impl FromStr for MemorySize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_memory_size(s)
    }
}

impl TryFrom<String> for MemorySize {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_memory_size(&value)
    }
}

impl From<MemorySize> for String {
    fn from(value: MemorySize) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySize, parse_memory_size};

    fn gb(text: &str) -> u64 {
        parse_memory_size(text).unwrap().gb()
    }

    #[test]
    fn gb_is_identity() {
        assert_eq!(gb("0gb"), 0);
        assert_eq!(gb("16gb"), 16);
        assert_eq!(gb("498gb"), 498);
    }

    #[test]
    fn mb_divides_once() {
        assert_eq!(gb("1024mb"), 1);
        assert_eq!(gb("2047mb"), 1);
        assert_eq!(gb("512mb"), 0);
        assert_eq!(gb("131072mb"), 128);
    }

    #[test]
    fn kb_divides_twice() {
        assert_eq!(gb("1048576kb"), 1);
        assert_eq!(gb("263518208kb"), 251);
        assert_eq!(gb("1048575kb"), 0);
    }

    #[test]
    fn units_are_case_insensitive() {
        assert_eq!(gb("16GB"), 16);
        assert_eq!(gb("2Tb"), 2048);
        assert_eq!(gb(" 8 gb "), 8);
    }

    #[test]
    fn conversion_is_monotonic() {
        let values = ["1kb", "1023kb", "1mb", "1048576kb", "1025mb", "2gb", "1tb"];
        let sizes: Vec<MemorySize> = values
            .iter()
            .map(|v| parse_memory_size(v).unwrap())
            .collect();
        assert!(sizes.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn missing_unit_is_an_error() {
        assert!(parse_memory_size("128").is_err());
        assert!(parse_memory_size("0").is_err());
    }

    #[test]
    fn unknown_unit_is_an_error() {
        assert!(parse_memory_size("128pb").is_err());
        assert!(parse_memory_size("128w").is_err());
        assert!(parse_memory_size("gb").is_err());
        assert!(parse_memory_size("").is_err());
        assert!(parse_memory_size("<various>").is_err());
    }

    #[test]
    fn overflow_is_an_error() {
        assert!(parse_memory_size("99999999999999tb").is_err());
    }

    #[test]
    fn display_uses_largest_exact_unit() {
        assert_eq!(MemorySize::from_gb(16).to_string(), "16gb");
        assert_eq!(parse_memory_size("1536mb").unwrap().to_string(), "1536mb");
        assert_eq!(parse_memory_size("2048gb").unwrap().to_string(), "2tb");
        assert_eq!(MemorySize::ZERO.to_string(), "0b");
    }

    #[test]
    fn from_fractional_gb() {
        assert_eq!(MemorySize::from_gb_f64(1.5).to_string(), "1536mb");
        assert_eq!(MemorySize::from_gb_f64(-3.0), MemorySize::ZERO);
    }
}
