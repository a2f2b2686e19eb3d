use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

use crate::error::ScanError;

/// A validated, closed range of TCP ports inside `1..=65535`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    /// Build a range, rejecting port 0 and `start > end`.
    pub fn new(start: u16, end: u16) -> Result<Self, ScanError> {
        if start == 0 || end == 0 {
            return Err(ScanError::InvalidPort(0));
        }
        if start > end {
            return Err(ScanError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    /// Number of ports in the range. Never zero.
    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.start..=self.end).contains(&port)
    }

    pub fn iter(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

impl IntoIterator for PortRange {
    type Item = u16;
    type IntoIter = RangeInclusive<u16>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Parse a `start-end` string (or a single port) into a [`PortRange`].
///
/// Whitespace around either bound is ignored, so `" 20 - 25 "` is accepted.
pub fn parse_port_range(s: &str) -> Result<PortRange, ScanError> {
    match s.split_once('-') {
        Some((a, b)) => PortRange::new(parse_port_str(a.trim())?, parse_port_str(b.trim())?),
        None => {
            let p = parse_port_str(s.trim())?;
            PortRange::new(p, p)
        }
    }
}

/// Parse a single port number, rejecting values outside `1..=65535`.
pub fn parse_port_str(s: &str) -> Result<u16, ScanError> {
    let val: u32 = s
        .parse::<u32>()
        .map_err(|_| ScanError::ParsePort(s.to_string()))?;
    if val == 0 || val > 65535 {
        return Err(ScanError::InvalidPort(val));
    }
    Ok(val as u16)
}
