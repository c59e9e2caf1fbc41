//! 48-bit hardware address type shared by the identity table and the codec.

use std::fmt;
use std::str::FromStr;

/// A 48-bit hardware address, stored big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Mac([u8; 6]);

/// Error returned when a MAC token cannot be parsed.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("invalid MAC token: {0:?}")]
pub struct MacParseError(String);

impl Mac {
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for Mac {
    /// Colon-separated uppercase hex, matching the wire format emitted in
    /// HELLO frames: `AA:BB:CC:DD:EE:FF`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl FromStr for Mac {
    type Err = MacParseError;

    /// Parses a colon-separated hex MAC, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 6 {
            return Err(MacParseError(s.to_string()));
        }
        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16).map_err(|_| MacParseError(s.to_string()))?;
        }
        Ok(Mac(bytes))
    }
}

/// Scans `text` for the first colon-separated MAC token (six hex byte groups)
/// and returns it upper-cased, tolerant of surrounding text. Used by the
/// HELLO parser, which accepts any frame containing `MAC:` followed by a
/// token rather than requiring an exact match on the whole frame.
pub fn find_mac_token(text: &str) -> Option<Mac> {
    for token in text.split_whitespace() {
        let candidate = token.trim_matches(|c: char| !c.is_ascii_hexdigit() && c != ':');
        if let Ok(mac) = candidate.parse::<Mac>() {
            return Some(mac);
        }
    }
    None
}
