//! `refit.conf`: optional settings next to the manager's executable.
//!
//! ```text
//! # seconds before the first entry boots, 0 to wait forever
//! timeout 5
//! log_level = info
//! legacy = false
//! ```

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use log::LevelFilter;

use crate::error::BootError;

pub const CONFIG_FILE_NAME: &str = "refit.conf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub timeout: u32,
    pub log_level: LevelFilter,
    /// Offer entries for legacy-bootable volumes.
    pub legacy: bool,
    /// Offer tools such as the EFI shell.
    pub tools: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: 20,
            log_level: LevelFilter::Warn,
            legacy: true,
            tools: true,
        }
    }
}

impl Config {
    /// Parse file contents. Rejected lines are returned as errors; every other line still
    /// applies.
    pub fn parse(bytes: &[u8]) -> (Self, Vec<BootError>) {
        let mut config = Self::default();
        let mut errors = Vec::new();
        let text = decode(bytes);

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let content = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();
            if content.is_empty() {
                continue;
            }

            let (key, value) = match content.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => match content.split_once(char::is_whitespace) {
                    Some((key, value)) => (key.trim(), value.trim()),
                    None => (content, ""),
                },
            };

            if let Err(reason) = config.apply(key, value) {
                errors.push(BootError::Config { line, reason });
            }
        }

        (config, errors)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Err(format!("missing value for `{}`", key));
        }
        match key.to_ascii_lowercase().as_str() {
            "timeout" => {
                self.timeout = value
                    .parse()
                    .map_err(|_| format!("invalid timeout `{}`", value))?;
            }
            "log_level" => {
                self.log_level = value
                    .parse()
                    .map_err(|_| format!("invalid log level `{}`", value))?;
            }
            "legacy" => self.legacy = parse_bool(value)?,
            "tools" => self.tools = parse_bool(value)?,
            _ => return Err(format!("unknown key `{}`", key)),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("invalid boolean `{}`", value)),
    }
}

/// Text editors on the firmware shell save UTF-16 with a byte order mark; everything else
/// is taken as UTF-8.
fn decode(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let units = rest
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
        return core::char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }
    String::from_utf8_lossy(bytes).into_owned()
}
