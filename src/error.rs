use alloc::string::String;

use thiserror::Error;
use uefi::Status;

pub type BootResult<T> = Result<T, BootError>;

/// Anything the boot manager reports to the user. None of these end the program except
/// when they occur while locating the manager itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootError {
    #[error("Error: {status:?} {context}")]
    Firmware { status: Status, context: String },

    #[error("Error: path `{0}` cannot be expressed in UCS-2")]
    InvalidPath(String),

    #[error("Error: malformed device path {0}")]
    DevicePath(String),

    #[error("Error: refit.conf line {line}: {reason}")]
    Config { line: usize, reason: String },
}

impl BootError {
    pub fn firmware(status: Status, context: impl Into<String>) -> Self {
        Self::Firmware {
            status,
            context: context.into(),
        }
    }

    /// Status to hand back to the firmware when this error ends the program.
    pub fn status(&self) -> Status {
        match self {
            Self::Firmware { status, .. } => *status,
            Self::InvalidPath(_) => Status::INVALID_PARAMETER,
            Self::DevicePath(_) => Status::LOAD_ERROR,
            Self::Config { .. } => Status::INVALID_PARAMETER,
        }
    }
}
