use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Stream framing errors
    #[error("Unknown format tag: 0x{0:04x}")]
    BadFormat(u16),

    #[error("Truncated stream: header declares {needed} bytes, only {available} available")]
    Truncated { needed: u64, available: usize },

    #[error("Corrupt stream: {0}")]
    Corrupt(&'static str),

    // Encoding errors
    #[error("Output buffer exhausted: capacity {capacity} bytes")]
    Overflow { capacity: usize },

    #[error("Input has no symbols to encode")]
    NoSymbols,

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error was caused by malformed compressed input
    pub fn is_corrupt_input(&self) -> bool {
        matches!(self, Self::BadFormat(_) | Self::Truncated { .. } | Self::Corrupt(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
