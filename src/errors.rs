/*!
 * Error types for the csub application.
 *
 * Every failure aborts the run on first occurrence. Each variant maps to a
 * distinct process exit status so scripts can tell a malformed subtitle file
 * from an I/O problem.
 */

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit status used for failures that are not a `ShiftError`
pub const EXIT_GENERIC_FAILURE: u8 = 1;

/// Errors that can occur while configuring or running a time shift
#[derive(Error, Debug)]
pub enum ShiftError {
    /// Invalid configuration or command line usage
    #[error("Configuration error: {0}")]
    Config(String),

    /// Millisecond delta outside the accepted range
    #[error("Millisecond delta {value} out of range (must be -999 .. 999)")]
    DeltaOutOfRange {
        /// The rejected value
        value: i64,
    },

    /// The subtitle source could not be opened
    #[error("Cannot open input {}: {source}", path.display())]
    OpenInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The destination could not be opened or committed
    #[error("Cannot open output {}: {source}", path.display())]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the source failed mid-stream
    #[error("Read failure: {0}")]
    Read(#[source] io::Error),

    /// Writing the output failed mid-stream
    #[error("Write failure: {0}")]
    Write(#[source] io::Error),

    /// A cue index line is not a plain integer
    #[error("Bad formatted file at line {line}: expected cue index, found {content:?}")]
    MalformedIndex {
        /// 1-based line number in the source
        line: usize,
        content: String,
    },

    /// A timing line does not match `H:M:S,ms --> H:M:S,ms`
    #[error("Bad formatted file at line {line}: expected timing line, found {content:?}")]
    MalformedTiming {
        /// 1-based line number in the source
        line: usize,
        content: String,
    },

    /// A shifted timestamp fell below zero under the reject policy
    #[error("Shifted timestamp {timestamp} of cue at line {line} is negative")]
    NegativeTimestamp {
        line: usize,
        timestamp: String,
    },

    /// The in-memory line buffer could not grow
    #[error("Out of memory while buffering output ({lines} lines held)")]
    OutOfMemory {
        lines: usize,
    },
}

impl ShiftError {
    /// True for the two malformed-input variants
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedIndex { .. } | Self::MalformedTiming { .. })
    }

    /// Process exit status for this failure category
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::DeltaOutOfRange { .. } => 16,
            Self::OpenInput { .. } => 41,
            Self::OpenOutput { .. } => 42,
            Self::Read(_) => 43,
            Self::Write(_) => 44,
            Self::OutOfMemory { .. } => 88,
            Self::MalformedIndex { .. } => 91,
            Self::MalformedTiming { .. } => 92,
            Self::NegativeTimestamp { .. } => 93,
        }
    }
}

/// Exit status for an application error, looking through `anyhow` context
pub fn exit_code_for(error: &anyhow::Error) -> u8 {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<ShiftError>())
        .map_or(EXIT_GENERIC_FAILURE, ShiftError::exit_code)
}
