/*!
 * # csub - SRT subtitle synchronisation
 *
 * A Rust library and command line tool that shifts every timestamp of an
 * SRT subtitle file by a fixed signed delta.
 *
 * ## Features
 *
 * - Shift by hours, minutes, seconds and milliseconds with carry and borrow
 * - Renumber cues by a fixed offset
 * - Stream from stdin to stdout, or between files
 * - Rewrite a file in place when input and output are the same file
 * - Configurable handling of timestamps shifted below zero
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `timecode`: Deltas, timestamps and the shift arithmetic
 * - `subtitle_processor`: The streaming time-shift engine
 * - `output_sink`: Direct and buffered output sinks
 * - `file_utils`: File system operations
 * - `app_config`: Configuration management
 * - `errors`: Error taxonomy and exit codes
 *
 * ## License
 *
 * This project is licensed under the GNU GPL v3 or later
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod file_utils;
pub mod output_sink;
pub mod subtitle_processor;
pub mod timecode;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::ShiftError;
pub use output_sink::{BufferedSink, DirectSink, LineSink, OutputMode};
pub use subtitle_processor::{shift_str, ShiftSummary, TimeShiftEngine};
pub use timecode::{CueInterval, NegativeTimePolicy, TimeDelta, Timestamp};
