/*!
 * Line sinks for shifted subtitle output.
 *
 * `DirectSink` streams lines to any writer. `BufferedSink` holds every line
 * in memory and only touches its target path on `flush`, which lets the
 * engine rewrite the very file it is reading from.
 */

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use log::debug;
use crate::errors::ShiftError;
use crate::file_utils::FileManager;

/// Destination for the lines produced by one engine run
pub trait LineSink {
    /// Append one line, terminator included
    fn emit_line(&mut self, line: &[u8]) -> Result<(), ShiftError>;

    /// Push everything emitted so far to the final destination
    fn flush(&mut self) -> Result<(), ShiftError>;

    /// Number of lines accepted by `emit_line`
    fn lines_emitted(&self) -> usize;
}

/// Where the shifted stream goes, fixed once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Write to stdout (`None`) or to a file other than the input
    Direct(Option<PathBuf>),
    /// Buffer everything, then overwrite the input file
    InPlace(PathBuf),
}

impl OutputMode {
    /// Pick the mode for an input/output pair, `None` meaning stdin/stdout
    pub fn select(input: Option<&Path>, output: Option<&Path>) -> Self {
        match (input, output) {
            (_, None) => Self::Direct(None),
            (Some(input), Some(output)) if FileManager::same_file(input, output) => {
                Self::InPlace(input.to_path_buf())
            }
            (_, Some(output)) => Self::Direct(Some(output.to_path_buf())),
        }
    }

    pub fn is_in_place(&self) -> bool {
        matches!(self, Self::InPlace(_))
    }
}

// @struct: Passthrough sink over any writer
pub struct DirectSink<W: Write> {
    writer: BufWriter<W>,
    lines: usize,
}

impl<W: Write> DirectSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            lines: 0,
        }
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W, ShiftError> {
        self.writer
            .into_inner()
            .map_err(|e| ShiftError::Write(e.into_error()))
    }
}

impl<W: Write> LineSink for DirectSink<W> {
    fn emit_line(&mut self, line: &[u8]) -> Result<(), ShiftError> {
        self.writer.write_all(line).map_err(ShiftError::Write)?;
        self.lines += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ShiftError> {
        self.writer.flush().map_err(ShiftError::Write)
    }

    fn lines_emitted(&self) -> usize {
        self.lines
    }
}

// @struct: In-memory sink used for in-place rewrites
#[derive(Debug)]
pub struct BufferedSink {
    target: PathBuf,
    lines: Vec<Vec<u8>>,
    emitted: usize,
}

impl BufferedSink {
    pub fn new<P: AsRef<Path>>(target: P) -> Self {
        Self {
            target: target.as_ref().to_path_buf(),
            lines: Vec::new(),
            emitted: 0,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Lines held so far, in emission order
    pub fn lines(&self) -> &[Vec<u8>] {
        &self.lines
    }
}

impl LineSink for BufferedSink {
    fn emit_line(&mut self, line: &[u8]) -> Result<(), ShiftError> {
        let held = self.lines.len();
        self.lines
            .try_reserve(1)
            .map_err(|_| ShiftError::OutOfMemory { lines: held })?;
        let mut owned = Vec::new();
        owned
            .try_reserve_exact(line.len())
            .map_err(|_| ShiftError::OutOfMemory { lines: held })?;
        owned.extend_from_slice(line);
        self.lines.push(owned);
        self.emitted += 1;
        Ok(())
    }

    /// Truncate the target and write the buffered lines in order
    ///
    /// The caller must have closed every read handle on the target first.
    fn flush(&mut self) -> Result<(), ShiftError> {
        debug!("Rewriting {} in place ({} lines)", self.target.display(), self.lines.len());
        let file = File::create(&self.target).map_err(|source| ShiftError::OpenOutput {
            path: self.target.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        for line in &self.lines {
            writer.write_all(line).map_err(ShiftError::Write)?;
        }
        writer.flush().map_err(ShiftError::Write)?;
        self.lines.clear();
        Ok(())
    }

    fn lines_emitted(&self) -> usize {
        self.emitted
    }
}
