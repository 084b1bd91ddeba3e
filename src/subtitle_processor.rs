use std::io::BufRead;
use std::path::Path;
use log::{debug, info};
use crate::errors::ShiftError;
use crate::file_utils::FileManager;
use crate::output_sink::{BufferedSink, DirectSink, LineSink, OutputMode};
use crate::timecode::{CueInterval, NegativeTimePolicy, TimeDelta};

// @module: SRT time-shift engine

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Totals for one completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShiftSummary {
    /// Cues whose index and timing lines were rewritten
    pub cues: usize,
    /// Lines read from the source
    pub lines: usize,
}

// Position of the parser relative to the block structure
enum BlockState {
    // Between blocks: blank lines or a cue index
    AwaitBlock,
    // Index seen, the timing line must come next
    AwaitTiming {
        index: i64,
        line: usize,
        prefix: Vec<u8>,
        ending: Vec<u8>,
    },
    // Copying text lines until the next blank line
    Text,
}

/// Shifts every cue of an SRT stream by a fixed delta
#[derive(Debug, Clone, Copy)]
pub struct TimeShiftEngine {
    delta: TimeDelta,
    policy: NegativeTimePolicy,
}

impl TimeShiftEngine {
    pub fn new(delta: TimeDelta, policy: NegativeTimePolicy) -> Self {
        Self { delta, policy }
    }

    /// Shift `input` (stdin when `None`) into the destination chosen by `mode`
    ///
    /// Direct file output is staged next to the destination (the link target
    /// when it is a symlink) and only renamed into place once the whole stream
    /// succeeded. In-place output is held in memory and written after the
    /// source handle has been dropped.
    pub fn run(&self, input: Option<&Path>, mode: &OutputMode) -> Result<ShiftSummary, ShiftError> {
        match mode {
            OutputMode::Direct(None) => {
                let source = FileManager::open_source(input)?;
                let stdout = std::io::stdout();
                let mut sink = DirectSink::new(stdout.lock());
                let summary = self.shift_stream(source, &mut sink)?;
                sink.flush()?;
                Ok(summary)
            }
            OutputMode::Direct(Some(path)) => {
                let source = FileManager::open_source(input)?;
                let target = FileManager::resolve_destination(path);
                let mut staged = FileManager::stage_output(&target)?;
                let summary = {
                    let mut sink = DirectSink::new(staged.as_file_mut());
                    let summary = self.shift_stream(source, &mut sink)?;
                    sink.flush()?;
                    summary
                };
                FileManager::commit_staged(staged, &target)?;
                Ok(summary)
            }
            OutputMode::InPlace(path) => {
                let mut sink = BufferedSink::new(path);
                let summary = {
                    let source = FileManager::open_source(Some(path.as_path()))?;
                    self.shift_stream(source, &mut sink)?
                };
                sink.flush()?;
                Ok(summary)
            }
        }
    }

    /// Stream lines from `reader` to `sink`, rewriting index and timing lines
    ///
    /// The sink is not flushed; callers decide when output becomes final.
    pub fn shift_stream<R, S>(&self, mut reader: R, sink: &mut S) -> Result<ShiftSummary, ShiftError>
    where
        R: BufRead,
        S: LineSink + ?Sized,
    {
        let mut state = BlockState::AwaitBlock;
        let mut summary = ShiftSummary::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).map_err(ShiftError::Read)?;
            if read == 0 {
                break;
            }
            summary.lines += 1;
            let line_no = summary.lines;
            let (body, ending) = split_line_ending(&buf);

            state = match state {
                BlockState::AwaitBlock => {
                    let (prefix, body) = if line_no == 1 {
                        split_bom(body)
                    } else {
                        (&[][..], body)
                    };
                    if is_blank(body) {
                        sink.emit_line(&buf)?;
                        BlockState::AwaitBlock
                    } else {
                        let index = parse_index(body).ok_or_else(|| ShiftError::MalformedIndex {
                            line: line_no,
                            content: String::from_utf8_lossy(body).into_owned(),
                        })?;
                        BlockState::AwaitTiming {
                            index,
                            line: line_no,
                            prefix: prefix.to_vec(),
                            ending: ending.to_vec(),
                        }
                    }
                }
                BlockState::AwaitTiming { index, prefix, ending: index_ending, .. } => {
                    self.rewrite_cue(index, &prefix, &index_ending, body, ending, line_no, sink)?;
                    summary.cues += 1;
                    BlockState::Text
                }
                BlockState::Text => {
                    sink.emit_line(&buf)?;
                    if is_blank(body) {
                        BlockState::AwaitBlock
                    } else {
                        BlockState::Text
                    }
                }
            };
        }

        if let BlockState::AwaitTiming { line, .. } = state {
            return Err(ShiftError::MalformedTiming {
                line: line + 1,
                content: String::from("<end of input>"),
            });
        }

        debug!("Shifted {} cues over {} lines", summary.cues, summary.lines);
        Ok(summary)
    }

    // Emit the renumbered index line and the shifted timing line together,
    // so a bad timing line leaves no half-written cue behind.
    #[allow(clippy::too_many_arguments)]
    fn rewrite_cue<S: LineSink + ?Sized>(
        &self,
        index: i64,
        prefix: &[u8],
        index_ending: &[u8],
        timing: &[u8],
        timing_ending: &[u8],
        line_no: usize,
        sink: &mut S,
    ) -> Result<(), ShiftError> {
        let malformed = || ShiftError::MalformedTiming {
            line: line_no,
            content: String::from_utf8_lossy(timing).into_owned(),
        };
        let interval = std::str::from_utf8(timing)
            .ok()
            .and_then(CueInterval::parse)
            .ok_or_else(malformed)?;
        let shifted = interval
            .shifted(&self.delta, self.policy)
            .map_err(|ts| ShiftError::NegativeTimestamp {
                line: line_no,
                timestamp: ts.to_string(),
            })?;
        let new_index = index
            .checked_add(self.delta.index_offset())
            .ok_or_else(|| ShiftError::MalformedIndex {
                line: line_no - 1,
                content: index.to_string(),
            })?;

        let mut index_line = prefix.to_vec();
        index_line.extend_from_slice(new_index.to_string().as_bytes());
        index_line.extend_from_slice(index_ending);
        sink.emit_line(&index_line)?;

        let mut timing_line = shifted.to_string().into_bytes();
        timing_line.extend_from_slice(timing_ending);
        sink.emit_line(&timing_line)
    }
}

/// Shift a whole in-memory SRT document
pub fn shift_str(content: &str, delta: &TimeDelta, policy: NegativeTimePolicy) -> Result<String, ShiftError> {
    let engine = TimeShiftEngine::new(*delta, policy);
    let mut sink = DirectSink::new(Vec::new());
    let summary = engine.shift_stream(content.as_bytes(), &mut sink)?;
    info!("Shifted {} cues", summary.cues);
    let bytes = sink.into_inner()?;
    // Only ASCII lines are rewritten, so UTF-8 input stays UTF-8
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// Split a raw line into its body and its `\n` or `\r\n` terminator
fn split_line_ending(line: &[u8]) -> (&[u8], &[u8]) {
    let cut = if line.ends_with(b"\r\n") {
        line.len() - 2
    } else if line.ends_with(b"\n") {
        line.len() - 1
    } else {
        line.len()
    };
    line.split_at(cut)
}

fn split_bom(body: &[u8]) -> (&[u8], &[u8]) {
    if body.starts_with(UTF8_BOM) {
        body.split_at(UTF8_BOM.len())
    } else {
        (&[][..], body)
    }
}

// Same set as C isspace in the "C" locale
fn is_blank(body: &[u8]) -> bool {
    body.iter().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C))
}

// Optional sign followed by digits, surrounded by optional whitespace
fn parse_index(body: &[u8]) -> Option<i64> {
    let text = std::str::from_utf8(body).ok()?.trim();
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
