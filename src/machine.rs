//! Shared machinery for the resumable record parsers.
//!
//! A grammar is a state machine that consumes whatever bytes the transport
//! has buffered and may stop at any byte boundary. The driver refills the
//! buffer and feeds the grammar again until it reports a complete record or
//! the transport is exhausted.

use crate::error::{FastxError, FormatError, IoContext};
use std::fmt;
use std::io::{BufRead, BufReader, Read};

/// Automaton state plus line counter, threaded across `read_record` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserState<S> {
    pub(crate) state: S,
    pub(crate) line: Option<u64>,
}

impl<S> ParserState<S> {
    pub(crate) fn new(state: S) -> Self {
        Self {
            state,
            line: Some(1),
        }
    }

    /// Current 1-based line number, or `None` once a seek has happened.
    #[inline]
    pub fn line(&self) -> Option<u64> {
        self.line
    }

    #[inline]
    pub(crate) fn newline(&mut self) {
        if let Some(line) = &mut self.line {
            *line += 1;
        }
    }

    /// Restart at a record boundary with line numbers lost for good.
    pub(crate) fn reset_unknown(&mut self, state: S) {
        self.state = state;
        self.line = None;
    }
}

/// Outcome of feeding one buffered chunk to a grammar.
#[derive(Debug)]
pub(crate) struct Step {
    /// Bytes of the chunk that were consumed.
    pub consumed: usize,
    /// `Ok(true)` once a record is complete, `Ok(false)` if more input is needed.
    pub result: Result<bool, FormatError>,
}

impl Step {
    #[inline]
    pub fn more(consumed: usize) -> Self {
        Self {
            consumed,
            result: Ok(false),
        }
    }

    #[inline]
    pub fn done(consumed: usize) -> Self {
        Self {
            consumed,
            result: Ok(true),
        }
    }

    #[inline]
    pub fn fail(consumed: usize, err: FormatError) -> Self {
        Self {
            consumed,
            result: Err(err),
        }
    }
}

pub(crate) trait Grammar {
    type Record;
    type State: Copy + Eq + fmt::Debug;

    const START: Self::State;

    /// Consume a prefix of `input`, appending recognized fields to `record`.
    /// Never looks back at bytes consumed by earlier calls.
    fn advance(
        state: &mut ParserState<Self::State>,
        input: &[u8],
        record: &mut Self::Record,
    ) -> Step;

    /// Called when the transport is exhausted. `Ok(true)` completes a
    /// pending record, `Ok(false)` is a clean end of input.
    fn finish(
        state: &mut ParserState<Self::State>,
        record: &mut Self::Record,
    ) -> Result<bool, FormatError>;
}

/// Drive grammar `G` over `rdr` until one record is recognized.
///
/// `byte_pos` tracks the absolute stream offset of the next unread byte.
pub(crate) fn read_record<G: Grammar, R: Read>(
    rdr: &mut BufReader<R>,
    byte_pos: &mut u64,
    state: &mut ParserState<G::State>,
    record: &mut G::Record,
) -> Result<bool, FastxError> {
    loop {
        let chunk = match rdr.fill_buf() {
            Ok(chunk) => chunk,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FastxError::io_err(e, ctx("read", *byte_pos, state))),
        };
        if chunk.is_empty() {
            return G::finish(state, record)
                .map_err(|e| FastxError::fmt_err(e, ctx("read", *byte_pos, state)));
        }
        log::trace!("parsing {} buffered bytes at byte {}", chunk.len(), byte_pos);

        let step = G::advance(state, chunk, record);
        rdr.consume(step.consumed);
        *byte_pos += step.consumed as u64;
        match step.result {
            Ok(true) => return Ok(true),
            Ok(false) => {}
            Err(e) => return Err(FastxError::fmt_err(e, ctx("read", *byte_pos, state))),
        }
    }
}

#[inline]
pub(crate) fn ctx<S>(op: &'static str, byte_pos: u64, state: &ParserState<S>) -> IoContext {
    IoContext {
        op,
        byte_pos,
        line_num: state.line,
    }
}

/// Length of the run at the start of `input` made of bytes accepted by `keep`.
#[inline]
pub(crate) fn span(input: &[u8], keep: impl Fn(u8) -> bool) -> usize {
    input.iter().position(|&b| !keep(b)).unwrap_or(input.len())
}
