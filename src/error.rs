use std::fmt;
use std::io;
use thiserror::Error;

/// Where an I/O or format error happened.
///
/// `line_num` is `None` once the reader has seeked: line numbers cannot be
/// recovered without rescanning from the start of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoContext {
    pub op: &'static str,
    pub byte_pos: u64,
    pub line_num: Option<u64>,
}

impl fmt::Display for IoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_num {
            Some(line) => write!(f, "{} at line {}, byte {}", self.op, line, self.byte_pos),
            None => write!(f, "{} at unknown line, byte {}", self.op, self.byte_pos),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("expected header '{expected}' at start of record")]
    MissingHeader { expected: char },
    #[error("found FASTA header '>' where FASTQ '@' expected")]
    FastaHeaderDetected,
    #[error("missing '+' separator line")]
    MissingPlus,
    #[error("unexpected EOF inside record")]
    UnexpectedEof,
    #[error("'\\r' not followed by '\\n'")]
    BareCarriageReturn,
    #[error("record marker '{marker}' in the middle of a sequence line")]
    MisplacedMarker { marker: char },
    #[error("invalid sequence byte 0x{byte:02x}")]
    InvalidSequenceByte { byte: u8 },
    #[error("invalid quality byte 0x{byte:02x}")]
    InvalidQualityByte { byte: u8 },
    #[error("second header does not repeat the record description")]
    SecondHeaderMismatch,
    #[error("quality length ({qual}) does not match sequence length ({seq})")]
    LengthMismatch { seq: usize, qual: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("line {line}: invalid sequence name {name:?}")]
    InvalidName { name: String, line: u64 },
    #[error("line {line}: missing {field} field")]
    MissingField { line: u64, field: &'static str },
    #[error("line {line}: unexpected field after linewidth")]
    TrailingField { line: u64 },
    #[error("line {line}: {field} is not a non-negative decimal integer")]
    InvalidNumber { line: u64, field: &'static str },
    #[error("line {line}: {field} overflows")]
    Overflow { line: u64, field: &'static str },
    #[error("line {line}: offset must be at least 1")]
    ZeroOffset { line: u64 },
    #[error("line {line}: linebases exceeds length")]
    LineBasesExceedLength { line: u64 },
    #[error("line {line}: linebases is zero for a non-empty sequence")]
    ZeroLineBases { line: u64 },
    #[error("line {line}: linewidth must be linebases + 1 or linebases + 2")]
    InvalidLineWidth { line: u64 },
    #[error("line {line}: record extends past the largest representable file offset")]
    OffsetOverflow { line: u64 },
    #[error("line {line}: blank line between index entries")]
    BlankLine { line: u64 },
    #[error("duplicate sequence name {name:?}")]
    DuplicateName { name: String },
    #[error("line {line}: sequence lines of {name:?} have different lengths")]
    NonUniformLineLength { name: String, line: u64 },
    #[error("line {line}: {name:?} mixes '\\n' and '\\r\\n' line endings")]
    MixedLineEndings { name: String, line: u64 },
    #[error("file layout of {name:?} disagrees with its index entry")]
    LayoutMismatch { name: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QualityError {
    #[error("quality byte 0x{byte:02x} at position {position} outside [{low}, {high}]")]
    OutOfRange {
        byte: u8,
        position: usize,
        low: u8,
        high: u8,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("{field} contains a line break")]
    LineBreak { field: &'static str },
    #[error("quality length ({qual}) does not match sequence length ({seq})")]
    LengthMismatch { seq: usize, qual: usize },
}

#[derive(Debug, Error)]
pub enum FastxError {
    #[error("I/O error ({ctx}): {source}")]
    Io {
        #[source]
        source: io::Error,
        ctx: IoContext,
    },
    #[error("format error ({ctx}): {source}")]
    Format {
        #[source]
        source: FormatError,
        ctx: IoContext,
    },
    #[error("index error: {0}")]
    Index(#[from] IndexError),
    #[error("quality error: {0}")]
    Quality(#[from] QualityError),
    #[error("invalid record: {0}")]
    Record(#[from] RecordError),
    #[error("range {start}..{end} out of bounds for length {len}")]
    RangeOutOfBounds { start: u64, end: u64, len: u64 },
    #[error("record ordinal {ordinal} out of bounds for index of {len} records")]
    OrdinalOutOfBounds { ordinal: usize, len: usize },
    #[error("sequence {0:?} not found in index")]
    UnknownSequence(String),
    #[error("reader has no index")]
    MissingIndex,
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("sequence encoding failed: {0}")]
    Encode(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FastxError {
    pub(crate) fn io_err(source: io::Error, ctx: IoContext) -> Self {
        Self::Io { source, ctx }
    }
    pub(crate) fn fmt_err(source: FormatError, ctx: IoContext) -> Self {
        Self::Format { source, ctx }
    }

    /// Line number attached to an I/O or format error, if known.
    pub fn line(&self) -> Option<u64> {
        match self {
            Self::Io { ctx, .. } | Self::Format { ctx, .. } => ctx.line_num,
            _ => None,
        }
    }
}
