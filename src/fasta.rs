//! FASTA grammar.
//!
//! ```text
//! file     = blank* record*
//! record   = '>' identifier (hspace description)? eol line*
//! line     = [^\r\n>]* eol        (last line of the file may omit eol)
//! eol      = '\r'? '\n'
//! ```
//!
//! A '>' at the start of a line begins the next record; anywhere else in a
//! sequence line it is an error.

use crate::error::FormatError;
use crate::machine::{Grammar, ParserState, Step, span};
use crate::record::FastaRecord;

pub(crate) const MARKER: u8 = b'>';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastaState {
    /// Before a header; blank lines are skipped.
    LineStart,
    LineStartCr,
    Identifier,
    Description,
    HeaderCr,
    /// At the start of a line inside a record.
    SequenceLineStart,
    Sequence,
    SequenceCr,
    End,
}

pub(crate) struct Fasta;

impl Grammar for Fasta {
    type Record = FastaRecord;
    type State = FastaState;

    const START: FastaState = FastaState::LineStart;

    fn advance(
        st: &mut ParserState<FastaState>,
        input: &[u8],
        record: &mut FastaRecord,
    ) -> Step {
        use FastaState::*;

        let mut i = 0;
        while i < input.len() {
            match st.state {
                LineStart => match input[i] {
                    b'\n' => {
                        st.newline();
                        i += 1;
                    }
                    b'\r' => {
                        st.state = LineStartCr;
                        i += 1;
                    }
                    MARKER => {
                        record.clear();
                        st.state = Identifier;
                        i += 1;
                    }
                    _ => {
                        let expected = char::from(MARKER);
                        return Step::fail(i, FormatError::MissingHeader { expected });
                    }
                },
                LineStartCr | HeaderCr | SequenceCr => {
                    if input[i] != b'\n' {
                        return Step::fail(i, FormatError::BareCarriageReturn);
                    }
                    st.newline();
                    i += 1;
                    st.state = match st.state {
                        LineStartCr => LineStart,
                        _ => SequenceLineStart,
                    };
                }
                Identifier => {
                    let n = span(&input[i..], |b| !b.is_ascii_whitespace());
                    record.push_identifier(&input[i..i + n]);
                    i += n;
                    if i < input.len() {
                        i = end_of_header(st, input, i, record);
                    }
                }
                Description => {
                    let n = memchr::memchr2(b'\r', b'\n', &input[i..]).unwrap_or(input.len() - i);
                    record.push_description(&input[i..i + n]);
                    i += n;
                    if i < input.len() {
                        i = end_of_header(st, input, i, record);
                    }
                }
                SequenceLineStart => match input[i] {
                    // next record; the marker is left for LineStart
                    MARKER => {
                        st.state = LineStart;
                        return Step::done(i);
                    }
                    b'\n' => {
                        st.newline();
                        i += 1;
                    }
                    b'\r' => {
                        st.state = SequenceCr;
                        i += 1;
                    }
                    _ => st.state = Sequence,
                },
                Sequence => {
                    let rest = &input[i..];
                    let n = memchr::memchr3(b'\r', b'\n', MARKER, rest).unwrap_or(rest.len());
                    record.push_sequence(&rest[..n]);
                    i += n;
                    if i < input.len() {
                        match input[i] {
                            b'\n' => {
                                st.newline();
                                st.state = SequenceLineStart;
                            }
                            b'\r' => st.state = SequenceCr,
                            _ => {
                                let marker = char::from(MARKER);
                                return Step::fail(i, FormatError::MisplacedMarker { marker });
                            }
                        }
                        i += 1;
                    }
                }
                // the transport produced more bytes after reporting EOF
                End => st.state = LineStart,
            }
        }
        Step::more(i)
    }

    fn finish(
        st: &mut ParserState<FastaState>,
        _record: &mut FastaRecord,
    ) -> Result<bool, FormatError> {
        use FastaState::*;

        match st.state {
            LineStart | End => {
                st.state = End;
                Ok(false)
            }
            SequenceLineStart | Sequence => {
                st.state = End;
                Ok(true)
            }
            LineStartCr | HeaderCr | SequenceCr => Err(FormatError::BareCarriageReturn),
            Identifier | Description => Err(FormatError::UnexpectedEof),
        }
    }
}

/// Handle the whitespace or terminator byte at `input[i]` that ended an
/// identifier or description span. Returns the index after it.
fn end_of_header(
    st: &mut ParserState<FastaState>,
    input: &[u8],
    i: usize,
    record: &mut FastaRecord,
) -> usize {
    match input[i] {
        b'\n' => {
            st.newline();
            st.state = FastaState::SequenceLineStart;
        }
        b'\r' => st.state = FastaState::HeaderCr,
        b => {
            record.push_description(&[b]);
            st.state = FastaState::Description;
        }
    }
    i + 1
}
