//! FASTQ grammar (four-line records, no wrapping).
//!
//! ```text
//! file     = blank* (record eol blank*)* record?
//! record   = '@' identifier (hspace description)? eol
//!            [A-z]* eol
//!            '+' second_header? eol
//!            [!-~]*
//! ```
//!
//! A non-empty second header must repeat the description byte for byte, and
//! the quality line must be exactly as long as the sequence line.

use crate::error::FormatError;
use crate::fasta;
use crate::machine::{Grammar, ParserState, Step, span};
use crate::record::FastqRecord;

pub(crate) const MARKER: u8 = b'@';
pub(crate) const SECOND_MARKER: u8 = b'+';

#[inline]
fn is_sequence_byte(b: u8) -> bool {
    (b'A'..=b'z').contains(&b)
}

#[inline]
fn is_quality_byte(b: u8) -> bool {
    (b'!'..=b'~').contains(&b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastqState {
    /// Before a header; blank lines are skipped.
    LineStart,
    LineStartCr,
    Identifier,
    Description,
    HeaderCr,
    Sequence,
    SequenceCr,
    Plus,
    /// Inside the second header; `matched` bytes of it agree with the description.
    SecondHeader { matched: usize },
    SecondHeaderCr,
    Quality,
    QualityCr,
    End,
}

pub(crate) struct Fastq;

impl Grammar for Fastq {
    type Record = FastqRecord;
    type State = FastqState;

    const START: FastqState = FastqState::LineStart;

    fn advance(
        st: &mut ParserState<FastqState>,
        input: &[u8],
        record: &mut FastqRecord,
    ) -> Step {
        use FastqState::*;

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
                    fasta::MARKER => return Step::fail(i, FormatError::FastaHeaderDetected),
                    _ => {
                        let expected = char::from(MARKER);
                        return Step::fail(i, FormatError::MissingHeader { expected });
                    }
                },
                LineStartCr | HeaderCr | SequenceCr | SecondHeaderCr => {
                    if input[i] != b'\n' {
                        return Step::fail(i, FormatError::BareCarriageReturn);
                    }
                    st.newline();
                    i += 1;
                    st.state = match st.state {
                        LineStartCr => LineStart,
                        HeaderCr => Sequence,
                        SequenceCr => Plus,
                        _ => Quality,
                    };
                }
                Identifier => {
                    let n = span(&input[i..], |b| !b.is_ascii_whitespace());
                    record.push_identifier(&input[i..i + n]);
                    i += n;
                    if i < input.len() {
                        match input[i] {
                            b'\n' => {
                                st.newline();
                                st.state = Sequence;
                            }
                            b'\r' => st.state = HeaderCr,
                            b => {
                                record.push_description(&[b]);
                                st.state = Description;
                            }
                        }
                        i += 1;
                    }
                }
                Description => {
                    let n = memchr::memchr2(b'\r', b'\n', &input[i..]).unwrap_or(input.len() - i);
                    record.push_description(&input[i..i + n]);
                    i += n;
                    if i < input.len() {
                        if input[i] == b'\n' {
                            st.newline();
                            st.state = Sequence;
                        } else {
                            st.state = HeaderCr;
                        }
                        i += 1;
                    }
                }
                Sequence => {
                    let n = span(&input[i..], is_sequence_byte);
                    record.push_sequence(&input[i..i + n]);
                    i += n;
                    if i < input.len() {
                        match input[i] {
                            b'\n' => {
                                st.newline();
                                st.state = Plus;
                            }
                            b'\r' => st.state = SequenceCr,
                            byte => return Step::fail(i, FormatError::InvalidSequenceByte { byte }),
                        }
                        i += 1;
                    }
                }
                Plus => {
                    if input[i] != SECOND_MARKER {
                        return Step::fail(i, FormatError::MissingPlus);
                    }
                    st.state = SecondHeader { matched: 0 };
                    i += 1;
                }
                SecondHeader { matched } => {
                    let rest = &input[i..];
                    let n = memchr::memchr2(b'\r', b'\n', rest).unwrap_or(rest.len());
                    let description = record.description();
                    let end = matched + n;
                    if end > description.len() || description[matched..end] != rest[..n] {
                        return Step::fail(i, FormatError::SecondHeaderMismatch);
                    }
                    i += n;
                    st.state = SecondHeader { matched: end };
                    if i < input.len() {
                        if end != 0 && end != description.len() {
                            return Step::fail(i, FormatError::SecondHeaderMismatch);
                        }
                        record.set_description_repeated(end != 0);
                        if input[i] == b'\n' {
                            st.newline();
                            st.state = Quality;
                        } else {
                            st.state = SecondHeaderCr;
                        }
                        i += 1;
                    }
                }
                Quality => {
                    let n = span(&input[i..], is_quality_byte);
                    let qual = record.push_quality(&input[i..i + n]);
                    let seq = record.len();
                    if qual > seq {
                        return Step::fail(i, FormatError::LengthMismatch { seq, qual });
                    }
                    i += n;
                    if i < input.len() {
                        match input[i] {
                            b'\n' | b'\r' if qual != seq => {
                                return Step::fail(i, FormatError::LengthMismatch { seq, qual });
                            }
                            b'\n' => {
                                st.newline();
                                st.state = LineStart;
                                return Step::done(i + 1);
                            }
                            b'\r' => st.state = QualityCr,
                            byte => return Step::fail(i, FormatError::InvalidQualityByte { byte }),
                        }
                        i += 1;
                    }
                }
                QualityCr => {
                    if input[i] != b'\n' {
                        return Step::fail(i, FormatError::BareCarriageReturn);
                    }
                    st.newline();
                    st.state = LineStart;
                    return Step::done(i + 1);
                }
                // the transport produced more bytes after reporting EOF
                End => st.state = LineStart,
            }
        }
        Step::more(i)
    }

    fn finish(
        st: &mut ParserState<FastqState>,
        record: &mut FastqRecord,
    ) -> Result<bool, FormatError> {
        use FastqState::*;

        match st.state {
            LineStart | End => {
                st.state = End;
                Ok(false)
            }
            Quality => {
                let qual = record.parsed_quality_len();
                let seq = record.len();
                if qual != seq {
                    return Err(FormatError::LengthMismatch { seq, qual });
                }
                st.state = End;
                Ok(true)
            }
            LineStartCr | HeaderCr | SequenceCr | SecondHeaderCr | QualityCr => {
                Err(FormatError::BareCarriageReturn)
            }
            Identifier | Description | Sequence | Plus | SecondHeader { .. } => {
                Err(FormatError::UnexpectedEof)
            }
        }
    }
}
