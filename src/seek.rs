//! Random access into indexed FASTA.

use crate::error::{FastxError, IndexError, IoContext};
use crate::fasta::{Fasta, MARKER};
use crate::index::RecordKey;
use crate::machine::{self, Grammar};
use crate::reader::FastaReader;

use std::io::{Read, Seek, SeekFrom};
use std::ops::RangeInclusive;

impl<R: Read + Seek> FastaReader<R> {
    /// Position the reader at the header of the record named or numbered by
    /// `key`, so the next `read_record` returns it.
    ///
    /// Line numbers are unknown from here on.
    pub fn seek_record<'k>(&mut self, key: impl Into<RecordKey<'k>>) -> Result<(), FastxError> {
        let index = self.index.as_ref().ok_or(FastxError::MissingIndex)?;
        let ordinal = index.resolve(key)?;
        let offset = index
            .header_offset(ordinal)
            .ok_or(FastxError::OrdinalOutOfBounds {
                ordinal,
                len: index.len(),
            })?;
        log::debug!("seeking to record {ordinal} at byte {offset}");
        self.seek_to(offset)
    }

    /// Raw bytes of positions `range` (1-based, inclusive) of sequence
    /// `name`, read straight from the file without parsing the record.
    ///
    /// Afterwards the reader is positioned at the header of `name`.
    pub fn extract(
        &mut self,
        name: &str,
        range: RangeInclusive<u64>,
    ) -> Result<Vec<u8>, FastxError> {
        let mut out = Vec::new();
        self.extract_into(name, range, &mut out)?;
        Ok(out)
    }

    /// Like [`extract`](Self::extract), reusing `out`'s allocation.
    pub fn extract_into(
        &mut self,
        name: &str,
        range: RangeInclusive<u64>,
        out: &mut Vec<u8>,
    ) -> Result<(), FastxError> {
        out.clear();
        let index = self.index.as_ref().ok_or(FastxError::MissingIndex)?;
        let ordinal = index.resolve(name)?;
        let (entry, header) = match (index.entry(ordinal), index.header_offset(ordinal)) {
            (Some(entry), Some(header)) => (entry, header),
            _ => {
                return Err(FastxError::OrdinalOutOfBounds {
                    ordinal,
                    len: index.len(),
                });
            }
        };
        if range.is_empty() {
            return Ok(());
        }
        let (start, end) = (*range.start(), *range.end());
        if start == 0 || end > entry.length {
            return Err(FastxError::RangeOutOfBounds {
                start,
                end,
                len: entry.length,
            });
        }

        let first = entry.byte_offset(start - 1);
        let span = entry.byte_offset(end - 1) - first + 1;
        let span = usize::try_from(span).map_err(|_| FastxError::RangeOutOfBounds {
            start,
            end,
            len: entry.length,
        })?;
        let column = (start - 1) % entry.line_bases;
        let (line_bases, terminator) = (entry.line_bases, entry.terminator_len());
        log::debug!("extracting {name}:{start}-{end} from {span} bytes at byte {first}");

        out.resize(span, 0);
        let read = self.read_span(first, out);
        // resume sequential iteration at this record whatever happened above
        self.seek_to(header)?;
        read?;

        compact(out, column, line_bases, terminator);
        if out.len() as u64 != end - start + 1
            || memchr::memchr3(b'\n', b'\r', MARKER, out).is_some()
        {
            out.clear();
            return Err(IndexError::LayoutMismatch {
                name: name.to_owned(),
            }
            .into());
        }
        Ok(())
    }

    fn read_span(&mut self, first: u64, out: &mut [u8]) -> Result<(), FastxError> {
        self.rdr
            .seek(SeekFrom::Start(first))
            .map_err(|e| FastxError::io_err(e, self.ctx("seek")))?;
        self.rdr.read_exact(out).map_err(|e| {
            FastxError::io_err(
                e,
                IoContext {
                    op: "extract",
                    byte_pos: first,
                    line_num: None,
                },
            )
        })
    }

    fn seek_to(&mut self, offset: u64) -> Result<(), FastxError> {
        self.rdr
            .seek(SeekFrom::Start(offset))
            .map_err(|e| FastxError::io_err(e, self.ctx("seek")))?;
        self.byte_pos = offset;
        self.state.reset_unknown(Fasta::START);
        self.failed = false;
        Ok(())
    }

    fn ctx(&self, op: &'static str) -> IoContext {
        machine::ctx(op, self.byte_pos, &self.state)
    }
}

/// Drop the line terminators from a span read from disk. `column` is the
/// position of the span's first byte within its line.
fn compact(buf: &mut Vec<u8>, column: u64, line_bases: u64, terminator: u64) {
    let (line_bases, terminator) = (line_bases as usize, terminator as usize);
    let mut take = line_bases - column as usize;
    let (mut read, mut write) = (0, 0);
    while read < buf.len() {
        let n = take.min(buf.len() - read);
        buf.copy_within(read..read + n, write);
        write += n;
        read += n + terminator;
        take = line_bases;
    }
    buf.truncate(write);
}
