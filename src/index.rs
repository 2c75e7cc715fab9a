//! FASTA index (`.fai`) support.
//!
//! Each line of an index holds five tab-separated fields:
//!
//! ```text
//! NAME  LENGTH  OFFSET  LINEBASES  LINEWIDTH
//! ```
//!
//! `OFFSET` is the absolute position of the first sequence byte of the
//! record, `LINEBASES` the number of bases per wrapped line and `LINEWIDTH`
//! that number plus the one- or two-byte line terminator.
//!
//! Entries are kept sorted by offset whatever order they were supplied in,
//! so the header of record `i` can be located from record `i - 1` alone.

use crate::error::{FastxError, FormatError, IndexError, IoContext};
use crate::fasta;
use crate::machine::span;

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

/// A name or 0-based ordinal identifying an index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKey<'a> {
    Name(&'a str),
    Ordinal(usize),
}

impl<'a> From<&'a str> for RecordKey<'a> {
    fn from(name: &'a str) -> Self {
        RecordKey::Name(name)
    }
}

impl<'a> From<&'a String> for RecordKey<'a> {
    fn from(name: &'a String) -> Self {
        RecordKey::Name(name)
    }
}

impl From<usize> for RecordKey<'_> {
    fn from(ordinal: usize) -> Self {
        RecordKey::Ordinal(ordinal)
    }
}

/// One index entry, borrowed from a [`FaiIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaiEntry<'a> {
    pub name: &'a str,
    pub length: u64,
    pub offset: u64,
    pub line_bases: u64,
    pub line_width: u64,
}

impl FaiEntry<'_> {
    /// 1 for `\n`, 2 for `\r\n`.
    #[inline]
    pub fn terminator_len(&self) -> u64 {
        self.line_width - self.line_bases
    }

    /// Number of sequence lines on disk.
    #[inline]
    pub fn line_count(&self) -> u64 {
        if self.length == 0 {
            0
        } else {
            self.length.div_ceil(self.line_bases)
        }
    }

    /// Bytes from `offset` to the end of the last sequence line's terminator.
    /// `offset + footprint()` fits in a `u64` for every entry of a parsed index.
    #[inline]
    pub fn footprint(&self) -> u64 {
        self.length + self.terminator_len() * self.line_count()
    }

    /// Absolute file offset of the 0-based sequence position `pos`.
    #[inline]
    pub fn byte_offset(&self, pos: u64) -> u64 {
        self.offset + (pos / self.line_bases) * self.line_width + pos % self.line_bases
    }
}

/// Name charset: printable ASCII minus space and the punctuation that is
/// reserved in region strings and SAM reference names, which also may not
/// start with `*` or `=`.
pub fn is_valid_name(name: &[u8]) -> bool {
    const RESERVED: &[u8] = b"\\,\"'`()[]{}<>";
    match name.first() {
        None | Some(b'*' | b'=') => false,
        Some(_) => name
            .iter()
            .all(|&b| (b'!'..=b'~').contains(&b) && !RESERVED.contains(&b)),
    }
}

struct Row {
    name: String,
    length: u64,
    offset: u64,
    line_bases: u64,
    line_width: u64,
}

/// In-memory FASTA index: a name map plus parallel arrays sorted by offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaiIndex {
    names: Vec<String>,
    ordinals: HashMap<String, usize>,
    lengths: Vec<u64>,
    offsets: Vec<u64>,
    line_bases: Vec<u64>,
    line_widths: Vec<u64>,
}

impl FaiIndex {
    fn from_rows(mut rows: Vec<Row>) -> Result<Self, IndexError> {
        if !rows.windows(2).all(|w| w[0].offset <= w[1].offset) {
            log::debug!("re-sorting {} index entries by offset", rows.len());
            rows.sort_by_key(|r| r.offset);
        }

        let mut index = Self {
            names: Vec::with_capacity(rows.len()),
            ordinals: HashMap::with_capacity(rows.len()),
            lengths: Vec::with_capacity(rows.len()),
            offsets: Vec::with_capacity(rows.len()),
            line_bases: Vec::with_capacity(rows.len()),
            line_widths: Vec::with_capacity(rows.len()),
        };
        for (ordinal, row) in rows.into_iter().enumerate() {
            if index.ordinals.insert(row.name.clone(), ordinal).is_some() {
                return Err(IndexError::DuplicateName { name: row.name });
            }
            index.names.push(row.name);
            index.lengths.push(row.length);
            index.offsets.push(row.offset);
            index.line_bases.push(row.line_bases);
            index.line_widths.push(row.line_width);
        }
        Ok(index)
    }

    /// Parse index text. Any invalid line fails the whole parse.
    pub fn parse(text: &[u8]) -> Result<Self, IndexError> {
        let mut rows = Vec::new();
        let mut blank_after_entry = None;
        let mut leading_blanks = 0;

        // a final terminator ends the last line rather than starting a new one
        let text = text.strip_suffix(b"\n").unwrap_or(text);
        for (i, line) in text.split(|&b| b == b'\n').enumerate() {
            let line_no = i as u64 + 1;
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.is_empty() {
                if rows.is_empty() {
                    leading_blanks += 1;
                    if leading_blanks > 1 {
                        return Err(IndexError::BlankLine { line: line_no });
                    }
                } else if blank_after_entry.is_none() {
                    blank_after_entry = Some(line_no);
                }
                continue;
            }
            if let Some(line) = blank_after_entry {
                return Err(IndexError::BlankLine { line });
            }
            rows.push(parse_row(line, line_no)?);
        }
        Self::from_rows(rows)
    }

    pub fn from_reader<R: Read>(mut input: R) -> Result<Self, FastxError> {
        let mut text = Vec::new();
        input.read_to_end(&mut text).map_err(|e| {
            FastxError::io_err(
                e,
                IoContext {
                    op: "read index",
                    byte_pos: text.len() as u64,
                    line_num: None,
                },
            )
        })?;
        Ok(Self::parse(&text)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FastxError> {
        let f = File::open(path.as_ref()).map_err(|e| FastxError::io_err(e, open_ctx()))?;
        Self::from_reader(f)
    }

    /// Build an index by scanning FASTA input.
    ///
    /// Stricter than the reader: within a record every sequence line but
    /// the last must have the same length, the header and sequence lines
    /// must share one terminator style, and the name must pass
    /// [`is_valid_name`]. Blank lines may only trail a record.
    pub fn faidx<R: Read>(input: R) -> Result<Self, FastxError> {
        let mut rdr = BufReader::with_capacity(256 * 1024, input);
        let mut line = Vec::with_capacity(256);
        let mut byte_pos = 0u64;
        let mut line_no = 0u64;
        let mut rows = Vec::new();
        let mut current: Option<Pending> = None;

        loop {
            line.clear();
            let n = rdr.read_until(b'\n', &mut line).map_err(|e| {
                FastxError::io_err(
                    e,
                    IoContext {
                        op: "index",
                        byte_pos,
                        line_num: Some(line_no + 1),
                    },
                )
            })?;
            if n == 0 {
                break;
            }
            line_no += 1;
            let line_start = byte_pos;
            byte_pos += n as u64;

            let fmt_err = |source: FormatError, at: usize| {
                FastxError::fmt_err(
                    source,
                    IoContext {
                        op: "index",
                        byte_pos: line_start + at as u64,
                        line_num: Some(line_no),
                    },
                )
            };

            let (content, terminator) = split_terminator(&line);
            if let Some(at) = memchr::memchr(b'\r', content) {
                return Err(fmt_err(FormatError::BareCarriageReturn, at));
            }

            if content.first() == Some(&fasta::MARKER) {
                if terminator == 0 {
                    return Err(fmt_err(FormatError::UnexpectedEof, content.len()));
                }
                if let Some(done) = current.take() {
                    rows.push(done.finish());
                }
                let header = &content[1..];
                let name = &header[..span(header, |b| !b.is_ascii_whitespace())];
                if !is_valid_name(name) {
                    return Err(IndexError::InvalidName {
                        name: String::from_utf8_lossy(name).into_owned(),
                        line: line_no,
                    }
                    .into());
                }
                current = Some(Pending {
                    name: String::from_utf8_lossy(name).into_owned(),
                    offset: byte_pos,
                    length: 0,
                    line_bases: None,
                    terminator,
                    short_line: false,
                });
            } else if let Some(pending) = current.as_mut() {
                if let Some(at) = memchr::memchr(fasta::MARKER, content) {
                    let marker = char::from(fasta::MARKER);
                    return Err(fmt_err(FormatError::MisplacedMarker { marker }, at));
                }
                pending.add_line(content.len() as u64, terminator, line_no)?;
            } else if !content.is_empty() {
                let expected = char::from(fasta::MARKER);
                return Err(fmt_err(FormatError::MissingHeader { expected }, 0));
            }
        }

        if let Some(done) = current.take() {
            rows.push(done.finish());
        }
        log::debug!("indexed {} records over {} bytes", rows.len(), byte_pos);
        Ok(Self::from_rows(rows)?)
    }

    pub fn faidx_path<P: AsRef<Path>>(path: P) -> Result<Self, FastxError> {
        let f = File::open(path.as_ref()).map_err(|e| FastxError::io_err(e, open_ctx()))?;
        Self::faidx(f)
    }

    /// Write index text, one line per entry in offset order.
    pub fn write_to<W: Write>(&self, out: W) -> Result<(), FastxError> {
        let mut out = Counted { inner: out, bytes: 0 };
        for (i, e) in self.iter().enumerate() {
            let byte_pos = out.bytes;
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                e.name, e.length, e.offset, e.line_bases, e.line_width
            )
            .map_err(|err| {
                FastxError::io_err(
                    err,
                    IoContext {
                        op: "write index",
                        byte_pos,
                        line_num: Some(i as u64 + 1),
                    },
                )
            })?;
        }
        Ok(())
    }

    pub fn write_path<P: AsRef<Path>>(&self, path: P) -> Result<(), FastxError> {
        let f = File::create(path.as_ref()).map_err(|e| FastxError::io_err(e, open_ctx()))?;
        let mut out = std::io::BufWriter::new(f);
        self.write_to(&mut out)?;
        out.flush().map_err(|e| FastxError::io_err(e, open_ctx()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.ordinals.get(name).copied()
    }

    pub fn entry(&self, ordinal: usize) -> Option<FaiEntry<'_>> {
        Some(FaiEntry {
            name: self.names.get(ordinal)?,
            length: self.lengths[ordinal],
            offset: self.offsets[ordinal],
            line_bases: self.line_bases[ordinal],
            line_width: self.line_widths[ordinal],
        })
    }

    pub fn get(&self, name: &str) -> Option<FaiEntry<'_>> {
        self.entry(self.ordinal(name)?)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = FaiEntry<'_>> + '_ {
        (0..self.len()).map(move |i| FaiEntry {
            name: &self.names[i],
            length: self.lengths[i],
            offset: self.offsets[i],
            line_bases: self.line_bases[i],
            line_width: self.line_widths[i],
        })
    }

    /// Ordinal for `key`, or an error if it names nothing in this index.
    pub fn resolve<'k>(&self, key: impl Into<RecordKey<'k>>) -> Result<usize, FastxError> {
        match key.into() {
            RecordKey::Name(name) => self
                .ordinal(name)
                .ok_or_else(|| FastxError::UnknownSequence(name.to_owned())),
            RecordKey::Ordinal(ordinal) if ordinal < self.len() => Ok(ordinal),
            RecordKey::Ordinal(ordinal) => Err(FastxError::OrdinalOutOfBounds {
                ordinal,
                len: self.len(),
            }),
        }
    }

    /// Offset of the '>' that starts record `ordinal`: 0 for the first
    /// record, otherwise just past the previous record's sequence lines.
    pub fn header_offset(&self, ordinal: usize) -> Option<u64> {
        match ordinal {
            0 if !self.is_empty() => Some(0),
            0 => None,
            _ => {
                let prev = self.entry(ordinal - 1)?;
                self.entry(ordinal)?;
                Some(prev.offset + prev.footprint())
            }
        }
    }
}

impl fmt::Display for FaiIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in self.iter() {
            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{}",
                e.name, e.length, e.offset, e.line_bases, e.line_width
            )?;
        }
        Ok(())
    }
}

fn open_ctx() -> IoContext {
    IoContext {
        op: "open",
        byte_pos: 0,
        line_num: None,
    }
}

fn parse_row(line: &[u8], line_no: u64) -> Result<Row, IndexError> {
    let mut fields = line.split(|&b| b == b'\t');

    let name = fields.next().unwrap_or_default();
    if !is_valid_name(name) {
        return Err(IndexError::InvalidName {
            name: String::from_utf8_lossy(name).into_owned(),
            line: line_no,
        });
    }
    let length = parse_field(fields.next(), "length", line_no)?;
    let offset = parse_field(fields.next(), "offset", line_no)?;
    let line_bases = parse_field(fields.next(), "linebases", line_no)?;
    let line_width = parse_field(fields.next(), "linewidth", line_no)?;
    if fields.next().is_some() {
        return Err(IndexError::TrailingField { line: line_no });
    }

    if offset == 0 {
        return Err(IndexError::ZeroOffset { line: line_no });
    }
    if line_bases > length {
        return Err(IndexError::LineBasesExceedLength { line: line_no });
    }
    if length > 0 && line_bases == 0 {
        return Err(IndexError::ZeroLineBases { line: line_no });
    }
    if !matches!(line_width.checked_sub(line_bases), Some(1 | 2)) {
        return Err(IndexError::InvalidLineWidth { line: line_no });
    }
    let line_count = if length == 0 {
        0
    } else {
        length.div_ceil(line_bases)
    };
    let end = (line_width - line_bases)
        .checked_mul(line_count)
        .and_then(|terminators| terminators.checked_add(length))
        .and_then(|footprint| footprint.checked_add(offset));
    if end.is_none() {
        return Err(IndexError::OffsetOverflow { line: line_no });
    }

    Ok(Row {
        // the charset check above guarantees ASCII
        name: String::from_utf8_lossy(name).into_owned(),
        length,
        offset,
        line_bases,
        line_width,
    })
}

fn parse_field(field: Option<&[u8]>, name: &'static str, line: u64) -> Result<u64, IndexError> {
    let digits = field.ok_or(IndexError::MissingField { line, field: name })?;
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(IndexError::InvalidNumber { line, field: name });
    }
    digits.iter().try_fold(0u64, |acc, &d| {
        acc.checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(d - b'0')))
            .ok_or(IndexError::Overflow { line, field: name })
    })
}

/// Writer that counts the bytes accepted so far, for error context.
struct Counted<W> {
    inner: W,
    bytes: u64,
}

impl<W: Write> Write for Counted<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Split a line read with `read_until(b'\n')` into content and terminator length.
fn split_terminator(line: &[u8]) -> (&[u8], u64) {
    match line.strip_suffix(b"\n") {
        Some(rest) => match rest.strip_suffix(b"\r") {
            Some(content) => (content, 2),
            None => (rest, 1),
        },
        None => (line, 0),
    }
}

/// A record being indexed.
struct Pending {
    name: String,
    offset: u64,
    length: u64,
    line_bases: Option<u64>,
    /// Terminator length of the header line; every sequence line must match.
    terminator: u64,
    /// Set once a line shorter than `line_bases` (or blank) has been seen.
    short_line: bool,
}

impl Pending {
    fn add_line(&mut self, bases: u64, terminator: u64, line: u64) -> Result<(), IndexError> {
        if terminator != 0 && terminator != self.terminator {
            return Err(IndexError::MixedLineEndings {
                name: self.name.clone(),
                line,
            });
        }
        if bases == 0 {
            self.short_line = true;
            return Ok(());
        }
        if self.short_line {
            return Err(self.non_uniform(line));
        }
        match self.line_bases {
            None => self.line_bases = Some(bases),
            Some(lb) if bases > lb => return Err(self.non_uniform(line)),
            Some(lb) if bases < lb => self.short_line = true,
            Some(_) => {}
        }
        self.length += bases;
        Ok(())
    }

    fn non_uniform(&self, line: u64) -> IndexError {
        IndexError::NonUniformLineLength {
            name: self.name.clone(),
            line,
        }
    }

    fn finish(self) -> Row {
        let line_bases = self.line_bases.unwrap_or(0);
        Row {
            name: self.name,
            length: self.length,
            offset: self.offset,
            line_bases,
            line_width: line_bases + self.terminator,
        }
    }
}
