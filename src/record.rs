//! Sequence records stored as one byte buffer plus field lengths.
//!
//! The buffer holds the description (header line without marker and line
//! terminator), then the sequence with terminators removed, then, for FASTQ,
//! the raw quality bytes. Accessors return views into that buffer; a view is
//! invalidated by the next parse into the same record.

use crate::error::{FastxError, RecordError};
use crate::quality::{QualityEncoding, QualityScores};
use std::hash::{Hash, Hasher};
use std::ops::{Bound, Range, RangeBounds};

/// Converts raw sequence bytes into a typed biological sequence.
pub trait SequenceEncoder {
    type Output;
    type Error: std::error::Error + Send + Sync + 'static;

    fn encode(&self, bytes: &[u8]) -> Result<Self::Output, Self::Error>;
}

/// Length of the identifier prefix of a description.
fn identifier_len(description: &[u8]) -> usize {
    description
        .iter()
        .position(u8::is_ascii_whitespace)
        .unwrap_or(description.len())
}

fn check_line(bytes: &[u8], field: &'static str) -> Result<(), RecordError> {
    if memchr::memchr2(b'\r', b'\n', bytes).is_some() {
        return Err(RecordError::LineBreak { field });
    }
    Ok(())
}

/// Resolve `range` against a field of length `len`.
fn resolve<B: RangeBounds<usize>>(range: B, len: usize) -> Result<Range<usize>, FastxError> {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };
    if start > end || end > len {
        return Err(FastxError::RangeOutOfBounds {
            start: start as u64,
            end: end as u64,
            len: len as u64,
        });
    }
    Ok(start..end)
}

fn encode_with<E: SequenceEncoder>(encoder: &E, bytes: &[u8]) -> Result<E::Output, FastxError> {
    encoder
        .encode(bytes)
        .map_err(|e| FastxError::Encode(Box::new(e)))
}

/// A FASTA record.
#[derive(Debug, Clone, Default)]
pub struct FastaRecord {
    data: Vec<u8>,
    identifier_len: usize,
    description_len: usize,
    sequence_len: usize,
}

impl FastaRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a description (header line without '>') and a
    /// sequence. Neither may contain line breaks.
    pub fn from_parts(
        description: impl AsRef<[u8]>,
        sequence: impl AsRef<[u8]>,
    ) -> Result<Self, RecordError> {
        let (description, sequence) = (description.as_ref(), sequence.as_ref());
        check_line(description, "description")?;
        check_line(sequence, "sequence")?;
        let mut data = Vec::with_capacity(description.len() + sequence.len());
        data.extend_from_slice(description);
        data.extend_from_slice(sequence);
        Ok(Self {
            data,
            identifier_len: identifier_len(description),
            description_len: description.len(),
            sequence_len: sequence.len(),
        })
    }

    #[inline]
    pub fn identifier(&self) -> &[u8] {
        &self.data[..self.identifier_len]
    }

    #[inline]
    pub fn description(&self) -> &[u8] {
        &self.data[..self.description_len]
    }

    #[inline]
    pub fn sequence(&self) -> &[u8] {
        &self.data[self.description_len..self.description_len + self.sequence_len]
    }

    pub fn sequence_range<B: RangeBounds<usize>>(&self, range: B) -> Result<&[u8], FastxError> {
        let seq = self.sequence();
        Ok(&seq[resolve(range, seq.len())?])
    }

    pub fn sequence_string<B: RangeBounds<usize>>(&self, range: B) -> Result<String, FastxError> {
        Ok(std::str::from_utf8(self.sequence_range(range)?)?.to_owned())
    }

    pub fn encode_sequence<E, B>(&self, encoder: &E, range: B) -> Result<E::Output, FastxError>
    where
        E: SequenceEncoder,
        B: RangeBounds<usize>,
    {
        encode_with(encoder, self.sequence_range(range)?)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequence_len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence_len == 0
    }

    /// Empty the record, keeping its allocation.
    pub fn clear(&mut self) {
        self.data.clear();
        self.identifier_len = 0;
        self.description_len = 0;
        self.sequence_len = 0;
    }

    pub(crate) fn push_identifier(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        self.identifier_len += bytes.len();
        self.description_len += bytes.len();
    }

    pub(crate) fn push_description(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        self.description_len += bytes.len();
    }

    pub(crate) fn push_sequence(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        self.sequence_len += bytes.len();
    }
}

impl PartialEq for FastaRecord {
    fn eq(&self, other: &Self) -> bool {
        self.description() == other.description() && self.sequence() == other.sequence()
    }
}

impl Eq for FastaRecord {}

impl Hash for FastaRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.description().hash(state);
        self.sequence().hash(state);
    }
}

/// A FASTQ record.
///
/// Sequence and quality always have the same length.
#[derive(Debug, Clone, Default)]
pub struct FastqRecord {
    data: Vec<u8>,
    identifier_len: usize,
    description_len: usize,
    sequence_len: usize,
    description_repeated: bool,
}

impl FastqRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a description (header line without '@'), a
    /// sequence and raw ASCII quality bytes of the same length.
    pub fn from_parts(
        description: impl AsRef<[u8]>,
        sequence: impl AsRef<[u8]>,
        quality: impl AsRef<[u8]>,
    ) -> Result<Self, RecordError> {
        let (description, sequence, quality) =
            (description.as_ref(), sequence.as_ref(), quality.as_ref());
        check_line(description, "description")?;
        check_line(sequence, "sequence")?;
        check_line(quality, "quality")?;
        if sequence.len() != quality.len() {
            return Err(RecordError::LengthMismatch {
                seq: sequence.len(),
                qual: quality.len(),
            });
        }
        let mut data = Vec::with_capacity(description.len() + 2 * sequence.len());
        data.extend_from_slice(description);
        data.extend_from_slice(sequence);
        data.extend_from_slice(quality);
        Ok(Self {
            data,
            identifier_len: identifier_len(description),
            description_len: description.len(),
            sequence_len: sequence.len(),
            description_repeated: false,
        })
    }

    /// Build a record from numeric PHRED scores, encoding them first.
    pub fn with_scores(
        description: impl AsRef<[u8]>,
        sequence: impl AsRef<[u8]>,
        scores: &[i8],
        encoding: QualityEncoding,
    ) -> Result<Self, RecordError> {
        let quality: Vec<u8> = scores.iter().map(|&s| encoding.encode(s)).collect();
        Self::from_parts(description, sequence, quality)
    }

    #[inline]
    pub fn identifier(&self) -> &[u8] {
        &self.data[..self.identifier_len]
    }

    #[inline]
    pub fn description(&self) -> &[u8] {
        &self.data[..self.description_len]
    }

    #[inline]
    pub fn sequence(&self) -> &[u8] {
        &self.data[self.description_len..self.description_len + self.sequence_len]
    }

    /// Raw ASCII quality bytes.
    #[inline]
    pub fn quality(&self) -> &[u8] {
        let start = self.description_len + self.sequence_len;
        &self.data[start..start + self.sequence_len]
    }

    /// Whether the parsed '+' line repeated the description.
    #[inline]
    pub fn description_repeated(&self) -> bool {
        self.description_repeated
    }

    pub fn sequence_range<B: RangeBounds<usize>>(&self, range: B) -> Result<&[u8], FastxError> {
        let seq = self.sequence();
        Ok(&seq[resolve(range, seq.len())?])
    }

    pub fn sequence_string<B: RangeBounds<usize>>(&self, range: B) -> Result<String, FastxError> {
        Ok(std::str::from_utf8(self.sequence_range(range)?)?.to_owned())
    }

    pub fn encode_sequence<E, B>(&self, encoder: &E, range: B) -> Result<E::Output, FastxError>
    where
        E: SequenceEncoder,
        B: RangeBounds<usize>,
    {
        encode_with(encoder, self.sequence_range(range)?)
    }

    pub fn quality_range<B: RangeBounds<usize>>(&self, range: B) -> Result<&[u8], FastxError> {
        let qual = self.quality();
        Ok(&qual[resolve(range, qual.len())?])
    }

    pub fn quality_string<B: RangeBounds<usize>>(&self, range: B) -> Result<String, FastxError> {
        Ok(std::str::from_utf8(self.quality_range(range)?)?.to_owned())
    }

    /// Lazily decoded PHRED scores of the quality bytes in `range`.
    pub fn quality_scores<B: RangeBounds<usize>>(
        &self,
        encoding: QualityEncoding,
        range: B,
    ) -> Result<QualityScores<'_>, FastxError> {
        Ok(encoding.scores(self.quality_range(range)?))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequence_len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence_len == 0
    }

    /// Empty the record, keeping its allocation.
    pub fn clear(&mut self) {
        self.data.clear();
        self.identifier_len = 0;
        self.description_len = 0;
        self.sequence_len = 0;
        self.description_repeated = false;
    }

    pub(crate) fn push_identifier(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        self.identifier_len += bytes.len();
        self.description_len += bytes.len();
    }

    pub(crate) fn push_description(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        self.description_len += bytes.len();
    }

    pub(crate) fn push_sequence(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        self.sequence_len += bytes.len();
    }

    /// Append quality bytes; returns the quality length so far. Only valid
    /// once the sequence is complete.
    pub(crate) fn push_quality(&mut self, bytes: &[u8]) -> usize {
        self.data.extend_from_slice(bytes);
        self.parsed_quality_len()
    }

    /// Quality bytes appended so far by the parser.
    pub(crate) fn parsed_quality_len(&self) -> usize {
        self.data.len() - self.description_len - self.sequence_len
    }

    pub(crate) fn set_description_repeated(&mut self, repeated: bool) {
        self.description_repeated = repeated;
    }
}

impl PartialEq for FastqRecord {
    fn eq(&self, other: &Self) -> bool {
        self.description() == other.description()
            && self.sequence() == other.sequence()
            && self.quality() == other.quality()
    }
}

impl Eq for FastqRecord {}

impl Hash for FastqRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.description().hash(state);
        self.sequence().hash(state);
        self.quality().hash(state);
    }
}
