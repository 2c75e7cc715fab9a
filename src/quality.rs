//! PHRED quality score encodings.

use crate::error::QualityError;
use std::iter::FusedIterator;
use std::slice;

/// Mapping between a window of ASCII bytes and PHRED scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QualityEncoding {
    low: u8,
    high: u8,
    offset: u8,
}

impl QualityEncoding {
    pub const SANGER: Self = Self::raw(b'!', b'~', 33);
    pub const SOLEXA: Self = Self::raw(b';', b'~', 64);
    pub const ILLUMINA_13: Self = Self::raw(b'@', b'~', 64);
    pub const ILLUMINA_15: Self = Self::raw(b'B', b'~', 64);
    pub const ILLUMINA_18: Self = Self::raw(b'!', b'~', 33);

    const fn raw(low: u8, high: u8, offset: u8) -> Self {
        Self { low, high, offset }
    }

    /// Custom encoding. Bounds must be printable ASCII with `low <= high`,
    /// and every byte in the window must decode to a score that fits in `i8`.
    pub const fn new(low: u8, high: u8, offset: u8) -> Option<Self> {
        if low > high || low < b'!' || high > b'~' {
            return None;
        }
        let (lowest, highest) = (low as i16 - offset as i16, high as i16 - offset as i16);
        if lowest < i8::MIN as i16 || highest > i8::MAX as i16 {
            return None;
        }
        Some(Self::raw(low, high, offset))
    }

    #[inline]
    pub fn low(self) -> u8 {
        self.low
    }

    #[inline]
    pub fn high(self) -> u8 {
        self.high
    }

    #[inline]
    pub fn offset(self) -> u8 {
        self.offset
    }

    /// Decode one quality byte. The window is checked before subtracting the
    /// offset; construction guarantees the window maps into `i8`.
    #[inline]
    pub fn decode(self, byte: u8) -> Result<i8, QualityError> {
        self.decode_at(byte, 0)
    }

    #[inline]
    fn decode_at(self, byte: u8, position: usize) -> Result<i8, QualityError> {
        if byte < self.low || byte > self.high {
            return Err(QualityError::OutOfRange {
                byte,
                position,
                low: self.low,
                high: self.high,
            });
        }
        Ok((i16::from(byte) - i16::from(self.offset)) as i8)
    }

    /// Encode a score. Scores that do not map into the window are the
    /// caller's problem.
    #[inline]
    pub fn encode(self, score: i8) -> u8 {
        (i16::from(self.offset) + i16::from(score)) as u8
    }

    /// Lazily decode `bytes`.
    pub fn scores(self, bytes: &[u8]) -> QualityScores<'_> {
        QualityScores {
            bytes: bytes.iter(),
            encoding: self,
            position: 0,
        }
    }
}

/// Iterator over decoded quality scores.
///
/// Each byte is validated only when it is reached; an invalid byte yields
/// an error item and iteration continues with the next byte.
#[derive(Debug, Clone)]
pub struct QualityScores<'a> {
    bytes: slice::Iter<'a, u8>,
    encoding: QualityEncoding,
    position: usize,
}

impl Iterator for QualityScores<'_> {
    type Item = Result<i8, QualityError>;

    fn next(&mut self) -> Option<Self::Item> {
        let &byte = self.bytes.next()?;
        let position = self.position;
        self.position += 1;
        Some(self.encoding.decode_at(byte, position))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bytes.size_hint()
    }
}

impl ExactSizeIterator for QualityScores<'_> {}
impl FusedIterator for QualityScores<'_> {}
