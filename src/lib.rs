//! Streaming FASTA/FASTQ reader and writer with FAI-indexed random access.
//!
//! - Plain and `.gz` (auto-detect); optional `mmap` for plain files.
//! - Resumable byte-level parsers: a record may straddle any number of
//!   buffer refills, `\n` and `\r\n` line endings are both accepted, and
//!   errors carry the line number.
//! - Records are one byte buffer plus field lengths; `read_record` reuses a
//!   caller-owned record, iteration hands out fresh ones.
//! - `.fai` parsing, writing and building (`faidx`), record seeking and
//!   sub-sequence extraction without parsing whole records.
//! - PHRED quality encodings with lazy, per-byte validation.
//!
//! ```
//! use fastx_faidx::{FaiIndex, FastaReader, FastaRecord};
//! use std::io::Cursor;
//!
//! let data = b">abc def\nTAGA\nTA\n".to_vec();
//! let index = FaiIndex::faidx(&data[..]).unwrap();
//! let mut reader = FastaReader::new(Cursor::new(data)).with_index(index);
//!
//! assert_eq!(reader.extract("abc", 2..=3).unwrap(), b"AG");
//!
//! let mut record = FastaRecord::new();
//! assert!(reader.read_record(&mut record).unwrap());
//! assert_eq!(record.identifier(), b"abc");
//! assert_eq!(record.sequence(), b"TAGATA");
//! ```

pub mod error;
mod fasta;
mod fastq;
pub mod index;
mod machine;
pub mod policy;
pub mod quality;
pub mod reader;
pub mod record;
mod seek;
pub mod source;
pub mod writer;

pub use crate::error::{
    FastxError, FormatError, IndexError, IoContext, QualityError, RecordError,
};
pub use crate::fasta::FastaState;
pub use crate::fastq::FastqState;
pub use crate::index::{FaiEntry, FaiIndex, RecordKey};
pub use crate::machine::ParserState;
pub use crate::policy::{QualityHeader, ReaderOptions, WriterOptions};
pub use crate::quality::{QualityEncoding, QualityScores};
pub use crate::reader::{FastaReader, FastqReader, validate_fasta, validate_fastq};
pub use crate::record::{FastaRecord, FastqRecord, SequenceEncoder};
pub use crate::source::{Sink, Source};
pub use crate::writer::{FastaWriter, FastqWriter};
