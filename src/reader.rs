use crate::error::{FastxError, IoContext};
use crate::fasta::{Fasta, FastaState};
use crate::fastq::{Fastq, FastqState};
use crate::index::FaiIndex;
use crate::machine::{self, Grammar, ParserState};
use crate::policy::ReaderOptions;
use crate::record::{FastaRecord, FastqRecord};
use crate::source::Source;

use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

fn open_source(path: &Path) -> Result<Source, FastxError> {
    Source::open(path).map_err(|e| {
        FastxError::io_err(
            e,
            IoContext {
                op: "open",
                byte_pos: 0,
                line_num: None,
            },
        )
    })
}

fn buffered<R: Read>(inner: R, opts: &ReaderOptions) -> BufReader<R> {
    BufReader::with_capacity(opts.buffer_capacity.max(1), inner)
}

/// Streaming FASTA reader.
///
/// `read_record` overwrites a caller-owned record and allocates only when
/// that record needs to grow; the `Iterator` impl returns a fresh record per
/// step.
pub struct FastaReader<R> {
    pub(crate) rdr: BufReader<R>,
    pub(crate) state: ParserState<FastaState>,
    pub(crate) byte_pos: u64,
    pub(crate) index: Option<FaiIndex>,
    /// Set once a read fails; cleared only by a seek.
    pub(crate) failed: bool,
}

impl FastaReader<Source> {
    /// Open from a file path. Auto-detect `.gz` by extension or magic bytes.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FastxError> {
        Ok(Self::new(open_source(path.as_ref())?))
    }

    /// Open `path` together with its `<path>.fai` index.
    pub fn open_indexed<P: AsRef<Path>>(path: P) -> Result<Self, FastxError> {
        let path = path.as_ref();
        let mut fai = PathBuf::from(path).into_os_string();
        fai.push(".fai");
        let index = FaiIndex::from_path(&fai)?;
        Ok(Self::from_path(path)?.with_index(index))
    }
}

impl<R: Read> FastaReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_options(inner, ReaderOptions::default())
    }

    pub fn with_options(inner: R, opts: ReaderOptions) -> Self {
        Self {
            rdr: buffered(inner, &opts),
            state: ParserState::new(Fasta::START),
            byte_pos: 0,
            index: None,
            failed: false,
        }
    }

    /// Attach an index, enabling `seek_record` and `extract`.
    pub fn with_index(mut self, index: FaiIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Replace the attached index, returning the previous one.
    pub fn set_index(&mut self, index: FaiIndex) -> Option<FaiIndex> {
        self.index.replace(index)
    }

    pub fn index(&self) -> Option<&FaiIndex> {
        self.index.as_ref()
    }

    /// Parse the next record into `record`. Returns `Ok(false)` at a clean
    /// end of input. On error the record is left empty and every later call
    /// returns `Ok(false)` without reading, until the next seek.
    pub fn read_record(&mut self, record: &mut FastaRecord) -> Result<bool, FastxError> {
        if self.failed {
            record.clear();
            return Ok(false);
        }
        let res = machine::read_record::<Fasta, R>(
            &mut self.rdr,
            &mut self.byte_pos,
            &mut self.state,
            record,
        );
        if res.is_err() {
            record.clear();
            self.failed = true;
        }
        res
    }

    pub fn parser_state(&self) -> ParserState<FastaState> {
        self.state
    }

    /// Line number of the next unread byte; `None` after a seek.
    pub fn line(&self) -> Option<u64> {
        self.state.line()
    }

    /// Absolute offset of the next unread byte.
    pub fn position(&self) -> u64 {
        self.byte_pos
    }

    pub fn get_ref(&self) -> &R {
        self.rdr.get_ref()
    }

    pub fn into_inner(self) -> R {
        self.rdr.into_inner()
    }
}

impl<R: Read> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord, FastxError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = FastaRecord::new();
        match self.read_record(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

/// Streaming FASTQ reader. Same ownership model as [`FastaReader`].
pub struct FastqReader<R> {
    rdr: BufReader<R>,
    state: ParserState<FastqState>,
    byte_pos: u64,
    failed: bool,
}

impl FastqReader<Source> {
    /// Open from a file path. Auto-detect `.gz` by extension or magic bytes.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FastxError> {
        Ok(Self::new(open_source(path.as_ref())?))
    }
}

impl<R: Read> FastqReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_options(inner, ReaderOptions::default())
    }

    pub fn with_options(inner: R, opts: ReaderOptions) -> Self {
        Self {
            rdr: buffered(inner, &opts),
            state: ParserState::new(Fastq::START),
            byte_pos: 0,
            failed: false,
        }
    }

    /// Parse the next record into `record`. Returns `Ok(false)` at a clean
    /// end of input. On error the record is left empty and every later call
    /// returns `Ok(false)` without reading.
    pub fn read_record(&mut self, record: &mut FastqRecord) -> Result<bool, FastxError> {
        if self.failed {
            record.clear();
            return Ok(false);
        }
        let res = machine::read_record::<Fastq, R>(
            &mut self.rdr,
            &mut self.byte_pos,
            &mut self.state,
            record,
        );
        if res.is_err() {
            record.clear();
            self.failed = true;
        }
        res
    }

    pub fn parser_state(&self) -> ParserState<FastqState> {
        self.state
    }

    pub fn line(&self) -> Option<u64> {
        self.state.line()
    }

    pub fn position(&self) -> u64 {
        self.byte_pos
    }

    pub fn get_ref(&self) -> &R {
        self.rdr.get_ref()
    }

    pub fn into_inner(self) -> R {
        self.rdr.into_inner()
    }
}

impl<R: Read> Iterator for FastqReader<R> {
    type Item = Result<FastqRecord, FastxError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = FastqRecord::new();
        match self.read_record(&mut record) {
            Ok(true) => Some(Ok(record)),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

/// Check that `input` is well-formed FASTA without keeping any records.
pub fn validate_fasta<R: Read>(input: R) -> Result<(), FastxError> {
    let mut rdr = FastaReader::new(input);
    let mut record = FastaRecord::new();
    while rdr.read_record(&mut record)? {}
    Ok(())
}

/// Check that `input` is well-formed FASTQ without keeping any records.
pub fn validate_fastq<R: Read>(input: R) -> Result<(), FastxError> {
    let mut rdr = FastqReader::new(input);
    let mut record = FastqRecord::new();
    while rdr.read_record(&mut record)? {}
    Ok(())
}
