use crate::error::{FastxError, IoContext};
use crate::fasta;
use crate::fastq;
use crate::policy::{QualityHeader, WriterOptions};
use crate::record::{FastaRecord, FastqRecord};
use crate::source::Sink;

use std::io::{BufWriter, Write};
use std::path::Path;

/// Buffered output that counts bytes for error context.
struct Output<W: Write> {
    w: BufWriter<W>,
    byte_pos: u64,
}

impl<W: Write> Output<W> {
    fn new(inner: W, capacity: usize) -> Self {
        Self {
            w: BufWriter::with_capacity(capacity.max(1), inner),
            byte_pos: 0,
        }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), FastxError> {
        self.w
            .write_all(bytes)
            .map_err(|e| FastxError::io_err(e, self.ctx("write")))?;
        self.byte_pos += bytes.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), FastxError> {
        self.w
            .flush()
            .map_err(|e| FastxError::io_err(e, self.ctx("flush")))
    }

    fn into_inner(self) -> Result<W, FastxError> {
        let ctx = self.ctx("flush");
        self.w
            .into_inner()
            .map_err(|e| FastxError::io_err(e.into_error(), ctx))
    }

    fn ctx(&self, op: &'static str) -> IoContext {
        IoContext {
            op,
            byte_pos: self.byte_pos,
            line_num: None,
        }
    }
}

fn create_sink(path: &Path) -> Result<Sink, FastxError> {
    Sink::create(path).map_err(|e| {
        FastxError::io_err(
            e,
            IoContext {
                op: "create",
                byte_pos: 0,
                line_num: None,
            },
        )
    })
}

fn finish_sink(sink: Sink, byte_pos: u64) -> Result<(), FastxError> {
    sink.finish().map(drop).map_err(|e| {
        FastxError::io_err(
            e,
            IoContext {
                op: "finish",
                byte_pos,
                line_num: None,
            },
        )
    })
}

/// FASTA writer. Output is buffered; call `flush` or `finish`.
pub struct FastaWriter<W: Write> {
    out: Output<W>,
    line_width: usize,
}

impl FastaWriter<Sink> {
    /// Create `path`, gzip-compressed if it ends in `.gz`.
    pub fn create<P: AsRef<Path>>(path: P, opts: WriterOptions) -> Result<Self, FastxError> {
        Ok(Self::with_options(create_sink(path.as_ref())?, opts))
    }

    /// Flush and close the file, writing the gzip trailer if needed.
    pub fn finish(self) -> Result<(), FastxError> {
        let byte_pos = self.out.byte_pos;
        finish_sink(self.into_inner()?, byte_pos)
    }
}

impl<W: Write> FastaWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, WriterOptions::default())
    }

    pub fn with_options(inner: W, opts: WriterOptions) -> Self {
        Self {
            out: Output::new(inner, opts.buffer_capacity),
            line_width: opts.line_width,
        }
    }

    pub fn write_record(&mut self, record: &FastaRecord) -> Result<(), FastxError> {
        self.out.put(&[fasta::MARKER])?;
        self.out.put(record.description())?;
        self.out.put(b"\n")?;

        let seq = record.sequence();
        if seq.is_empty() {
            return Ok(());
        }
        if self.line_width == 0 {
            self.out.put(seq)?;
            return self.out.put(b"\n");
        }
        for line in seq.chunks(self.line_width) {
            self.out.put(line)?;
            self.out.put(b"\n")?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), FastxError> {
        self.out.flush()
    }

    pub fn get_ref(&self) -> &W {
        self.out.w.get_ref()
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, FastxError> {
        self.out.into_inner()
    }
}

/// FASTQ writer. Output is buffered; call `flush` or `finish`.
pub struct FastqWriter<W: Write> {
    out: Output<W>,
    quality_header: QualityHeader,
}

impl FastqWriter<Sink> {
    /// Create `path`, gzip-compressed if it ends in `.gz`.
    pub fn create<P: AsRef<Path>>(path: P, opts: WriterOptions) -> Result<Self, FastxError> {
        Ok(Self::with_options(create_sink(path.as_ref())?, opts))
    }

    /// Flush and close the file, writing the gzip trailer if needed.
    pub fn finish(self) -> Result<(), FastxError> {
        let byte_pos = self.out.byte_pos;
        finish_sink(self.into_inner()?, byte_pos)
    }
}

impl<W: Write> FastqWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, WriterOptions::default())
    }

    pub fn with_options(inner: W, opts: WriterOptions) -> Self {
        Self {
            out: Output::new(inner, opts.buffer_capacity),
            quality_header: opts.quality_header,
        }
    }

    pub fn write_record(&mut self, record: &FastqRecord) -> Result<(), FastxError> {
        let repeat = match self.quality_header {
            QualityHeader::Always => true,
            QualityHeader::Never => false,
            QualityHeader::Source => record.description_repeated(),
        };

        self.out.put(&[fastq::MARKER])?;
        self.out.put(record.description())?;
        self.out.put(b"\n")?;
        self.out.put(record.sequence())?;
        self.out.put(b"\n")?;
        self.out.put(&[fastq::SECOND_MARKER])?;
        if repeat {
            self.out.put(record.description())?;
        }
        self.out.put(b"\n")?;
        self.out.put(record.quality())?;
        self.out.put(b"\n")
    }

    pub fn flush(&mut self) -> Result<(), FastxError> {
        self.out.flush()
    }

    pub fn get_ref(&self) -> &W {
        self.out.w.get_ref()
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, FastxError> {
        self.out.into_inner()
    }
}
