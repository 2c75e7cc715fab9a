/// How the second header line of a FASTQ record is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityHeader {
    /// Always repeat the description after '+'.
    Always,
    /// Always write a bare '+'.
    Never,
    /// Mirror whatever the record carried when it was parsed.
    Source,
}

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Capacity of the internal read buffer, in bytes.
    pub buffer_capacity: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: 256 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// FASTA sequence wrap width; 0 writes each sequence on a single line.
    pub line_width: usize,
    pub quality_header: QualityHeader,
    /// Capacity of the internal write buffer, in bytes.
    pub buffer_capacity: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            line_width: 70,
            quality_header: QualityHeader::Source,
            buffer_capacity: 256 * 1024,
        }
    }
}
