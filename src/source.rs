//! File transports: plain, gzip and (with the `mmap` feature) memory-mapped.

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A readable file. Only plain and memory-mapped files can seek.
pub enum Source {
    Plain(File),
    #[cfg(feature = "mmap")]
    Mmap(io::Cursor<memmap2::Mmap>),
    Gzip(MultiGzDecoder<File>),
}

impl Source {
    /// Open `path`, decompressing if it has a `.gz` extension or gzip magic bytes.
    pub fn open(path: &Path) -> io::Result<Self> {
        let mut f = File::open(path)?;
        let is_gz = has_gz_extension(path) || looks_like_gzip(&mut f).unwrap_or(false);

        if is_gz {
            #[cfg(feature = "gzip")]
            {
                return Ok(Source::Gzip(MultiGzDecoder::new(f)));
            }
            #[cfg(not(feature = "gzip"))]
            {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "gzip input requires the `gzip` feature",
                ));
            }
        }

        #[cfg(feature = "mmap")]
        {
            // SAFETY: the map is read-only; concurrent truncation of the file by
            // another process is outside what this crate can guard against.
            let mmap = unsafe { memmap2::Mmap::map(&f) }?;
            Ok(Source::Mmap(io::Cursor::new(mmap)))
        }
        #[cfg(not(feature = "mmap"))]
        {
            Ok(Source::Plain(f))
        }
    }

    pub fn is_seekable(&self) -> bool {
        !matches!(self, Source::Gzip(_))
    }
}

impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::Plain(f) => f.read(buf),
            #[cfg(feature = "mmap")]
            Source::Mmap(c) => c.read(buf),
            Source::Gzip(d) => d.read(buf),
        }
    }
}

impl Seek for Source {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Source::Plain(f) => f.seek(pos),
            #[cfg(feature = "mmap")]
            Source::Mmap(c) => c.seek(pos),
            Source::Gzip(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "cannot seek in a gzip stream",
            )),
        }
    }
}

/// A writable file, gzip-compressed when created with a `.gz` path.
pub enum Sink {
    Plain(File),
    Gzip(GzEncoder<File>),
}

impl Sink {
    pub fn create(path: &Path) -> io::Result<Self> {
        let f = File::create(path)?;
        if has_gz_extension(path) {
            Ok(Sink::Gzip(GzEncoder::new(f, flate2::Compression::default())))
        } else {
            Ok(Sink::Plain(f))
        }
    }

    /// Write the gzip trailer, if any, and return the file.
    pub fn finish(self) -> io::Result<File> {
        match self {
            Sink::Plain(f) => Ok(f),
            Sink::Gzip(enc) => enc.finish(),
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(f) => f.write(buf),
            Sink::Gzip(enc) => enc.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(f) => f.flush(),
            Sink::Gzip(enc) => enc.flush(),
        }
    }
}

fn has_gz_extension(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("gz")
}

pub(crate) fn looks_like_gzip<R: Read + Seek>(mut r: R) -> io::Result<bool> {
    let mut magic = [0u8; 2];
    let pos = r.stream_position()?;
    let n = r.read(&mut magic)?;
    r.seek(SeekFrom::Start(pos))?;
    Ok(n >= 2 && magic == [0x1F, 0x8B])
}
