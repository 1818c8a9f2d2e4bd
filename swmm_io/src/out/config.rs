// Reader configuration

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use memmap2::Mmap;

/// Default read buffer for file-backed access (64 KiB)
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// How the output file's bytes are reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Buffered reads through the file descriptor
    #[default]
    Buffered,
    /// Read-only memory map of the whole file
    Mapped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    pub access: AccessMode,
    pub buffer_capacity: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            access: AccessMode::Buffered,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// Byte source behind an opened output file
pub enum Source {
    Buffered(BufReader<File>),
    Mapped(Cursor<Mmap>),
}

impl Source {
    pub fn open(path: &Path, config: &ReaderConfig) -> io::Result<Self> {
        let file = File::open(path)?;
        match config.access {
            AccessMode::Buffered => Ok(Source::Buffered(BufReader::with_capacity(
                config.buffer_capacity.max(1),
                file,
            ))),
            AccessMode::Mapped => {
                // SAFETY: the map is read-only and output files are not rewritten
                // while a reader holds them.
                let mmap = unsafe { Mmap::map(&file)? };
                Ok(Source::Mapped(Cursor::new(mmap)))
            }
        }
    }
}

impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::Buffered(reader) => reader.read(buf),
            Source::Mapped(cursor) => cursor.read(buf),
        }
    }
}

impl Seek for Source {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Source::Buffered(reader) => reader.seek(pos),
            Source::Mapped(cursor) => cursor.seek(pos),
        }
    }
}
