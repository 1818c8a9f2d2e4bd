// Sequential little-endian record reader with explicit seeks

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use super::error::{OutError, Result};

/// Fixed-width record decoder over any seekable byte source
///
/// Reads are forward-sequential from the current position. Every read
/// consumes exactly `count * size` bytes or fails with `TruncatedFile`.
pub struct BinaryCursor<R> {
    inner: R,
}

impl<R: Read + Seek> BinaryCursor<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Move to an absolute byte offset
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Move to `back` bytes before the end of the source, returning the new position
    pub fn seek_from_end(&mut self, back: u64) -> Result<u64> {
        let len = self.inner.seek(SeekFrom::End(0))?;
        if len < back {
            return Err(OutError::TruncatedFile(format!(
                "file is {len} bytes, expected at least {back}"
            )));
        }
        self.seek(len - back)?;
        Ok(len - back)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.inner
            .read_i32::<LittleEndian>()
            .map_err(|e| OutError::from_read(e, "int32"))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.inner
            .read_f32::<LittleEndian>()
            .map_err(|e| OutError::from_read(e, "float32"))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.inner
            .read_f64::<LittleEndian>()
            .map_err(|e| OutError::from_read(e, "float64"))
    }

    pub fn read_i32s(&mut self, count: usize) -> Result<Vec<i32>> {
        let mut values = vec![0i32; count];
        self.inner
            .read_i32_into::<LittleEndian>(&mut values)
            .map_err(|e| OutError::from_read(e, format!("{count} int32 records")))?;
        Ok(values)
    }

    pub fn read_f32s(&mut self, count: usize) -> Result<Vec<f32>> {
        let mut values = vec![0f32; count];
        self.inner
            .read_f32_into::<LittleEndian>(&mut values)
            .map_err(|e| OutError::from_read(e, format!("{count} float32 records")))?;
        Ok(values)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; count];
        self.inner
            .read_exact(&mut bytes)
            .map_err(|e| OutError::from_read(e, format!("{count} bytes")))?;
        Ok(bytes)
    }

    /// Read `len` raw bytes as ASCII; non-ASCII bytes become U+FFFD
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        Ok(bytes
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
            .collect())
    }

    /// Read a length-prefixed ID name: int32 length followed by that many bytes
    pub fn read_name(&mut self) -> Result<String> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(OutError::CorruptFile("negative name length"));
        }
        self.read_string(len as usize)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}
