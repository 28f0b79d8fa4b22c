//! Fixed-width little-endian vectors backed by memory-mapped files.
//!
//! These hold the aligned lookup structures of an index: the lexicon
//! (`postings.index`), the metadata offset vector (`metadata.index`), the
//! label assignments (`docs.labels`), and the vocabulary inverse. Elements
//! have a fixed byte width, so the `i`th element lives at byte offset
//! `i * WIDTH` and the whole file can be mapped and indexed directly.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{Error, Result};
use crate::ids::{DocId, LabelId, TermId};

/// An element type with a fixed little-endian byte encoding.
pub trait FixedWidth: Copy {
    /// Encoded size in bytes.
    const WIDTH: usize;

    /// Writes the little-endian encoding into `buf` (`WIDTH` bytes).
    fn write_le(self, buf: &mut [u8]);

    /// Decodes from the little-endian bytes in `buf` (`WIDTH` bytes).
    fn read_le(buf: &[u8]) -> Self;
}

impl FixedWidth for u64 {
    const WIDTH: usize = 8;

    fn write_le(self, buf: &mut [u8]) {
        buf.copy_from_slice(&self.to_le_bytes());
    }

    fn read_le(buf: &[u8]) -> Self {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(buf);
        u64::from_le_bytes(bytes)
    }
}

impl FixedWidth for u32 {
    const WIDTH: usize = 4;

    fn write_le(self, buf: &mut [u8]) {
        buf.copy_from_slice(&self.to_le_bytes());
    }

    fn read_le(buf: &[u8]) -> Self {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(buf);
        u32::from_le_bytes(bytes)
    }
}

macro_rules! fixed_width_id {
    ($($t:ty => $repr:ty),*) => {$(
        impl FixedWidth for $t {
            const WIDTH: usize = <$repr>::WIDTH;

            fn write_le(self, buf: &mut [u8]) {
                self.get().write_le(buf)
            }

            fn read_le(buf: &[u8]) -> Self {
                Self::new(<$repr>::read_le(buf))
            }
        }
    )*};
}

fixed_width_id!(TermId => u64, DocId => u64, LabelId => u32);

/// A read-only, memory-mapped vector of fixed-width elements.
///
/// The file is mapped once when the vector is opened and unmapped when it
/// is dropped. Lookups decode directly out of the mapping.
#[derive(Debug)]
pub struct DiskVector<T: FixedWidth> {
    /// `None` only for a zero-length file, which cannot be mapped.
    map: Option<Mmap>,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: FixedWidth> DiskVector<T> {
    /// Opens and maps the vector stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened or mapped, and
    /// [`Error::Corrupt`] if the file length is not a multiple of the
    /// element width.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let byte_len = file.metadata()?.len() as usize;

        if byte_len % T::WIDTH != 0 {
            return Err(Error::Corrupt(format!(
                "{} has length {} which is not a multiple of the element width {}",
                path.display(),
                byte_len,
                T::WIDTH
            )));
        }

        let map = if byte_len == 0 {
            None
        } else {
            Some(unsafe { Mmap::map(&file)? })
        };

        Ok(Self {
            map,
            len: byte_len / T::WIDTH,
            _marker: PhantomData,
        })
    }

    /// The number of elements in the vector.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the element at `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        let map = self.map.as_ref()?;
        let start = index * T::WIDTH;
        Some(T::read_le(&map[start..start + T::WIDTH]))
    }

    /// Iterates over all elements in order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }
}

/// Writes `values` as a fixed-width vector file at `path`, replacing any
/// existing file.
pub fn write_disk_vector<T: FixedWidth>(path: &Path, values: &[T]) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    let mut buf = vec![0u8; T::WIDTH];
    for &value in values {
        value.write_le(&mut buf);
        out.write_all(&buf)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_u64_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offsets.bin");
        let values = vec![0u64, 17, 300, u64::MAX];
        write_disk_vector(&path, &values).unwrap();

        let vector = DiskVector::<u64>::open(&path).unwrap();
        assert_eq!(vector.len(), 4);
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(vector.get(i), Some(v));
        }
        assert_eq!(vector.get(4), None);
        assert_eq!(vector.iter().collect::<Vec<_>>(), values);
    }

    #[test]
    fn round_trips_label_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.bin");
        let values = vec![LabelId::new(0), LabelId::new(3), LabelId::new(2)];
        write_disk_vector(&path, &values).unwrap();

        let vector = DiskVector::<LabelId>::open(&path).unwrap();
        assert_eq!(vector.iter().collect::<Vec<_>>(), values);
    }

    #[test]
    fn ragged_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let err = DiskVector::<u64>::open(&path).unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)));
    }

    #[test]
    fn empty_vector_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        write_disk_vector::<u64>(&path, &[]).unwrap();

        let vector = DiskVector::<u64>::open(&path).unwrap();
        assert!(vector.is_empty());
    }
}
