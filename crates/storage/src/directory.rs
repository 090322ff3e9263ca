//! Page directory: maps (file, page number) to the frame holding that page.

use crate::error::IndexError;
use crate::file::FileId;
use crate::frame::FrameId;
use crate::page::PageNo;

/// Lookup structure consulted by every buffer manager operation.
pub trait PageDirectory {
    /// Registers `(file, page_no) -> frame`. Fails if the key is present.
    fn insert(&mut self, file: FileId, page_no: PageNo, frame: FrameId) -> Result<(), IndexError>;

    /// Returns the frame holding `(file, page_no)`, if resident.
    fn lookup(&self, file: FileId, page_no: PageNo) -> Option<FrameId>;

    /// Drops the entry for `(file, page_no)`. Fails if the key is absent.
    fn remove(&mut self, file: FileId, page_no: PageNo) -> Result<(), IndexError>;

    /// Returns the number of registered entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    file: FileId,
    page_no: PageNo,
    frame: FrameId,
}

/// Chained hash table with a fixed bucket count.
#[derive(Debug)]
pub struct HashDirectory {
    buckets: Vec<Vec<Entry>>,
    len: usize,
}

impl HashDirectory {
    /// Creates a table with `capacity` buckets (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); capacity.max(1)],
            len: 0,
        }
    }

    /// Returns the number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn bucket(&self, file: FileId, page_no: PageNo) -> usize {
        file.raw().wrapping_add(page_no as usize) % self.buckets.len()
    }
}

impl PageDirectory for HashDirectory {
    fn insert(&mut self, file: FileId, page_no: PageNo, frame: FrameId) -> Result<(), IndexError> {
        let idx = self.bucket(file, page_no);
        let chain = &mut self.buckets[idx];
        if chain
            .iter()
            .any(|entry| entry.file == file && entry.page_no == page_no)
        {
            return Err(IndexError::Duplicate { page_no });
        }
        chain.push(Entry {
            file,
            page_no,
            frame,
        });
        self.len += 1;
        Ok(())
    }

    fn lookup(&self, file: FileId, page_no: PageNo) -> Option<FrameId> {
        self.buckets[self.bucket(file, page_no)]
            .iter()
            .find(|entry| entry.file == file && entry.page_no == page_no)
            .map(|entry| entry.frame)
    }

    fn remove(&mut self, file: FileId, page_no: PageNo) -> Result<(), IndexError> {
        let idx = self.bucket(file, page_no);
        let chain = &mut self.buckets[idx];
        let pos = chain
            .iter()
            .position(|entry| entry.file == file && entry.page_no == page_no)
            .ok_or(IndexError::Missing { page_no })?;
        chain.swap_remove(pos);
        self.len -= 1;
        Ok(())
    }

    fn len(&self) -> usize {
        self.len
    }
}
