//! Buffer frame descriptors.

use std::fmt;

use crate::file::{FileId, PageFile};
use crate::page::PageNo;

/// Index of a frame in the buffer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u32);

impl FrameId {
    /// Position of this frame in the pool and descriptor table.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame:{}", self.0)
    }
}

/// Bookkeeping for one frame.
///
/// `file` and `page_no` describe the resident page only while `valid` is set;
/// `clear` drops them together so an invalid frame never names a file.
pub(crate) struct FrameDesc<'a> {
    pub(crate) frame_no: FrameId,
    pub(crate) file: Option<&'a dyn PageFile>,
    pub(crate) page_no: PageNo,
    pub(crate) pin_cnt: u32,
    pub(crate) dirty: bool,
    pub(crate) refbit: bool,
    pub(crate) valid: bool,
}

impl<'a> FrameDesc<'a> {
    pub(crate) fn new(frame_no: FrameId) -> Self {
        Self {
            frame_no,
            file: None,
            page_no: 0,
            pin_cnt: 0,
            dirty: false,
            refbit: false,
            valid: false,
        }
    }

    /// Returns the descriptor to the free state.
    pub(crate) fn clear(&mut self) {
        self.file = None;
        self.page_no = 0;
        self.pin_cnt = 0;
        self.dirty = false;
        self.refbit = false;
        self.valid = false;
    }

    /// Marks the frame as holding `page_no` of `file`, pinned once.
    pub(crate) fn set(&mut self, file: &'a dyn PageFile, page_no: PageNo) {
        self.file = Some(file);
        self.page_no = page_no;
        self.pin_cnt = 1;
        self.dirty = false;
        self.refbit = true;
        self.valid = true;
    }

    pub(crate) fn file_id(&self) -> Option<FileId> {
        self.file.map(FileId::of)
    }

    pub(crate) fn belongs_to(&self, file: FileId) -> bool {
        self.file_id() == Some(file)
    }

    pub(crate) fn info(&self) -> FrameInfo {
        FrameInfo {
            frame_no: self.frame_no,
            page_no: self.valid.then_some(self.page_no),
            pin_cnt: self.pin_cnt,
            dirty: self.dirty,
            valid: self.valid,
        }
    }
}

/// Read-only snapshot of a frame, as reported by `describe_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub frame_no: FrameId,
    /// Resident page, if the frame is valid.
    pub page_no: Option<PageNo>,
    pub pin_cnt: u32,
    pub dirty: bool,
    pub valid: bool,
}

impl fmt::Display for FrameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\tpinCnt: {}", self.frame_no.0, self.pin_cnt)?;
        if let Some(page_no) = self.page_no {
            write!(f, "\tpage: {page_no}")?;
        }
        if self.dirty {
            write!(f, "\tdirty")?;
        }
        if self.valid {
            write!(f, "\tvalid")?;
        }
        Ok(())
    }
}
