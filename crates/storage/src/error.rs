use thiserror::Error;

use crate::frame::FrameId;
use crate::page::PageNo;

/// Errors returned by a page directory.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The (file, page) key is already mapped.
    #[error("page {page_no} already has a directory entry")]
    Duplicate { page_no: PageNo },
    /// The (file, page) key has no entry to remove.
    #[error("page {page_no} has no directory entry")]
    Missing { page_no: PageNo },
}

/// Errors returned by the buffer manager.
#[derive(Debug, Error)]
pub enum BufferError {
    /// The page file failed to read, write, allocate or dispose a page.
    #[error("page file io error: {0}")]
    Io(#[from] std::io::Error),
    /// Every frame is pinned or could not be written back.
    #[error("buffer exceeded: no frame available")]
    BufferExceeded,
    /// The page directory rejected an insert or remove.
    #[error("page directory error: {0}")]
    Index(#[from] IndexError),
    /// The page is not resident.
    #[error("page {page_no} not found in buffer")]
    NotFound { page_no: PageNo },
    /// Unpin on a page whose pin count is already zero.
    #[error("page {page_no} is not pinned")]
    NotPinned { page_no: PageNo },
    /// Flush found a page still held by a caller.
    #[error("page {page_no} is pinned")]
    PagePinned { page_no: PageNo },
    /// An invalid frame still references a live file.
    #[error("corrupt frame descriptor at {frame}")]
    CorruptState { frame: FrameId },
    /// Configuration rejected before construction.
    #[error("invalid buffer configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for buffer manager results.
pub type BufferResult<T> = Result<T, BufferError>;
