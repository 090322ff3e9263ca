//! Page files: the collaborator the buffer manager reads from and writes to.
//!
//! `DiskFile` layout:
//! - Page 0 is a reserved header: `next_page` as u32 LE (bytes 0..4) and
//!   `free_head` as u32 LE (bytes 4..8, 0 = empty free list)
//! - A disposed page is linked into the free list through its first 4 bytes
//! - Allocation reuses the free list head before extending the file
//! - The header is persisted and synced on every allocation and dispose

use std::fs::{File, OpenOptions};
use std::io::{Error, ErrorKind, Result};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::page::{PAGE_SIZE, Page, PageNo};

const HEADER_PAGE: PageNo = 0;
const FREE_LINK_SIZE: usize = 4;

/// A file of fixed-size pages addressed by page number.
///
/// Methods take `&self` so the buffer manager can hold plain shared borrows
/// of every file it caches pages for.
pub trait PageFile {
    /// Reads page `page_no` into `page`.
    fn read_page(&self, page_no: PageNo, page: &mut Page) -> Result<()>;

    /// Writes `page` to page `page_no`.
    fn write_page(&self, page_no: PageNo, page: &Page) -> Result<()>;

    /// Allocates a fresh page and returns its number.
    fn allocate_page(&self) -> Result<PageNo>;

    /// Returns page `page_no` to the file's free space.
    fn dispose_page(&self, page_no: PageNo) -> Result<()>;
}

/// Identity of a page file: the address of the borrowed handle.
///
/// Zero-sized `PageFile` types have no distinct addresses and must not be
/// cached side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(usize);

impl FileId {
    pub fn of(file: &dyn PageFile) -> Self {
        Self(file as *const dyn PageFile as *const () as usize)
    }

    pub(crate) fn raw(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Header {
    next_page: PageNo,
    free_head: PageNo,
}

impl Header {
    fn to_bytes(self) -> [u8; PAGE_SIZE] {
        let mut buf = [0u8; PAGE_SIZE];
        buf[..4].copy_from_slice(&self.next_page.to_le_bytes());
        buf[4..8].copy_from_slice(&self.free_head.to_le_bytes());
        buf
    }

    fn from_bytes(buf: &[u8]) -> Self {
        let mut next = [0u8; 4];
        let mut free = [0u8; 4];
        next.copy_from_slice(&buf[..4]);
        free.copy_from_slice(&buf[4..8]);
        Self {
            next_page: PageNo::from_le_bytes(next),
            free_head: PageNo::from_le_bytes(free),
        }
    }
}

/// Page file backed by a regular OS file using positional I/O.
pub struct DiskFile {
    file: File,
    header: Mutex<Header>,
    path: PathBuf,
}

impl DiskFile {
    /// Opens or creates the file; loads or initializes a valid header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        let header = Self::load_or_init_header(&file)?;
        Ok(DiskFile {
            file,
            header: Mutex::new(header),
            path: path.as_ref().to_path_buf(),
        })
    }

    fn load_or_init_header(file: &File) -> Result<Header> {
        let meta = file.metadata()?;
        if meta.len() < PAGE_SIZE as u64 {
            let header = Header {
                next_page: 1,
                free_head: 0,
            };
            file.write_all_at(&header.to_bytes(), 0)?;
            Ok(header)
        } else {
            let mut buf = [0u8; PAGE_SIZE];
            file.read_exact_at(&mut buf, 0)?;
            Ok(Header::from_bytes(&buf))
        }
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Page number the next extension of the file would hand out.
    pub fn next_page_no(&self) -> PageNo {
        self.header.lock().next_page
    }

    /// Forces buffered data to disk.
    pub fn sync_data(&self) -> Result<()> {
        self.file.sync_data()
    }

    fn offset(page_no: PageNo) -> u64 {
        u64::from(page_no) * PAGE_SIZE as u64
    }

    fn check_range(header: &Header, page_no: PageNo) -> Result<()> {
        if page_no == HEADER_PAGE || page_no >= header.next_page {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("page {page_no} out of range"),
            ));
        }
        Ok(())
    }

    fn persist_header(&self, header: &Header) -> Result<()> {
        self.file.write_all_at(&header.to_bytes(), 0)
    }
}

impl PageFile for DiskFile {
    fn read_page(&self, page_no: PageNo, page: &mut Page) -> Result<()> {
        Self::check_range(&self.header.lock(), page_no)?;
        self.file
            .read_exact_at(page.data_mut(), Self::offset(page_no))
    }

    fn write_page(&self, page_no: PageNo, page: &Page) -> Result<()> {
        Self::check_range(&self.header.lock(), page_no)?;
        self.file.write_all_at(page.data(), Self::offset(page_no))
    }

    fn allocate_page(&self) -> Result<PageNo> {
        let mut header = self.header.lock();
        let zero_buf = [0u8; PAGE_SIZE];
        let page_no = if header.free_head != 0 {
            let page_no = header.free_head;
            let mut link = [0u8; FREE_LINK_SIZE];
            self.file.read_exact_at(&mut link, Self::offset(page_no))?;
            self.file.write_all_at(&zero_buf, Self::offset(page_no))?;
            header.free_head = PageNo::from_le_bytes(link);
            page_no
        } else {
            let page_no = header.next_page;
            let next_page = page_no
                .checked_add(1)
                .ok_or_else(|| Error::other("page file is full"))?;
            // data before header, so a torn allocation never points past EOF
            self.file.write_all_at(&zero_buf, Self::offset(page_no))?;
            header.next_page = next_page;
            page_no
        };
        self.persist_header(&header)?;
        self.file.sync_data()?;
        Ok(page_no)
    }

    /// Disposing a page that is already on the free list corrupts the list;
    /// callers own that bookkeeping.
    fn dispose_page(&self, page_no: PageNo) -> Result<()> {
        let mut header = self.header.lock();
        Self::check_range(&header, page_no)?;
        let mut buf = [0u8; PAGE_SIZE];
        buf[..FREE_LINK_SIZE].copy_from_slice(&header.free_head.to_le_bytes());
        self.file.write_all_at(&buf, Self::offset(page_no))?;
        header.free_head = page_no;
        self.persist_header(&header)?;
        self.file.sync_data()
    }
}
