#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::rc::Rc;

use storage::{FileId, FrameId, HashDirectory, IndexError, Page, PageDirectory, PageFile, PageNo};

/// In-memory page file that records every call and can be told to fail.
#[derive(Default)]
pub struct MockFile {
    pages: RefCell<HashMap<PageNo, Page>>,
    next_page: Cell<PageNo>,
    reads: Cell<usize>,
    writes: RefCell<Vec<(PageNo, Vec<u8>)>>,
    disposed: RefCell<Vec<PageNo>>,
    pub fail_reads: Cell<bool>,
    pub fail_writes: Cell<bool>,
}

impl MockFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `fill` in every byte of `page_no`, bypassing the cache.
    pub fn seed(&self, page_no: PageNo, fill: u8) {
        let mut page = Page::new();
        page.data_mut().fill(fill);
        self.pages.borrow_mut().insert(page_no, page);
    }

    pub fn stored(&self, page_no: PageNo) -> Option<Page> {
        self.pages.borrow().get(&page_no).cloned()
    }

    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    /// Page numbers and contents of every successful write, in call order.
    pub fn writes(&self) -> Vec<(PageNo, Vec<u8>)> {
        self.writes.borrow().clone()
    }

    pub fn disposed(&self) -> Vec<PageNo> {
        self.disposed.borrow().clone()
    }
}

fn injected(op: &str) -> io::Error {
    io::Error::other(format!("injected {op} failure"))
}

impl PageFile for MockFile {
    fn read_page(&self, page_no: PageNo, page: &mut Page) -> io::Result<()> {
        if self.fail_reads.get() {
            return Err(injected("read"));
        }
        self.reads.set(self.reads.get() + 1);
        match self.pages.borrow().get(&page_no) {
            Some(stored) => page.data_mut().copy_from_slice(stored.data()),
            None => page.reset_memory(),
        }
        Ok(())
    }

    fn write_page(&self, page_no: PageNo, page: &Page) -> io::Result<()> {
        if self.fail_writes.get() {
            return Err(injected("write"));
        }
        self.writes
            .borrow_mut()
            .push((page_no, page.data().to_vec()));
        self.pages.borrow_mut().insert(page_no, page.clone());
        Ok(())
    }

    fn allocate_page(&self) -> io::Result<PageNo> {
        let page_no = self.next_page.get() + 1;
        self.next_page.set(page_no);
        Ok(page_no)
    }

    fn dispose_page(&self, page_no: PageNo) -> io::Result<()> {
        self.disposed.borrow_mut().push(page_no);
        self.pages.borrow_mut().remove(&page_no);
        Ok(())
    }
}

/// Switches shared between a test and a [`FlakyDirectory`] it handed away.
#[derive(Clone, Default)]
pub struct DirectoryFaults {
    pub fail_insert: Rc<Cell<bool>>,
    pub fail_remove: Rc<Cell<bool>>,
}

/// Hash directory whose inserts and removes can be made to fail.
pub struct FlakyDirectory {
    inner: HashDirectory,
    faults: DirectoryFaults,
}

impl FlakyDirectory {
    pub fn new(capacity: usize) -> (Self, DirectoryFaults) {
        let faults = DirectoryFaults::default();
        let dir = Self {
            inner: HashDirectory::new(capacity),
            faults: faults.clone(),
        };
        (dir, faults)
    }
}

impl PageDirectory for FlakyDirectory {
    fn insert(&mut self, file: FileId, page_no: PageNo, frame: FrameId) -> Result<(), IndexError> {
        if self.faults.fail_insert.get() {
            return Err(IndexError::Duplicate { page_no });
        }
        self.inner.insert(file, page_no, frame)
    }

    fn lookup(&self, file: FileId, page_no: PageNo) -> Option<FrameId> {
        self.inner.lookup(file, page_no)
    }

    fn remove(&mut self, file: FileId, page_no: PageNo) -> Result<(), IndexError> {
        if self.faults.fail_remove.get() {
            return Err(IndexError::Missing { page_no });
        }
        self.inner.remove(file, page_no)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
