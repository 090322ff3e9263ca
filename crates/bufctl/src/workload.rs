//! Workloads that drive a `BufferManager` over a single `DiskFile`.
//!
//! Every page written by `init_pages` carries its own page number in bytes
//! 0..4, which `scan` uses to check what the cache hands back.

use std::path::Path;

use anyhow::{Context, Result, bail};
use log::info;
use storage::{BufferConfig, BufferManager, BufferStats, DiskFile, FrameInfo, PageNo};

const STAMP_LEN: usize = 4;

/// Outcome of a `scan` run, captured before the cache is torn down.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub pages: u32,
    pub passes: u32,
    pub stats: BufferStats,
    pub frames: Vec<FrameInfo>,
    /// Pages whose stamp did not match their page number.
    pub mismatched: Vec<PageNo>,
}

fn open_file(path: &Path) -> Result<DiskFile> {
    DiskFile::open(path).with_context(|| format!("open page file {}", path.display()))
}

fn buffer_config(frames: usize) -> Result<BufferConfig> {
    let config = BufferConfig::new(frames);
    config.validate()?;
    Ok(config)
}

/// Appends `count` stamped pages to the file, going through the cache.
///
/// Returns the page numbers that were allocated.
pub fn init_pages(path: &Path, frames: usize, count: u32) -> Result<Vec<PageNo>> {
    let config = buffer_config(frames)?;
    let file = open_file(path)?;
    let mut bm = BufferManager::new(config);
    let mut allocated = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (page_no, mut page) = bm.alloc_page(&file).context("allocate page")?;
        page.write_bytes(0, &page_no.to_le_bytes());
        drop(page);
        bm.unpin_page(&file, page_no, true)?;
        allocated.push(page_no);
    }
    bm.close().context("write back new pages")?;
    file.sync_data()?;
    info!("initialized {} pages in {}", allocated.len(), path.display());
    Ok(allocated)
}

/// Reads every page of the file `passes` times through a cache of `frames`.
pub fn scan(path: &Path, frames: usize, passes: u32) -> Result<ScanReport> {
    let config = buffer_config(frames)?;
    let file = open_file(path)?;
    let last = file.next_page_no();
    let mut bm = BufferManager::new(config);
    let mut mismatched = Vec::new();

    for pass in 0..passes {
        for page_no in 1..last {
            let page = bm
                .read_page(&file, page_no)
                .with_context(|| format!("read page {page_no}"))?;
            let stamp = page.read_bytes(0, STAMP_LEN).unwrap_or_default();
            if pass == 0 && stamp != page_no.to_le_bytes() {
                mismatched.push(page_no);
            }
            drop(page);
            bm.unpin_page(&file, page_no, false)?;
        }
    }

    let report = ScanReport {
        pages: last.saturating_sub(1),
        passes,
        stats: bm.stats(),
        frames: bm.describe_all(),
        mismatched,
    };
    bm.close()?;
    Ok(report)
}

/// Writes `text` after the stamp of `page_no` and lets teardown flush it.
pub fn touch(path: &Path, frames: usize, page_no: PageNo, text: &str) -> Result<()> {
    if text.len() > storage::PAGE_SIZE - STAMP_LEN {
        bail!("text of {} bytes does not fit in a page", text.len());
    }
    let config = buffer_config(frames)?;
    let file = open_file(path)?;
    let mut bm = BufferManager::new(config);
    {
        let mut page = bm
            .read_page(&file, page_no)
            .with_context(|| format!("read page {page_no}"))?;
        page.write_bytes(STAMP_LEN, text.as_bytes());
    }
    bm.unpin_page(&file, page_no, true)?;
    bm.close().context("write back page")?;
    Ok(())
}

/// Reads `len` bytes of text stored by `touch`, without caching.
pub fn peek(path: &Path, page_no: PageNo, len: usize) -> Result<String> {
    use storage::{Page, PageFile};

    let file = open_file(path)?;
    let mut page = Page::new();
    file.read_page(page_no, &mut page)
        .with_context(|| format!("read page {page_no}"))?;
    let bytes = page
        .read_bytes(STAMP_LEN, len)
        .context("length past end of page")?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}
