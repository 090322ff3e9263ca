use std::fmt;
use std::ops::{Deref, DerefMut};

use log::{debug, trace, warn};

use crate::config::BufferConfig;
use crate::directory::{HashDirectory, PageDirectory};
use crate::error::{BufferError, BufferResult};
use crate::file::{FileId, PageFile};
use crate::frame::{FrameDesc, FrameId, FrameInfo};
use crate::page::{Page, PageNo};

/// Mutable access to a pinned page.
///
/// The guard borrows the buffer manager; the pin itself outlives the guard
/// and is released only by [`BufferManager::unpin_page`].
pub struct PageGuard<'b> {
    page: &'b mut Page,
    frame_id: FrameId,
}

impl PageGuard<'_> {
    /// Returns the frame id backing this guard.
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }
}

impl Deref for PageGuard<'_> {
    type Target = Page;

    fn deref(&self) -> &Self::Target {
        self.page
    }
}

impl DerefMut for PageGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.page
    }
}

/// Occupancy and traffic counters for a buffer manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStats {
    pub total_frames: usize,
    pub used_frames: usize,
    pub pinned_frames: usize,
    pub dirty_frames: usize,
    /// Reads served from a resident frame.
    pub hits: u64,
    /// Reads that had to load the page from its file.
    pub misses: u64,
    /// Resident pages dropped to make room for another.
    pub evictions: u64,
    /// Dirty pages written back to their file.
    pub write_backs: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    evictions: u64,
    write_backs: u64,
}

/// Fixed-capacity page cache with clock (second-chance) replacement.
///
/// Every resident page is pinned by `read_page`/`alloc_page` and must be
/// released with `unpin_page`; pinned frames are never evicted. Dirty pages
/// are written back on eviction, on `flush_file`, and when the manager is
/// closed or dropped.
pub struct BufferManager<'a, D: PageDirectory = HashDirectory> {
    frames: Vec<FrameDesc<'a>>,
    pool: Vec<Page>,
    directory: D,
    clock_hand: usize,
    counters: Counters,
}

impl<'a> BufferManager<'a> {
    /// Creates a buffer manager backed by a [`HashDirectory`].
    ///
    /// Panics if `config` fails [`BufferConfig::validate`].
    pub fn new(config: BufferConfig) -> Self {
        Self::with_directory(config, HashDirectory::new(config.directory_capacity()))
    }
}

impl<'a, D: PageDirectory> BufferManager<'a, D> {
    /// Creates a buffer manager over a caller-supplied page directory.
    ///
    /// Panics if `config` fails [`BufferConfig::validate`].
    pub fn with_directory(config: BufferConfig, directory: D) -> Self {
        if let Err(err) = config.validate() {
            panic!("{err}");
        }
        let num_frames = config.num_frames;
        let frames = (0..num_frames)
            .map(|i| FrameDesc::new(FrameId(i as u32)))
            .collect();
        let pool = (0..num_frames).map(|_| Page::new()).collect();
        Self {
            frames,
            pool,
            directory,
            // first advance lands on frame 0
            clock_hand: num_frames - 1,
            counters: Counters::default(),
        }
    }

    /// Returns the number of frames in the pool.
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    fn advance_clock(&mut self) {
        self.clock_hand = (self.clock_hand + 1) % self.frames.len();
    }

    fn guard(&mut self, frame_id: FrameId) -> PageGuard<'_> {
        PageGuard {
            page: &mut self.pool[frame_id.index()],
            frame_id,
        }
    }

    /// Picks a frame with the clock policy, evicting its page if needed.
    ///
    /// The returned frame is cleared and unregistered. At most two sweeps are
    /// made: the first may only clear reference bits.
    fn allocate(&mut self) -> BufferResult<FrameId> {
        for _ in 0..self.frames.len() * 2 {
            self.advance_clock();
            let hand = self.clock_hand;
            let desc = &mut self.frames[hand];

            if !desc.valid {
                desc.clear();
                return Ok(desc.frame_no);
            }
            if desc.refbit {
                desc.refbit = false;
                continue;
            }
            if desc.pin_cnt > 0 {
                continue;
            }

            self.evict(hand)?;
            return Ok(self.frames[hand].frame_no);
        }
        Err(BufferError::BufferExceeded)
    }

    /// Writes back (if dirty) and unregisters the page in frame `idx`.
    ///
    /// A failed write leaves the frame valid, dirty and registered.
    fn evict(&mut self, idx: usize) -> BufferResult<()> {
        let desc = &mut self.frames[idx];
        let Some(file) = desc.file else {
            return Err(BufferError::CorruptState {
                frame: desc.frame_no,
            });
        };

        if desc.dirty {
            debug!("writing back page {} from {}", desc.page_no, desc.frame_no);
            file.write_page(desc.page_no, &self.pool[idx])?;
            self.counters.write_backs += 1;
            desc.dirty = false;
        }

        self.directory.remove(FileId::of(file), desc.page_no)?;
        debug!("evicted page {} from {}", desc.page_no, desc.frame_no);
        self.counters.evictions += 1;
        desc.clear();
        Ok(())
    }

    /// Fetches page `page_no` of `file` and pins it.
    ///
    /// A resident page is served without touching the file. Otherwise a frame
    /// is allocated and the page is read into it.
    pub fn read_page(
        &mut self,
        file: &'a dyn PageFile,
        page_no: PageNo,
    ) -> BufferResult<PageGuard<'_>> {
        let file_id = FileId::of(file);
        if let Some(frame_id) = self.directory.lookup(file_id, page_no) {
            let desc = &mut self.frames[frame_id.index()];
            desc.pin_cnt += 1;
            desc.refbit = true;
            self.counters.hits += 1;
            trace!("hit page {page_no} in {frame_id}");
            return Ok(self.guard(frame_id));
        }

        let frame_id = self.allocate()?;
        trace!("miss page {page_no}, loading into {frame_id}");
        file.read_page(page_no, &mut self.pool[frame_id.index()])?;
        self.counters.misses += 1;
        self.directory.insert(file_id, page_no, frame_id)?;
        self.frames[frame_id.index()].set(file, page_no);
        Ok(self.guard(frame_id))
    }

    /// Releases one pin on a resident page, marking it dirty if requested.
    ///
    /// Dirtiness is sticky: an unpin with `mark_dirty = false` never clears it.
    pub fn unpin_page(
        &mut self,
        file: &dyn PageFile,
        page_no: PageNo,
        mark_dirty: bool,
    ) -> BufferResult<()> {
        let frame_id = self
            .directory
            .lookup(FileId::of(file), page_no)
            .ok_or(BufferError::NotFound { page_no })?;
        let desc = &mut self.frames[frame_id.index()];
        if desc.pin_cnt == 0 {
            return Err(BufferError::NotPinned { page_no });
        }
        desc.pin_cnt -= 1;
        desc.dirty |= mark_dirty;
        Ok(())
    }

    /// Allocates a new page in `file` and pins a zeroed frame for it.
    ///
    /// If the page cannot be cached, its number is handed back to the file.
    pub fn alloc_page(
        &mut self,
        file: &'a dyn PageFile,
    ) -> BufferResult<(PageNo, PageGuard<'_>)> {
        let page_no = file.allocate_page()?;
        let frame_id = match self.allocate() {
            Ok(frame_id) => frame_id,
            Err(err) => {
                return_page(file, page_no);
                return Err(err);
            }
        };

        self.pool[frame_id.index()].reset_memory();
        if let Err(err) = self.directory.insert(FileId::of(file), page_no, frame_id) {
            self.frames[frame_id.index()].clear();
            return_page(file, page_no);
            return Err(err.into());
        }
        self.frames[frame_id.index()].set(file, page_no);
        Ok((page_no, self.guard(frame_id)))
    }

    /// Drops a page from the cache (if resident) and deallocates it in `file`.
    ///
    /// Pins are not checked: disposing a pinned page discards it anyway.
    pub fn dispose_page(&mut self, file: &dyn PageFile, page_no: PageNo) -> BufferResult<()> {
        let file_id = FileId::of(file);
        if let Some(frame_id) = self.directory.lookup(file_id, page_no) {
            let desc = &self.frames[frame_id.index()];
            if desc.pin_cnt > 0 {
                warn!(
                    "disposing page {page_no} in {frame_id} with {} outstanding pins",
                    desc.pin_cnt
                );
            }
            self.directory.remove(file_id, page_no)?;
            self.frames[frame_id.index()].clear();
        }
        file.dispose_page(page_no)?;
        Ok(())
    }

    /// Writes back and evicts every resident page of `file`.
    ///
    /// Frames are processed in order and the scan stops at the first failure;
    /// pages handled before that point stay flushed and evicted.
    pub fn flush_file(&mut self, file: &dyn PageFile) -> BufferResult<()> {
        let file_id = FileId::of(file);
        for (desc, page) in self.frames.iter_mut().zip(self.pool.iter()) {
            if !desc.belongs_to(file_id) {
                continue;
            }
            if !desc.valid {
                return Err(BufferError::CorruptState {
                    frame: desc.frame_no,
                });
            }
            if desc.pin_cnt > 0 {
                return Err(BufferError::PagePinned {
                    page_no: desc.page_no,
                });
            }
            if desc.dirty {
                debug!("flushing page {} from {}", desc.page_no, desc.frame_no);
                file.write_page(desc.page_no, page)?;
                self.counters.write_backs += 1;
                desc.dirty = false;
            }
            self.directory.remove(file_id, desc.page_no)?;
            desc.clear();
        }
        Ok(())
    }

    /// Writes a resident dirty page back without evicting it.
    ///
    /// Returns `false` if the page is not resident.
    pub fn flush_page(&mut self, file: &dyn PageFile, page_no: PageNo) -> BufferResult<bool> {
        let Some(frame_id) = self.directory.lookup(FileId::of(file), page_no) else {
            return Ok(false);
        };
        let idx = frame_id.index();
        let desc = &mut self.frames[idx];
        if desc.dirty {
            debug!("flushing page {page_no} from {frame_id}");
            file.write_page(page_no, &self.pool[idx])?;
            self.counters.write_backs += 1;
            desc.dirty = false;
        }
        Ok(true)
    }

    /// Returns a snapshot of every frame descriptor.
    pub fn describe_all(&self) -> Vec<FrameInfo> {
        self.frames.iter().map(FrameDesc::info).collect()
    }

    /// Returns occupancy and traffic counters.
    pub fn stats(&self) -> BufferStats {
        let mut stats = BufferStats {
            total_frames: self.frames.len(),
            hits: self.counters.hits,
            misses: self.counters.misses,
            evictions: self.counters.evictions,
            write_backs: self.counters.write_backs,
            ..BufferStats::default()
        };
        for desc in self.frames.iter().filter(|desc| desc.valid) {
            stats.used_frames += 1;
            if desc.pin_cnt > 0 {
                stats.pinned_frames += 1;
            }
            if desc.dirty {
                stats.dirty_frames += 1;
            }
        }
        stats
    }

    /// Writes back every dirty page and consumes the manager.
    ///
    /// Unlike dropping, this reports the first write-back failure.
    pub fn close(mut self) -> BufferResult<()> {
        let result = self.write_back_all();
        // failed pages were already reported; don't retry them in drop
        for desc in &mut self.frames {
            desc.dirty = false;
        }
        result
    }

    /// Attempts every write-back even after a failure; returns the first one.
    fn write_back_all(&mut self) -> BufferResult<()> {
        let mut first_err = None;
        for (desc, page) in self.frames.iter_mut().zip(self.pool.iter()) {
            if !(desc.valid && desc.dirty) {
                continue;
            }
            let Some(file) = desc.file else {
                continue;
            };
            debug!("flushing page {} from {}", desc.page_no, desc.frame_no);
            match file.write_page(desc.page_no, page) {
                Ok(()) => {
                    self.counters.write_backs += 1;
                    desc.dirty = false;
                }
                Err(err) => {
                    warn!(
                        "failed to write back page {} from {}: {err}",
                        desc.page_no, desc.frame_no
                    );
                    first_err.get_or_insert(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

/// Hands an allocated page number back to `file` after it could not be cached.
fn return_page(file: &dyn PageFile, page_no: PageNo) {
    if let Err(err) = file.dispose_page(page_no) {
        warn!("could not return page {page_no} after failed allocation: {err}");
    }
}

impl<D: PageDirectory> Drop for BufferManager<'_, D> {
    fn drop(&mut self) {
        // failures are logged inside; nothing else to do with them here
        let _ = self.write_back_all();
    }
}

impl<D: PageDirectory> fmt::Display for BufferManager<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Print buffer...")?;
        for info in self.describe_all() {
            writeln!(f, "{info}")?;
        }
        Ok(())
    }
}
