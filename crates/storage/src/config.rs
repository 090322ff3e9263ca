use crate::error::{BufferError, BufferResult};

const DEFAULT_NUM_FRAMES: usize = 64;

/// Construction parameters for a [`BufferManager`](crate::BufferManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Number of frames in the pool. Fixed for the cache's lifetime.
    pub num_frames: usize,
}

impl BufferConfig {
    pub fn new(num_frames: usize) -> Self {
        Self { num_frames }
    }

    /// Bucket count for the page directory: roughly 1.2x the frame count,
    /// kept odd so modulo hashing spreads consecutive page numbers.
    pub fn directory_capacity(&self) -> usize {
        (self.num_frames * 6 / 5) | 1
    }

    /// Rejects configurations the buffer manager would refuse to build.
    pub fn validate(&self) -> BufferResult<()> {
        if self.num_frames == 0 {
            return Err(BufferError::InvalidConfig(
                "frame count must be at least 1".to_string(),
            ));
        }
        if u32::try_from(self.num_frames).is_err() {
            return Err(BufferError::InvalidConfig(format!(
                "frame count {} exceeds the addressable frame range",
                self.num_frames
            )));
        }
        Ok(())
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_FRAMES)
    }
}
