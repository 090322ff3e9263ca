// MODULE DECLARATIONS
mod buffer;
mod config;
mod directory;
mod error;
mod file;
mod frame;
mod page;

// PUBLIC API EXPORTS
// Front ends (like the bufctl tool) build on these directly.
pub use buffer::{BufferManager, BufferStats, PageGuard};
pub use config::BufferConfig;
pub use directory::{HashDirectory, PageDirectory};
pub use error::{BufferError, BufferResult, IndexError};
pub use file::{DiskFile, FileId, PageFile};
pub use frame::{FrameId, FrameInfo};
pub use page::{PAGE_SIZE, Page, PageNo};
