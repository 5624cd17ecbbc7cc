//! Data models
//!
//! Files index records and the pagination types wrapped around them.

pub mod files_index;
pub mod page;

pub use files_index::{FileIndexId, FileIndexRecord, NewFileIndexRecord};
pub use page::{Page, PageRequest, PageResult};
