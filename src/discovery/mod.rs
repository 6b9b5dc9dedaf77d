//! Resource file discovery.

mod file_finder;

pub use file_finder::{walk_files, DeclarationOrder, FileFinder, FileStats};
