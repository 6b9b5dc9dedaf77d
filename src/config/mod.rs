//! Run configuration: file formats, default locations and validation.

mod loader;

pub use loader::{Config, ShardConfig};
