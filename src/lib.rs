//! respack - Fast processing of Android resource directories
//!
//! This library classifies, parses, shards and archives the files of
//! Android `res` directories.
//!
//! # Architecture
//!
//! 1. **Identity** - Resource types, paths and fully qualified names (`res`)
//! 2. **XML** - Streaming decode and namespace-aware re-encoding (`xml`)
//! 3. **Pipeline** - Cancellable fan-out / fan-in over channels (`pipeline`)
//! 4. **Mini-parse** - The names a set of files declares (`extract`)
//! 5. **Bucketize** - Per-type, sharded archives of resources (`bucketize`)
//! 6. **Sharding** - Key to shard assignment and zip sharding (`shard`)

pub mod bucketize;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod res;
pub mod shard;
pub mod xml;

pub use bucketize::{create_partitions, Archiver, PartitionSession, Partitioner};
pub use config::Config;
pub use discovery::{walk_files, DeclarationOrder, FileFinder};
pub use error::{Error, Result};
pub use extract::{parse_all, parse_all_contents, Resource, ResourceSet};
pub use pipeline::Context;
pub use res::{parse_name, parse_path, FullyQualifiedName, ResourcePath, ResourceType};
pub use shard::{zip_shard, Sharder};
