//! Shard assignment functions and zip sharding.

use crate::error::{Error, Result};
use std::fmt;
use std::io::{self, Read, Seek, Write};
use std::sync::Arc;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

type ShardFn = dyn Fn(&str, usize) -> usize + Send + Sync;

/// Maps a key and a shard count to a shard index.
///
/// The function is only called with a non-zero shard count. Results are
/// checked, so a sharder returning an index out of range fails the
/// operation that used it instead of writing to the wrong place.
#[derive(Clone)]
pub struct Sharder {
    name: Arc<str>,
    func: Arc<ShardFn>,
}

impl Sharder {
    pub fn new<F>(name: impl AsRef<str>, func: F) -> Self
    where
        F: Fn(&str, usize) -> usize + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.as_ref()),
            func: Arc::new(func),
        }
    }

    /// 32-bit FNV-1 of the key, modulo the shard count.
    pub fn fnv() -> Self {
        Self::new("fnv", |key, shards| fnv32(key.as_bytes()) as usize % shards)
    }

    /// Shards on the part of the key before the last `separator`, using
    /// `inner` for the actual assignment. Keys without the separator are
    /// passed through whole.
    pub fn with_separator(separator: impl Into<String>, inner: Sharder) -> Self {
        let separator = separator.into();
        let name = format!("{}@{:?}", inner.name, separator);
        Self::new(name, move |key, shards| {
            let head = if separator.is_empty() {
                key
            } else {
                key.rfind(separator.as_str()).map_or(key, |idx| &key[..idx])
            };
            (inner.func)(head, shards)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shard index for `key`, validated against `shards`.
    pub fn shard(&self, key: &str, shards: usize) -> Result<usize> {
        let bad = |got| Error::BadShard {
            sharder: self.name.to_string(),
            key: key.to_string(),
            shards,
            got,
        };
        if shards == 0 {
            return Err(bad(0));
        }
        let got = (self.func)(key, shards);
        if got >= shards {
            return Err(bad(got));
        }
        Ok(got)
    }
}

impl Default for Sharder {
    fn default() -> Self {
        Self::fnv()
    }
}

impl fmt::Debug for Sharder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sharder").field("name", &self.name).finish()
    }
}

/// 32-bit FNV-1: multiply, then xor.
pub fn fnv32(bytes: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 2_166_136_261;
    const PRIME: u32 = 16_777_619;
    bytes.iter().fold(OFFSET_BASIS, |hash, &b| {
        hash.wrapping_mul(PRIME) ^ u32::from(b)
    })
}

/// Redistributes the regular files of `input` over `outputs`, keyed by
/// entry name. Entries are stored uncompressed.
pub fn zip_shard<R, W>(
    input: &mut ZipArchive<R>,
    outputs: &mut [ZipWriter<W>],
    sharder: &Sharder,
) -> Result<()>
where
    R: Read + Seek,
    W: Write + Seek,
{
    if outputs.is_empty() {
        return Err(Error::NoWriters);
    }
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(zip::DateTime::default());

    for i in 0..input.len() {
        let mut file = input.by_index(i).map_err(|source| Error::Archive {
            op: "read entry",
            entry: format!("#{}", i),
            source,
        })?;
        if !file.is_file() {
            continue;
        }
        let entry = file.name().to_string();
        let idx = sharder.shard(&entry, outputs.len())?;
        debug!("{} -> shard {}", entry, idx);

        let out = &mut outputs[idx];
        out.start_file(entry.as_str(), options)
            .map_err(|source| Error::Archive {
                op: "create output entry",
                entry: entry.clone(),
                source,
            })?;
        io::copy(&mut file, out).map_err(|err| Error::Write(err).with_prefix(format!("{}: ", entry)))?;
    }
    Ok(())
}
