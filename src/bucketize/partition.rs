//! Collects resources and writes them into per-type, sharded archives.

use super::values::{ResourceRootAttribute, ValuesResource};
use crate::discovery::DeclarationOrder;
use crate::error::{Error, Result};
use crate::res::tags::RESOURCES_TAG;
use crate::res::{parse_name, ResourcePath, ResourceType, RES_AUTO};
use crate::shard::Sharder;
use crate::xml::{Attr, Encoder, Name, StartElement, Token};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const XML_HEADER: &[u8] = b"<?xml version='1.0' encoding='utf-8'?>";
const RESOURCES_FOOTER: &[u8] = b"</resources>";

/// Receives everything the archiver finds.
pub trait Partitioner {
    fn collect_path_resource(&mut self, path: ResourcePath);
    fn collect_values(&mut self, value: ValuesResource) -> Result<()>;
    fn collect_root_attribute(&mut self, attribute: ResourceRootAttribute);
    /// Writes out everything collected. Nothing is written before this.
    fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ValuesKey {
    source: ResourcePath,
    res_type: ResourceType,
}

/// Partitions resources into one set of archives per type; the number of
/// archives given for a type is its shard count.
pub struct PartitionSession<W: Write + Seek> {
    outputs: BTreeMap<ResourceType, Vec<ZipWriter<W>>>,
    sharder: Sharder,
    order: DeclarationOrder,
    paths: HashMap<PathBuf, ResourcePath>,
    values: HashMap<ValuesKey, BTreeMap<String, Vec<u8>>>,
    root_attrs: HashMap<PathBuf, Vec<Attr>>,
    /// Entry names used so far, per type
    entries: HashMap<ResourceType, HashSet<String>>,
    finished: Option<BTreeMap<ResourceType, Vec<W>>>,
}

impl<W: Write + Seek> PartitionSession<W> {
    pub fn new(outputs: BTreeMap<ResourceType, Vec<W>>, sharder: Sharder, order: DeclarationOrder) -> Self {
        let outputs = outputs
            .into_iter()
            .map(|(t, writers)| (t, writers.into_iter().map(ZipWriter::new).collect()))
            .collect();
        Self {
            outputs,
            sharder,
            order,
            paths: HashMap::new(),
            values: HashMap::new(),
            root_attrs: HashMap::new(),
            entries: HashMap::new(),
            finished: None,
        }
    }

    /// Closes the session and hands back the finished archives.
    pub fn into_outputs(mut self) -> Result<BTreeMap<ResourceType, Vec<W>>> {
        self.close()?;
        Ok(self.finished.take().unwrap_or_default())
    }

    fn accepts(&self, res_type: ResourceType) -> bool {
        self.outputs.contains_key(&res_type)
    }

    fn position(&self, path: &Path) -> (usize, PathBuf) {
        (self.order.position(path), path.to_path_buf())
    }

    fn flush_paths(&mut self) -> Result<()> {
        let mut paths: Vec<ResourcePath> = std::mem::take(&mut self.paths).into_values().collect();
        paths.sort_by_cached_key(|p| self.position(&p.path));

        // One archive can not hold an entry name twice; the file declared
        // last overrides the others, as it would in an overlay.
        let mut last = HashMap::new();
        for (i, p) in paths.iter().enumerate() {
            last.insert((p.res_type, p.entry_name()), i);
        }
        for (i, p) in paths.iter().enumerate() {
            if last.get(&(p.res_type, p.entry_name())) != Some(&i) {
                debug!("{} is overridden by a later declaration", p.path.display());
                continue;
            }
            let mut file =
                File::open(&p.path).map_err(|err| Error::io("could not be opened for reading", &p.path, err))?;
            self.store_path_resource(p, &mut file)?;
        }
        Ok(())
    }

    /// Copies one file resource into the shard its name maps to.
    pub fn store_path_resource(&mut self, path: &ResourcePath, reader: &mut dyn Read) -> Result<()> {
        let file_name = path
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = match file_name.find('.') {
            // Ignored by the resource compiler as well.
            Some(0) => return Ok(()),
            Some(dot) => &file_name[..dot],
            None => file_name.as_str(),
        };
        let display = path.path.display();
        let fqn = parse_name(stem, path.res_type).map_err(|e| {
            e.with_prefix(format!("{}: {:?} could not be parsed into a res name: ", display, stem))
        })?;
        let writers = self
            .outputs
            .get_mut(&fqn.res_type)
            .ok_or(Error::NoOutput(fqn.res_type))
            .map_err(|e| e.with_prefix(format!("{}: ", display)))?;
        let shard = self.sharder.shard(&fqn.to_string(), writers.len())?;

        let entry = path.entry_name();
        self.entries.entry(fqn.res_type).or_default().insert(entry.clone());
        let writer = &mut writers[shard];
        writer
            .start_file(entry.as_str(), entry_options())
            .map_err(|source| Error::Archive {
                op: "could not create writer",
                entry: entry.clone(),
                source,
            })?;
        io::copy(reader, writer).map_err(|err| Error::io("could not copy into archive", &path.path, err))?;
        Ok(())
    }

    fn flush_values(&mut self) -> Result<()> {
        let mut values = std::mem::take(&mut self.values);
        let mut keys: Vec<ValuesKey> = values.keys().cloned().collect();
        keys.sort_by_cached_key(|k| (self.position(&k.source.path), k.res_type));

        for key in keys {
            let Some(resources) = values.remove(&key) else {
                continue;
            };
            let source = &key.source.path;
            let header = resources_start(self.root_attrs.get(source).map(Vec::as_slice).unwrap_or_default())
                .map_err(|e| e.with_prefix(format!("{}: could not write resources tag: ", source.display())))?;
            let taken = self.entries.entry(key.res_type).or_default();
            let entry = unique_entry(taken, key.source.entry_name());
            let writers = self
                .outputs
                .get_mut(&key.res_type)
                .ok_or(Error::NoOutput(key.res_type))?;

            // Every shard gets the file, empty or not.
            for writer in writers.iter_mut() {
                writer
                    .start_file(entry.as_str(), entry_options())
                    .map_err(|source| Error::Archive {
                        op: "could not create entry",
                        entry: entry.clone(),
                        source,
                    })?;
                writer.write_all(XML_HEADER)?;
                writer.write_all(&header)?;
            }
            for (fqn, payload) in &resources {
                let shard = self.sharder.shard(fqn, writers.len())?;
                writers[shard]
                    .write_all(payload)
                    .map_err(|err| Error::io("writing resource failed", source, err))?;
            }
            for writer in writers.iter_mut() {
                writer.write_all(RESOURCES_FOOTER)?;
            }
            debug!(
                "{}: {} {} resources over {} shards",
                entry,
                resources.len(),
                key.res_type,
                writers.len()
            );
        }
        Ok(())
    }
}

impl<W: Write + Seek> Partitioner for PartitionSession<W> {
    fn collect_path_resource(&mut self, path: ResourcePath) {
        if self.accepts(path.res_type) {
            self.paths.insert(path.path.clone(), path);
        }
    }

    fn collect_values(&mut self, value: ValuesResource) -> Result<()> {
        let res_type = value.name.res_type;
        if !self.accepts(res_type) {
            return Ok(());
        }
        // Attrs of other packages are only referenced, never redeclared.
        if res_type == ResourceType::Attr && value.name.package != RES_AUTO {
            return Ok(());
        }

        let key = ValuesKey {
            source: value.source,
            res_type,
        };
        let fqn = value.name.to_string();
        let stored = self.values.entry(key).or_default();
        match stored.get(&fqn) {
            Some(existing) if existing.len() > value.payload.len() => {}
            Some(existing) if existing.len() == value.payload.len() => {
                if *existing != value.payload {
                    return Err(Error::ValueConflict(fqn));
                }
            }
            _ => {
                stored.insert(fqn, value.payload);
            }
        }
        Ok(())
    }

    fn collect_root_attribute(&mut self, attribute: ResourceRootAttribute) {
        self.root_attrs
            .entry(attribute.source.path)
            .or_default()
            .push(attribute.attribute);
    }

    fn close(&mut self) -> Result<()> {
        if self.finished.is_some() {
            return Ok(());
        }
        self.flush_paths()
            .map_err(|e| e.with_prefix("got error flushing collected paths: "))?;
        self.flush_values()
            .map_err(|e| e.with_prefix("got error flushing collected values: "))?;

        let mut finished = BTreeMap::new();
        for (res_type, writers) in std::mem::take(&mut self.outputs) {
            let mut done = Vec::with_capacity(writers.len());
            for writer in writers {
                done.push(writer.finish().map_err(|source| Error::Archive {
                    op: "could not close",
                    entry: res_type.to_string(),
                    source,
                })?);
            }
            info!("{}: wrote {} shard(s)", res_type, done.len());
            finished.insert(res_type, done);
        }
        self.finished = Some(finished);
        Ok(())
    }
}

/// Entries carry a fixed timestamp so output is reproducible.
fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().last_modified_time(zip::DateTime::default())
}

/// `<resources ...>` carrying the attributes the source file declared.
fn resources_start(attrs: &[Attr]) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(Vec::new());
    encoder.encode_token(&Token::Start(StartElement::new(
        Name::local(RESOURCES_TAG),
        attrs.to_vec(),
    )))?;
    Ok(encoder.into_inner())
}

/// `entry` itself, or `entry` with `_N` before its extension when a values
/// file of the same name already went into the archive.
fn unique_entry(taken: &mut HashSet<String>, entry: String) -> String {
    if taken.insert(entry.clone()) {
        return entry;
    }
    let file_start = entry.rfind('/').map_or(0, |slash| slash + 1);
    let (stem, ext) = match entry[file_start..].rfind('.') {
        Some(dot) => entry.split_at(file_start + dot),
        None => (entry.as_str(), ""),
    };
    let mut n = 1;
    loop {
        let candidate = format!("{}_{}{}", stem, n, ext);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
