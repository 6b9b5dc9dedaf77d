//! Mini-parse: the names a set of resource files declares, without the
//! values behind them.
//!
//! Every file yields the resource its path names (unless it is a values
//! file). XML files are then scanned: values files for `<resources>`
//! declarations, everything else for inline `@+id/...` ids.

mod non_values;
mod values;

use crate::discovery::walk_files;
use crate::error::{Error, Result};
use crate::pipeline::{self, Context};
use crate::res::{make_paths, parse_name, parse_path, FullyQualifiedName, ResourcePath, ResourceType};
use crate::xml::stream_document;
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// One declared resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    #[serde(flatten)]
    pub name: FullyQualifiedName,

    /// Attrs listed by a `<declare-styleable>`, in document order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styleable_attrs: Option<Vec<String>>,
}

impl Resource {
    pub fn new(name: FullyQualifiedName) -> Self {
        Self {
            name,
            styleable_attrs: None,
        }
    }
}

/// Everything a package declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceSet {
    pub package: String,
    pub resources: Vec<Resource>,
}

impl ResourceSet {
    /// Sorts by fully qualified name so output does not depend on which
    /// worker finished first.
    pub fn new(package: impl Into<String>, mut resources: Vec<Resource>) -> Self {
        resources.sort_by_cached_key(|r| r.name.to_string());
        Self {
            package: package.into(),
            resources,
        }
    }
}

/// A file to parse, read from disk unless its contents were handed over.
#[derive(Debug, Clone)]
pub struct ResourceFile {
    pub path: ResourcePath,
    contents: Option<Arc<[u8]>>,
}

impl ResourceFile {
    pub fn on_disk(path: ResourcePath) -> Self {
        Self { path, contents: None }
    }

    pub fn in_memory(path: ResourcePath, contents: impl Into<Arc<[u8]>>) -> Self {
        Self {
            path,
            contents: Some(contents.into()),
        }
    }

    pub fn open(&self) -> Result<Box<dyn BufRead + '_>> {
        match &self.contents {
            Some(bytes) => Ok(Box::new(&bytes[..])),
            None => {
                let file = File::open(&self.path.path)
                    .map_err(|err| Error::io("open failed", &self.path.path, err))?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }

    /// Raw files are opaque. Otherwise `.xml` files are parsed and
    /// extension-less ones are sniffed for an XML declaration.
    pub fn needs_parse(&self) -> Result<bool> {
        if self.path.res_type == ResourceType::Raw {
            return Ok(false);
        }
        match self.path.path.extension() {
            Some(ext) => Ok(ext == "xml"),
            None => {
                let mut head = [0u8; 5];
                let mut reader = self.open()?;
                let mut read = 0;
                while read < head.len() {
                    let n = reader
                        .read(&mut head[read..])
                        .map_err(|err| Error::io("read failed", &self.path.path, err))?;
                    if n == 0 {
                        break;
                    }
                    read += n;
                }
                Ok(&head[..read] == b"<?xml")
            }
        }
    }
}

/// The resource named by the file path itself. Values files declare
/// their resources inside and have none.
pub fn path_resource(path: &ResourcePath) -> Result<Option<Resource>> {
    if path.is_values() {
        return Ok(None);
    }
    let name = path.resource_name().unwrap_or_default();
    let fqn = parse_name(&name, path.res_type)
        .map_err(|e| e.with_prefix(format!("{}: name parse failed: ", path.path.display())))?;
    Ok(Some(Resource::new(fqn)))
}

/// Emits every resource `file` declares, path resource first.
pub fn parse_file(ctx: &Context, file: &ResourceFile, emit: &mut dyn FnMut(Resource) -> Result<()>) -> Result<()> {
    if let Some(resource) = path_resource(&file.path).map_err(|e| ctx.error(e))? {
        emit(resource)?;
    }
    if !file.needs_parse().map_err(|e| ctx.error(e))? {
        return Ok(());
    }

    let ctx = ctx.prefixed(format!("{} xml-parse: ", file.path.path.display()));
    let mut events = stream_document(file.open().map_err(|e| ctx.error(e))?);
    let parsed = if file.path.is_values() {
        values::parse(&ctx.prefixed("mini-values-parse: "), &mut events, emit)
    } else {
        non_values::parse(&ctx.prefixed("mini-non-values-parse: "), &mut events, emit)
    };
    // A decode failure explains any parse error that followed it.
    if let Some(err) = events.take_error() {
        return Err(ctx.error(err));
    }
    parsed
}

/// Parses every file of `files` on `workers` threads.
pub fn res_parse(
    ctx: &Context,
    files: Receiver<ResourceFile>,
    workers: usize,
) -> Result<(Receiver<Resource>, Receiver<Error>)> {
    pipeline::fan_out(ctx, workers, files, |ctx, file: ResourceFile, tx: &Sender<Resource>, etx| {
        debug!("Parsing {}", file.path.path.display());
        let result = parse_file(ctx, &file, &mut |resource| {
            if pipeline::send(ctx, tx, resource) {
                Ok(())
            } else {
                Err(Error::Cancelled)
            }
        });
        match result {
            Ok(()) => true,
            Err(err) if err.is_cancelled() => false,
            Err(err) => pipeline::send(ctx, etx, err),
        }
    })
}

/// Parses every file under `res_paths`, files or directories, into the
/// resources of `package`.
///
/// `ctx` is cancelled on return, which stops any worker still running.
pub fn parse_all(ctx: &Context, res_paths: &[PathBuf], package: &str, workers: usize) -> Result<ResourceSet> {
    let files = walk_files(res_paths)?;
    let paths = make_paths(&files)?;
    let files = paths.into_iter().map(ResourceFile::on_disk).collect();
    run(ctx, files, package, workers)
}

/// Like [`parse_all`], with file contents supplied by the caller.
pub fn parse_all_contents(
    ctx: &Context,
    files: &[PathBuf],
    contents: Vec<Vec<u8>>,
    package: &str,
    workers: usize,
) -> Result<ResourceSet> {
    if files.len() != contents.len() {
        return Err(Error::ContentsMismatch {
            paths: files.len(),
            contents: contents.len(),
        });
    }
    let mut units = Vec::with_capacity(files.len());
    for (file, bytes) in files.iter().zip(contents) {
        match parse_path(file) {
            Ok(path) => units.push(ResourceFile::in_memory(path, bytes)),
            Err(Error::SkipResPath) => continue,
            Err(err) => return Err(err.with_prefix(format!("failed to parse {:?}: ", file.display().to_string()))),
        }
    }
    run(ctx, units, package, workers)
}

fn run(ctx: &Context, files: Vec<ResourceFile>, package: &str, workers: usize) -> Result<ResourceSet> {
    let _guard = ctx.cancel_on_drop();
    let count = files.len();
    let input = pipeline::emit_all(ctx, files)?;
    let (data, errors) = res_parse(ctx, input, workers)?;
    let resources = pipeline::drain(ctx, data, errors)?;
    info!("Found {} resources in {} files", resources.len(), count);
    Ok(ResourceSet::new(package, resources))
}
