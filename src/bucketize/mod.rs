//! Bucketize: splits resources into per-type, sharded archives.
//!
//! Non-values files are archived whole. Values files are cut into one
//! payload per declaration, and payloads are regrouped by type so each
//! type's archives hold only that type's declarations.

mod partition;
mod values;

pub use partition::{PartitionSession, Partitioner};
pub use values::{parse_document, parse_file, parse_values, Collected, ResourceRootAttribute, ValuesResource};

use crate::error::{Error, Result};
use crate::pipeline::{self, Context, DEFAULT_WORKERS};
use crate::res::{make_paths, ResourcePath, ResourceType};
use crossbeam_channel::{never, select, Receiver};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Feeds resource files through the values parser into a [`Partitioner`].
pub struct Archiver<P: Partitioner> {
    files: Vec<ResourcePath>,
    partitioner: P,
    workers: usize,
}

impl<P: Partitioner> Archiver<P> {
    pub fn new<F: AsRef<Path>>(files: &[F], partitioner: P) -> Result<Self> {
        let files = make_paths(files).map_err(|e| e.with_prefix("converting res path failed: "))?;
        Ok(Self::from_paths(files, partitioner))
    }

    pub fn from_paths(files: Vec<ResourcePath>, partitioner: P) -> Self {
        Self {
            files,
            partitioner,
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn partitioner(&self) -> &P {
        &self.partitioner
    }

    pub fn into_partitioner(self) -> P {
        self.partitioner
    }

    /// Parses every values file, collects everything and closes the
    /// partitioner. The first error stops the run and is returned; the
    /// partitioner is not closed then.
    ///
    /// `ctx` is cancelled on return.
    pub fn archive(&mut self, ctx: &Context) -> Result<()> {
        let _guard = ctx.cancel_on_drop();
        let ctx = ctx.prefixed("archive: ");

        let (values_files, other_files): (Vec<_>, Vec<_>) =
            self.files.iter().cloned().partition(ResourcePath::is_values);
        info!(
            "Archiving {} values files and {} other files",
            values_files.len(),
            other_files.len()
        );

        let paths = pipeline::emit_all(&ctx, other_files)?;
        let values_input = pipeline::emit_all(&ctx, values_files)?;
        let (collected, errors) = pipeline::fan_out(&ctx, self.workers, values_input, |ctx, source, tx, etx| {
            let result = parse_file(ctx, &source, &mut |item| {
                if pipeline::send(ctx, tx, item) {
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
        })?;
        self.collect(&ctx, paths, collected, errors)?;
        self.partitioner
            .close()
            .map_err(|e| e.with_prefix("got error closing partitioner: "))
    }

    /// Hands everything arriving on the queues to the partitioner until all
    /// of them are closed.
    fn collect(
        &mut self,
        ctx: &Context,
        paths: Receiver<ResourcePath>,
        collected: Receiver<Collected>,
        errors: Receiver<Error>,
    ) -> Result<()> {
        let mut paths = Some(paths);
        let mut collected = Some(collected);
        let mut errors = Some(errors);
        while paths.is_some() || collected.is_some() || errors.is_some() {
            let paths_rx = paths.clone().unwrap_or_else(never);
            let collected_rx = collected.clone().unwrap_or_else(never);
            let errors_rx = errors.clone().unwrap_or_else(never);
            select! {
                recv(errors_rx) -> msg => match msg {
                    Ok(err) => {
                        warn!("{}", err);
                        ctx.cancel();
                        return Err(err);
                    }
                    Err(_) => errors = None,
                },
                recv(paths_rx) -> msg => match msg {
                    Ok(path) => self.partitioner.collect_path_resource(path),
                    Err(_) => paths = None,
                },
                recv(collected_rx) -> msg => match msg {
                    Ok(Collected::Value(value)) => {
                        if let Err(err) = self.partitioner.collect_values(value) {
                            ctx.cancel();
                            return Err(err.with_prefix("got error collecting values: "));
                        }
                    }
                    Ok(Collected::Attribute(attribute)) => self.partitioner.collect_root_attribute(attribute),
                    Err(_) => collected = None,
                },
            }
        }
        Ok(())
    }
}

/// Opens the archives named by `<type>:<file>` specs, in the order given.
/// Missing parent directories are created; existing files are truncated.
pub fn create_partitions(typed_outputs: &[String]) -> Result<BTreeMap<ResourceType, Vec<File>>> {
    let mut partitions: BTreeMap<ResourceType, Vec<File>> = BTreeMap::new();
    for spec in typed_outputs {
        let Some((type_name, file)) = spec.split_once(':') else {
            return Err(Error::OutputSpec { spec: spec.clone() });
        };
        let res_type = ResourceType::parse(type_name)
            .map_err(|e| e.with_prefix(format!("{:?}: ", spec)))?;
        let path = PathBuf::from(file);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| Error::io("could not create directory", parent, err))?;
        }
        let out = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|err| Error::io("could not create output", &path, err))?;
        debug!("{} shard {} -> {}", res_type, partitions.get(&res_type).map_or(0, Vec::len), path.display());
        partitions.entry(res_type).or_default().push(out);
    }
    Ok(partitions)
}
