//! Classification of files inside an Android `res` directory.

use super::types::{Density, Kind, ResourceType};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::trace;

/// A file under `<res>/<type>[-qualifiers]/<file>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    /// The file itself, as it was given
    pub path: PathBuf,

    /// The `res` directory containing the type directory
    pub res_dir: PathBuf,

    /// Type directory name, qualifiers included (e.g. `values-en-xhdpi`)
    pub type_dir: String,

    /// Type named by the type directory; `Values` for `values*`
    pub res_type: ResourceType,

    /// Everything after the first `-` of the type directory
    pub qualifier: String,

    /// First density qualifier found, if any
    pub density: Density,
}

impl ResourcePath {
    /// True when the file holds `<resources>` declarations.
    pub fn is_values(&self) -> bool {
        match self.res_type.kind() {
            Kind::Value => true,
            Kind::Both => self.type_dir.starts_with(ResourceType::Values.as_str()),
            Kind::NonValue => false,
        }
    }

    /// Archive entry name: the last three path components.
    pub fn entry_name(&self) -> String {
        let mut parts: Vec<String> = self
            .path
            .components()
            .rev()
            .take(3)
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        parts.reverse();
        parts.join("/")
    }

    /// File name without its extension, as used for the resource name.
    ///
    /// Raw resources keep everything up to the last dot, all other types
    /// stop at the first one.
    pub fn resource_name(&self) -> Option<String> {
        let file_name = self.path.file_name()?.to_str()?;
        let stem = if self.res_type == ResourceType::Raw {
            file_name.rsplit_once('.').map_or(file_name, |(stem, _)| stem)
        } else {
            file_name.split_once('.').map_or(file_name, |(stem, _)| stem)
        };
        Some(stem.to_string())
    }
}

/// Classifies a file path by its type directory.
///
/// Dot-files yield [`Error::SkipResPath`]; anything whose parent directory
/// is not a known type yields [`Error::NotResPath`].
pub fn parse_path(path: impl AsRef<Path>) -> Result<ResourcePath> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if file_name.starts_with('.') {
        return Err(Error::SkipResPath);
    }

    let parent = path.parent().ok_or(Error::NotResPath)?;
    let type_dir = parent
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or(Error::NotResPath)?;
    let res_dir = parent.parent().map(Path::to_path_buf).unwrap_or_default();

    let (head, qualifier) = type_dir.split_once('-').unwrap_or((type_dir, ""));
    let res_type = ResourceType::parse_value_or_type(head).map_err(|_| Error::NotResPath)?;

    let mut density = Density::UNSPECIFIED;
    for segment in qualifier.split('-') {
        density = Density::parse(segment)?;
        if density.is_specified() {
            break;
        }
    }

    Ok(ResourcePath {
        path: path.to_path_buf(),
        res_dir,
        type_dir: type_dir.to_string(),
        res_type,
        qualifier: qualifier.to_string(),
        density,
    })
}

/// Parses every path, silently dropping dot-files.
pub fn make_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ResourcePath>> {
    let mut parsed = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        match parse_path(path) {
            Ok(p) => parsed.push(p),
            Err(Error::SkipResPath) => trace!("skipping {}", path.display()),
            Err(e) => {
                return Err(e.with_prefix(format!("failed to parse {:?}: ", path.display().to_string())))
            }
        }
    }
    Ok(parsed)
}
