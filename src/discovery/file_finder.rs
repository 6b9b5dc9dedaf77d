use crate::error::{Error, Result};
use crate::res::parse_path;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Walks resource roots given on the command line.
pub struct FileFinder<'a> {
    roots: &'a [PathBuf],
}

impl<'a> FileFinder<'a> {
    pub fn new(roots: &'a [PathBuf]) -> Self {
        Self { roots }
    }

    /// Every file beneath the roots, in root order, without duplicates.
    ///
    /// A root that is a file is returned as is. Directories are walked in
    /// sorted order so the result does not depend on the file system.
    pub fn find_files(&self) -> Result<Vec<PathBuf>> {
        let walked = self
            .roots
            .par_iter()
            .map(|root| Self::scan(root))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        let files: Vec<PathBuf> = walked
            .into_iter()
            .flatten()
            .filter(|path| seen.insert(path.clone()))
            .collect();
        debug!("Found {} files under {} roots", files.len(), self.roots.len());
        Ok(files)
    }

    fn scan(root: &Path) -> Result<Vec<PathBuf>> {
        trace!("Scanning {}", root.display());
        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|err| Error::io("got error while walking", root, err.into()))?;
            if !entry.file_type().is_dir() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// Convenience wrapper around [`FileFinder::find_files`].
pub fn walk_files(roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
    FileFinder::new(roots).find_files()
}

/// Position of every walked file in the order the inputs were given.
///
/// Archive output is sorted by this order so that, for equal resources,
/// the file declared first on the command line wins the same way every
/// run.
#[derive(Debug, Clone, Default)]
pub struct DeclarationOrder {
    index: HashMap<PathBuf, usize>,
}

impl DeclarationOrder {
    pub fn new<P: AsRef<Path>>(files: &[P]) -> Self {
        let mut index = HashMap::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            index.entry(file.as_ref().to_path_buf()).or_insert(i);
        }
        Self { index }
    }

    /// Index of `path`, else of its nearest ancestor in the map, else 0.
    pub fn position(&self, path: &Path) -> usize {
        path.ancestors()
            .find_map(|p| self.index.get(p).copied())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Counts of discovered files by how they will be processed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileStats {
    pub values_files: usize,
    pub path_files: usize,
    pub skipped_files: usize,
}

impl FileStats {
    pub fn from_paths(files: &[PathBuf]) -> Self {
        let mut stats = Self::default();
        for file in files {
            match parse_path(file) {
                Ok(p) if p.is_values() => stats.values_files += 1,
                Ok(_) => stats.path_files += 1,
                Err(_) => stats.skipped_files += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.values_files + self.path_files + self.skipped_files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "<resources/>").unwrap();
        path
    }

    #[test]
    fn test_walk_keeps_root_order_and_dedupes() {
        let dir = TempDir::new().unwrap();
        let b = touch(dir.path(), "res/values/b.xml");
        let a = touch(dir.path(), "res/values/a.xml");
        let layout = touch(dir.path(), "res/layout/main.xml");

        let roots = vec![b.clone(), dir.path().join("res"), a.clone()];
        let files = walk_files(&roots).unwrap();
        assert_eq!(files, vec![b, layout, a]);
    }

    #[test]
    fn test_walk_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let err = walk_files(&[dir.path().join("nope")]).unwrap_err();
        assert!(err.to_string().contains("got error while walking"));
    }

    #[test]
    fn test_declaration_order_uses_nearest_ancestor() {
        let order = DeclarationOrder::new(&["/r/res", "/r/res/values/x.xml", "/q"]);
        assert_eq!(order.position(Path::new("/r/res/values/x.xml")), 1);
        assert_eq!(order.position(Path::new("/r/res/layout/y.xml")), 0);
        assert_eq!(order.position(Path::new("/q/res/values/z.xml")), 2);
        assert_eq!(order.position(Path::new("/elsewhere/z.xml")), 0);
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn test_file_stats() {
        let files = vec![
            PathBuf::from("res/values/strings.xml"),
            PathBuf::from("res/layout/main.xml"),
            PathBuf::from("README.md"),
        ];
        let stats = FileStats::from_paths(&files);
        assert_eq!(stats.values_files, 1);
        assert_eq!(stats.path_files, 1);
        assert_eq!(stats.skipped_files, 1);
        assert_eq!(stats.total(), 3);
    }
}
