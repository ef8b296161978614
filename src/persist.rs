//! Output tree materialization.
//!
//! The output root is rebuilt from nothing on every build:
//!
//! 1. remove the output root if it exists
//! 2. create it empty
//! 3. copy the static directory to `<output>/<static dir name>/`
//! 4. write each document to its resolved path, creating parents
//!
//! Nothing from a previous build survives. A failure partway through leaves
//! the output root incomplete; the error names the path that failed.

use crate::document::Document;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("cannot write {path}: {source}")]
pub struct PersistError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

trait PersistContext<T> {
    fn at(self, path: &Path) -> Result<T, PersistError>;
}

impl<T> PersistContext<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T, PersistError> {
        self.map_err(|source| PersistError {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Counts of what was written.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PersistStats {
    pub static_files: usize,
    pub documents: usize,
}

/// Rebuild `output_root` from `static_dir` and the resolved documents.
pub fn persist(
    docs: &[Document],
    static_dir: &Path,
    output_root: &Path,
) -> Result<PersistStats, PersistError> {
    if output_root.exists() {
        fs::remove_dir_all(output_root).at(output_root)?;
    }
    fs::create_dir_all(output_root).at(output_root)?;

    let mut stats = PersistStats::default();
    if static_dir.is_dir() {
        let name = static_dir.file_name().unwrap_or(static_dir.as_os_str());
        let target = output_root.join(name);
        fs::create_dir_all(&target).at(&target)?;
        stats.static_files = copy_dir_recursive(static_dir, &target)?;
    } else {
        tracing::debug!(dir = %static_dir.display(), "no static directory");
    }

    let mut written: HashSet<PathBuf> = HashSet::new();
    for doc in docs {
        let path = doc.output_path();
        fs::create_dir_all(&doc.output_dir).at(&doc.output_dir)?;
        fs::write(&path, doc.body.as_bytes()).at(&path)?;
        if !written.insert(path.clone()) {
            tracing::warn!(
                path = %path.display(),
                source = %doc.source_path().display(),
                "output path written twice, later document wins"
            );
        }
        stats.documents += 1;
    }
    Ok(stats)
}

/// Copy `src` into `dst` recursively, returning the number of files copied.
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<usize, PersistError> {
    let mut entries = fs::read_dir(src)
        .at(src)?
        .collect::<std::io::Result<Vec<_>>>()
        .at(src)?;
    entries.sort_by_key(|e| e.file_name());

    let mut copied = 0;
    for entry in entries {
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path).at(&dst_path)?;
            copied += copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path).at(&dst_path)?;
            copied += 1;
        }
    }
    Ok(copied)
}
