//! Last-modified timestamps for documents.
//!
//! Before rendering, each document may be annotated with
//! `metadata.last_modified`, taken from the last git commit that touched its
//! source file. Anything that goes wrong here (git missing, not a
//! repository, file never committed) leaves the document unannotated; it
//! never fails the build.

use crate::document::{Document, LAST_MODIFIED_KEY};
use std::path::{Path, PathBuf};
use std::process::Command;

pub trait VersionResolver: Send + Sync {
    /// Timestamp string for `path`, or `None` when unknown.
    fn last_modified(&self, path: &Path) -> Option<String>;
}

/// Never knows anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVersion;

impl VersionResolver for NoVersion {
    fn last_modified(&self, _path: &Path) -> Option<String> {
        None
    }
}

/// Asks `git log` for the strict ISO-8601 commit date.
#[derive(Debug, Clone)]
pub struct GitVersion {
    repo_dir: PathBuf,
}

impl GitVersion {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    /// The pathspec handed to `git -C <repo_dir>`. Git resolves relative
    /// pathspecs against `repo_dir`, so paths already prefixed with it are
    /// made relative again.
    fn pathspec<'a>(&self, path: &'a Path) -> &'a Path {
        match path.strip_prefix(&self.repo_dir) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => path,
        }
    }
}

impl VersionResolver for GitVersion {
    fn last_modified(&self, path: &Path) -> Option<String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_dir)
            .args(["log", "-1", "--format=%cI", "--"])
            .arg(self.pathspec(path))
            .output();
        let output = match output {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                tracing::debug!(
                    path = %path.display(),
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "git log failed"
                );
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "git unavailable");
                return None;
            }
        };
        let stamp = String::from_utf8_lossy(&output.stdout).trim().to_string();
        // Untracked files produce empty output.
        (!stamp.is_empty()).then_some(stamp)
    }
}

/// Attach `last_modified` to every document that doesn't already set it in
/// its header. `content_root` locates source files on disk.
pub fn annotate(
    docs: Vec<Document>,
    content_root: &Path,
    resolver: &dyn VersionResolver,
) -> Vec<Document> {
    docs.into_iter()
        .map(|mut doc| {
            if !doc.metadata.contains_key(LAST_MODIFIED_KEY) {
                let path = content_root.join(doc.source_path());
                if let Some(stamp) = resolver.last_modified(&path) {
                    doc.metadata
                        .insert(LAST_MODIFIED_KEY.to_string(), serde_json::Value::String(stamp));
                }
            }
            doc
        })
        .collect()
}
