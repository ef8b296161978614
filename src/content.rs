//! Content tree discovery.
//!
//! Walks the content root and turns every regular file into a [`Document`].
//! Walk order is lexicographic by file name at each level, so two builds of
//! the same tree see documents in the same order.
//!
//! ```text
//! content/
//! ├── index.md          → Document { source_dir: "",     file: "index.md" }
//! ├── about.md          → Document { source_dir: "",     file: "about.md" }
//! └── blog/
//!     ├── first.md      → Document { source_dir: "blog", file: "first.md" }
//!     └── feed.jinja2   → Document { source_dir: "blog", file: "feed.jinja2" }
//! ```
//!
//! Dotfiles are content like anything else (`.well-known/security.txt`,
//! `.htaccess`); only version-control and OS bookkeeping entries are
//! skipped. Symlinks are followed. Any unreadable or malformed file aborts
//! the walk.

use crate::document::{self, Document, DocumentError, HeaderParser};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Entry names never treated as content.
const IGNORED_NAMES: &[&str] = &[".git", ".hg", ".svn", ".DS_Store", "Thumbs.db"];

/// Load every document under `root`, in deterministic order.
pub fn load_documents(
    root: &Path,
    parser: &dyn HeaderParser,
    template_extensions: &[String],
) -> Result<Vec<Document>, DocumentError> {
    let mut docs = Vec::new();
    for relative in collect_files(root)? {
        let doc = document::read_document(root, &relative, parser, template_extensions)?;
        tracing::debug!(source = %relative.display(), kind = ?doc.kind, "loaded document");
        docs.push(doc);
    }
    Ok(docs)
}

/// Relative paths of all regular, non-hidden files below `root`.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>, DocumentError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e));

    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf());
            DocumentError::Read {
                path,
                source: err.into(),
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| entry.path().to_path_buf());
        files.push(relative);
    }
    Ok(files)
}

fn is_ignored(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    IGNORED_NAMES.contains(&name.as_ref())
}
