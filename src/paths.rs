//! Output path resolution.
//!
//! Maps each rendered document from its place under the content root to its
//! place under the output root, applying the pretty-URL convention to HTML
//! pages so every page is served as a directory index:
//!
//! - `about.html` in `""` → `build/about/index.html` (served at `/about/`)
//! - `bar.html` in `foo` → `build/foo/bar/index.html`
//! - `index.html` in `""` → `build/index.html` (already an index, untouched)
//! - `feed.xml` in `blog` → `build/blog/feed.xml` (not HTML, untouched)
//!
//! Resolution runs after rendering, so `about.md` has already become
//! `about.html` and `index.md` has become `index.html`.

use crate::document::Document;
use std::path::Path;

pub const INDEX_FILE: &str = "index.html";

/// Resolve every document's output location under `output_root`.
pub fn resolve_paths(docs: Vec<Document>, output_root: &Path) -> Vec<Document> {
    docs.into_iter()
        .map(|doc| resolve_path(doc, output_root))
        .collect()
}

/// Move one document under `output_root`, slugging HTML pages.
pub fn resolve_path(mut doc: Document, output_root: &Path) -> Document {
    doc.output_dir = output_root.join(&doc.source_dir);
    if let Some(slug) = pretty_url_slug(&doc.output_file_name) {
        doc.output_dir.push(slug);
        doc.output_file_name = INDEX_FILE.to_string();
    }
    doc
}

/// The directory segment an HTML file name is rewritten into, or `None`
/// when the name is left alone.
///
/// - `"about.html"` → `Some("about")`
/// - `"release.v2.html"` → `Some("release.v2")`
/// - `"index.html"` → `None`
/// - `"style.css"` → `None`
pub fn pretty_url_slug(file_name: &str) -> Option<&str> {
    if file_name == INDEX_FILE {
        return None;
    }
    file_name
        .strip_suffix(".html")
        .filter(|stem| !stem.is_empty())
}
