//! Shared test utilities for the sitekiln test suite.
//!
//! [`SiteFixture`] lays out a throwaway project in a temp directory and
//! builds it with deterministic collaborators (no git lookups).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = SiteFixture::new()
//!     .layout("page.jinja2", "<main>{{ doc.body }}</main>")
//!     .content("about.md", "---\ntitle: About\n---\nHello")
//!     .asset("css/site.css", "body{}");
//!
//! site.build().unwrap();
//! assert!(site.read_output("about/index.html").contains("Hello"));
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::build::{self, BuildError, BuildOptions, BuildReport};
use crate::config;
use crate::document::YamlFrontMatter;
use crate::version::NoVersion;

// =========================================================================
// Fixture setup
// =========================================================================

/// A project directory with the stock layout (`content/`, `layouts/`,
/// `data/`, `static/`, output in `build/`).
pub struct SiteFixture {
    tmp: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn output(&self) -> PathBuf {
        self.root().join("build")
    }

    fn write(self, rel: impl AsRef<Path>, bytes: impl AsRef<[u8]>) -> Self {
        let path = self.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, bytes).unwrap();
        self
    }

    pub fn content(self, rel: &str, text: impl AsRef<[u8]>) -> Self {
        self.write(Path::new("content").join(rel), text)
    }

    pub fn layout(self, rel: &str, text: &str) -> Self {
        self.write(Path::new("layouts").join(rel), text)
    }

    pub fn data(self, rel: &str, text: &str) -> Self {
        self.write(Path::new("data").join(rel), text)
    }

    pub fn asset(self, rel: &str, text: impl AsRef<[u8]>) -> Self {
        self.write(Path::new("static").join(rel), text)
    }

    pub fn config(self, toml: &str) -> Self {
        self.write(config::CONFIG_FILE_NAME, toml)
    }

    /// Collaborators with no git lookups.
    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            header_parser: Box::new(YamlFrontMatter),
            version: Box::new(NoVersion),
        }
    }

    /// Load `site.toml` (if any) and build.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let config = config::load_config(self.root())?;
        build::build_with(&config, self.root(), &self.options())
    }

    // =========================================================================
    // Output inspection (panics with a clear message on miss)
    // =========================================================================

    /// Read an output file as text. Panics if missing.
    pub fn read_output(&self, rel: &str) -> String {
        let path = self.output().join(rel);
        fs::read_to_string(&path).unwrap_or_else(|e| {
            let files: Vec<String> = self.output_tree().keys().cloned().collect();
            panic!("output '{rel}' unreadable ({e}). Available: {files:?}")
        })
    }

    /// Every file under the output root, keyed by `/`-separated relative path.
    pub fn output_tree(&self) -> BTreeMap<String, Vec<u8>> {
        output_tree(&self.output())
    }
}

/// Snapshot of every file under `root`.
pub fn output_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut tree = BTreeMap::new();
    if !root.exists() {
        return tree;
    }
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.unwrap();
        if entry.file_type().is_file() {
            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/");
            tree.insert(rel, fs::read(entry.path()).unwrap());
        }
    }
    tree
}
