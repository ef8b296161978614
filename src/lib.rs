//! # sitekiln
//!
//! A small static site builder. A project is a handful of directories:
//! documents in `content/`, templates in `layouts/`, tables in `data/`, and
//! assets in `static/`. Every build regenerates `build/` from scratch.
//!
//! # Pipeline
//!
//! ```text
//! 1. Load      content/ + data/  →  Context     (documents, datasets)
//! 2. Annotate  Context           →  Context     (git last-modified)
//! 3. Render    Context           →  documents   (HTML or passthrough bodies)
//! 4. Resolve   documents         →  documents   (pretty-URL output paths)
//! 5. Persist   documents         →  build/      (wipe, static copy, write)
//! ```
//!
//! Stages run strictly in order and hand documents along by value. Rendering
//! starts only after every document and dataset is loaded, since any template
//! may look at any of them.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`build`] | Entry point: runs the stages, returns a [`build::BuildReport`] |
//! | [`document`] | `Document`, content kinds, YAML front-matter parsing |
//! | [`content`] | Walks the content root in deterministic order |
//! | [`dataset`] | CSV/TSV files → `context.data.<name>` |
//! | [`render`] | Markdown + page layout, inline templates, passthrough |
//! | [`paths`] | Content root → output root, `about.html` → `about/index.html` |
//! | [`persist`] | Rebuilds the output tree |
//! | [`version`] | Git last-modified timestamps |
//! | [`config`] | `site.toml` loading, merging, and validation |
//! | [`output`] | CLI build report |
//! | [`serve`] | Development server, one build per request |
//!
//! # Design Decisions
//!
//! ## Full Rebuilds Only
//!
//! The output directory is deleted and rewritten on every build. There is no
//! dependency tracking, so there are no stale pages: a deleted source file
//! disappears from the site on the next build. A failure before the persist
//! stage leaves the previous output alone.
//!
//! ## Content Kind From the File Name
//!
//! `.md` is Markdown, the configured template extensions (`.jinja2`,
//! `.tera`) are templates, everything else is copied. The kind is fixed when
//! the file is loaded; the renderer matches on it.
//!
//! ## Tera With Autoescaping Off
//!
//! Layouts receive already-rendered HTML in `doc.body`, so escaping would
//! undo the Markdown step. Templates are trusted project files.

pub mod build;
pub mod config;
pub mod content;
pub mod dataset;
pub mod document;
pub mod output;
pub mod paths;
pub mod persist;
pub mod render;
pub mod serve;
pub mod version;

#[cfg(test)]
pub(crate) mod test_helpers;
