//! Build coordination: the single entry point of the pipeline.
//!
//! ```text
//! content/ ─┐
//!           ├─► Context ─► render ─► resolve paths ─► persist ─► build/
//! data/    ─┘     ▲
//!           version metadata
//! ```
//!
//! Each stage finishes before the next starts. Every failure before the
//! persist stage leaves the previous output tree untouched.

use crate::config::{ConfigError, SiteConfig};
use crate::content;
use crate::dataset::{self, DatasetError};
use crate::document::{ContentKind, DocumentError, HeaderParser, YamlFrontMatter};
use crate::paths;
use crate::persist::{self, PersistError};
use crate::render::{Context, Pulldown, RenderError, Renderer, TeraEngine};
use crate::version::{self, GitVersion, NoVersion, VersionResolver};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Collaborators a build can be run with.
pub struct BuildOptions {
    pub header_parser: Box<dyn HeaderParser>,
    pub version: Box<dyn VersionResolver>,
}

impl BuildOptions {
    /// YAML front matter, and git timestamps when `version.git` is on.
    pub fn from_config(config: &SiteConfig, root: &Path) -> Self {
        let version: Box<dyn VersionResolver> = if config.version.git {
            Box::new(GitVersion::new(root))
        } else {
            Box::new(NoVersion)
        };
        Self {
            header_parser: Box::new(YamlFrontMatter),
            version,
        }
    }
}

/// One written page: where it came from and where it went.
#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    pub source: PathBuf,
    /// Relative to the output root.
    pub output: PathBuf,
    pub kind: ContentKind,
}

/// Summary of a finished build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub output_root: PathBuf,
    pub pages: Vec<PageReport>,
    /// Dataset names with row counts.
    pub datasets: Vec<(String, usize)>,
    pub static_files: usize,
}

/// Build the site rooted at `root` with the default collaborators.
pub fn build(config: &SiteConfig, root: &Path) -> Result<BuildReport, BuildError> {
    build_with(config, root, &BuildOptions::from_config(config, root))
}

/// Build the site rooted at `root`.
pub fn build_with(
    config: &SiteConfig,
    root: &Path,
    options: &BuildOptions,
) -> Result<BuildReport, BuildError> {
    config.validate()?;
    config.paths.check_output(root)?;
    let paths = config.paths.resolve(root);
    let extensions = &config.render.template_extensions;

    tracing::info!(content = %paths.content.display(), "loading content");
    let (docs, data) = rayon::join(
        || content::load_documents(&paths.content, options.header_parser.as_ref(), extensions),
        || dataset::load_datasets(&paths.data),
    );
    let (docs, data) = (docs?, data?);
    tracing::info!(documents = docs.len(), datasets = data.len(), "content loaded");

    let docs = version::annotate(docs, &paths.content, options.version.as_ref());
    let context = Context { data, docs };

    let templates = TeraEngine::load(&paths.layouts)?;
    let mut renderer = Renderer::new(Pulldown, templates, config.render.page_layout.as_str());
    let rendered = renderer.render_all(&context)?;
    tracing::info!(documents = rendered.len(), "rendered");

    let resolved = paths::resolve_paths(rendered, &paths.output);
    let stats = persist::persist(&resolved, &paths.static_dir, &paths.output)?;
    tracing::info!(
        output = %paths.output.display(),
        documents = stats.documents,
        static_files = stats.static_files,
        "persisted"
    );

    let pages = resolved
        .iter()
        .map(|doc| PageReport {
            source: doc.source_path(),
            output: doc
                .output_path()
                .strip_prefix(&paths.output)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| doc.output_path()),
            kind: doc.kind,
        })
        .collect();
    let datasets = context
        .data
        .iter()
        .map(|(name, rows)| (name.clone(), rows.len()))
        .collect();

    Ok(BuildReport {
        output_root: paths.output,
        pages,
        datasets,
        static_files: stats.static_files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::fs;

    #[test]
    fn report_lists_pages_relative_to_output() {
        let site = SiteFixture::new()
            .layout("page.jinja2", "<main>{{ doc.body }}</main>")
            .content("index.md", "# Home")
            .content("blog/post.md", "post")
            .content("robots.txt", "User-agent: *");

        let report = site.build().unwrap();
        let outputs: Vec<String> = report
            .pages
            .iter()
            .map(|p| p.output.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            outputs,
            vec!["blog/post/index.html", "index.html", "robots.txt"]
        );
        assert_eq!(report.pages[2].kind, ContentKind::Passthrough);
        assert_eq!(report.output_root, site.output());
    }

    #[test]
    fn report_counts_datasets_and_static() {
        let site = SiteFixture::new()
            .data("team.csv", "name\nAda\nGrace\n")
            .asset("css/site.css", "body{}")
            .asset("js/app.js", "");

        let report = site.build().unwrap();
        assert_eq!(report.datasets, vec![("team".to_string(), 2)]);
        assert_eq!(report.static_files, 2);
    }

    #[test]
    fn invalid_config_rejected_before_any_io() {
        let site = SiteFixture::new().content("index.md", "x");
        let mut config = SiteConfig::default();
        config.paths.output = config.paths.content.clone();

        let result = build_with(&config, site.root(), &site.options());
        assert!(matches!(result, Err(BuildError::Config(_))));
        assert!(site.root().join("content/index.md").is_file());
    }

    #[test]
    fn output_over_sources_refused_without_touching_them() {
        for output in ["./content", ".", "content/build"] {
            let site = SiteFixture::new()
                .config(&format!("[paths]\noutput = \"{output}\"\n"))
                .layout("page.jinja2", "{{ doc.body }}")
                .content("notes.md", "keep me");

            let result = site.build();
            assert!(
                matches!(result, Err(BuildError::Config(_))),
                "{output} accepted"
            );
            assert!(site.root().join("content/notes.md").is_file());
            assert!(site.root().join("layouts/page.jinja2").is_file());
            assert!(site.root().join(crate::config::CONFIG_FILE_NAME).is_file());
        }
    }

    #[test]
    fn output_check_applies_to_configs_built_in_code() {
        let site = SiteFixture::new().content("notes.md", "keep me");
        let mut config = SiteConfig::default();
        config.paths.output = "..".to_string();

        let result = build_with(&config, site.root(), &site.options());
        assert!(matches!(result, Err(BuildError::Config(_))));
        assert!(site.root().join("content/notes.md").is_file());
    }

    #[test]
    fn dataset_error_aborts_before_persist() {
        let site = SiteFixture::new()
            .layout("page.jinja2", "{{ doc.body }}")
            .content("index.md", "x")
            .data("bad.csv", "a,b\n1\n");
        fs::create_dir_all(site.output()).unwrap();
        fs::write(site.output().join("keep.txt"), "previous").unwrap();

        let result = site.build();
        assert!(matches!(result, Err(BuildError::Dataset(_))));
        assert_eq!(
            fs::read_to_string(site.output().join("keep.txt")).unwrap(),
            "previous"
        );
    }

    #[test]
    fn missing_layouts_fail_only_for_markdown() {
        let site = SiteFixture::new().content("plain.txt", "hello");
        site.build().unwrap();

        let site = SiteFixture::new().content("page.md", "hello");
        let result = site.build();
        assert!(matches!(
            result,
            Err(BuildError::Render(RenderError::Template { .. }))
        ));
    }

    #[test]
    fn git_disabled_uses_no_version() {
        let site = SiteFixture::new()
            .layout("page.jinja2", "[{{ doc.metadata.last_modified | default(value='none') }}]")
            .content("index.md", "x");
        let mut config = SiteConfig::default();
        config.version.git = false;

        build(&config, site.root()).unwrap();
        assert_eq!(site.read_output("index.html"), "[none]");
    }
}
