//! Document rendering.
//!
//! Every document is rendered according to its [`ContentKind`]:
//!
//! | Kind | Body becomes | Output name |
//! |------|--------------|-------------|
//! | Markdown | Markdown → HTML, then wrapped by the page layout | `about.md` → `about.html` |
//! | TemplateSource | the body rendered as a template of its own | `list.jinja2` → `list.html` |
//! | Passthrough | unchanged | unchanged |
//!
//! Both template paths receive two variables:
//!
//! - `context`: `{ data: { <dataset>: [records] }, docs: [documents] }`
//! - `doc`: the document being rendered (`doc.body` is already HTML for
//!   Markdown pages, `doc.metadata.*` holds its header)
//!
//! Inline templates share the layout environment, so a content file can
//! `{% extends "base.jinja2" %}` and fill in blocks instead of going through
//! the page layout.
//!
//! The Markdown converter and the template engine sit behind the
//! [`MarkdownConverter`] and [`TemplateEngine`] traits; production code uses
//! [`Pulldown`] and [`TeraEngine`].

use crate::dataset::Datasets;
use crate::document::{Body, ContentKind, Document};
use pulldown_cmark::{Options, Parser, html as md_html};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot load layouts from {path}: {source}")]
    Layouts {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },
    #[error("failed to render {document}: {source}")]
    Template {
        document: PathBuf,
        #[source]
        source: TemplateError,
    },
    #[error("cannot render {document}: body is not valid UTF-8")]
    NotText { document: PathBuf },
}

/// Failure reported by a [`TemplateEngine`]. The message carries the whole
/// cause chain, since engines nest the useful part several levels deep.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct TemplateError {
    pub message: String,
}

impl TemplateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn from_chain(err: &dyn std::error::Error) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self { message }
    }
}

/// Everything templates may read during one build.
#[derive(Debug, Default, Serialize)]
pub struct Context {
    pub data: Datasets,
    pub docs: Vec<Document>,
}

/// The variables handed to every template render.
#[derive(Debug, Serialize)]
pub struct TemplateVars<'a> {
    pub context: &'a Context,
    pub doc: &'a Document,
}

pub trait MarkdownConverter {
    fn to_html(&self, markdown: &str) -> String;
}

pub trait TemplateEngine {
    /// Render a named layout.
    fn render_layout(&self, name: &str, vars: &TemplateVars) -> Result<String, TemplateError>;
    /// Render template source that is not part of the layout set.
    fn render_inline(
        &mut self,
        source: &str,
        vars: &TemplateVars,
    ) -> Result<String, TemplateError>;
}

/// CommonMark plus tables, footnotes, strikethrough and task lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pulldown;

impl MarkdownConverter for Pulldown {
    fn to_html(&self, markdown: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;
        let parser = Parser::new_ext(markdown, options);
        let mut html = String::with_capacity(markdown.len() * 3 / 2);
        md_html::push_html(&mut html, parser);
        html
    }
}

/// Tera environment holding every file of the layouts directory.
///
/// Layout names are paths relative to the layouts directory with `/`
/// separators (`page.jinja2`, `partials/nav.jinja2`). Autoescaping is off:
/// `doc.body` is HTML by the time a layout sees it.
pub struct TeraEngine {
    tera: tera::Tera,
}

impl TeraEngine {
    /// Load all non-hidden files under `dir`. A missing directory yields an
    /// empty environment.
    pub fn load(dir: &Path) -> Result<Self, RenderError> {
        let layouts_err = |source: TemplateError| RenderError::Layouts {
            path: dir.to_path_buf(),
            source,
        };
        let mut templates = Vec::new();
        if dir.is_dir() {
            let walker = WalkDir::new(dir)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| {
                    e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')
                });
            for entry in walker {
                let entry = entry.map_err(|e| layouts_err(TemplateError::from_chain(&e)))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let name = entry
                    .path()
                    .strip_prefix(dir)
                    .unwrap_or(entry.path())
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                let source = fs::read_to_string(entry.path())
                    .map_err(|e| layouts_err(TemplateError::new(format!("{name}: {e}"))))?;
                templates.push((name, source));
            }
        } else {
            tracing::debug!(dir = %dir.display(), "no layouts directory");
        }
        Self::from_templates(templates).map_err(layouts_err)
    }

    /// Build an environment from `(name, source)` pairs.
    pub fn from_templates<N, S>(templates: Vec<(N, S)>) -> Result<Self, TemplateError>
    where
        N: AsRef<str>,
        S: AsRef<str>,
    {
        let mut tera = tera::Tera::default();
        tera.autoescape_on(vec![]);
        let raw: Vec<(&str, &str)> = templates
            .iter()
            .map(|(n, s)| (n.as_ref(), s.as_ref()))
            .collect();
        tera.add_raw_templates(raw)
            .map_err(|e| TemplateError::from_chain(&e))?;
        Ok(Self { tera })
    }

    pub fn template_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }

    fn tera_context(vars: &TemplateVars) -> Result<tera::Context, TemplateError> {
        tera::Context::from_serialize(vars).map_err(|e| TemplateError::from_chain(&e))
    }
}

impl TemplateEngine for TeraEngine {
    fn render_layout(&self, name: &str, vars: &TemplateVars) -> Result<String, TemplateError> {
        let ctx = Self::tera_context(vars)?;
        self.tera
            .render(name, &ctx)
            .map_err(|e| TemplateError::from_chain(&e))
    }

    fn render_inline(
        &mut self,
        source: &str,
        vars: &TemplateVars,
    ) -> Result<String, TemplateError> {
        let ctx = Self::tera_context(vars)?;
        self.tera
            .render_str(source, &ctx)
            .map_err(|e| TemplateError::from_chain(&e))
    }
}

/// Renders documents against a fully loaded [`Context`].
pub struct Renderer<M, T> {
    markdown: M,
    templates: T,
    page_layout: String,
}

impl<M: MarkdownConverter, T: TemplateEngine> Renderer<M, T> {
    pub fn new(markdown: M, templates: T, page_layout: impl Into<String>) -> Self {
        Self {
            markdown,
            templates,
            page_layout: page_layout.into(),
        }
    }

    /// Render one document, returning the rendered copy.
    ///
    /// `output_dir` is left alone; only `body` and `output_file_name` change.
    pub fn render(&mut self, doc: &Document, context: &Context) -> Result<Document, RenderError> {
        let mut rendered = doc.clone();
        match doc.kind {
            ContentKind::Markdown => {
                let html = self.markdown.to_html(body_text(doc)?);
                rendered.body = Body::Text(html);
                let vars = TemplateVars {
                    context,
                    doc: &rendered,
                };
                let page = self
                    .templates
                    .render_layout(&self.page_layout, &vars)
                    .map_err(|source| template_err(doc, source))?;
                rendered.body = Body::Text(page);
                rendered.output_file_name = html_file_name(&doc.output_file_name);
            }
            ContentKind::TemplateSource => {
                let vars = TemplateVars { context, doc };
                let page = self
                    .templates
                    .render_inline(body_text(doc)?, &vars)
                    .map_err(|source| template_err(doc, source))?;
                rendered.body = Body::Text(page);
                rendered.output_file_name = html_file_name(&doc.output_file_name);
            }
            ContentKind::Passthrough => {}
        }
        Ok(rendered)
    }

    /// Render every document in `context.docs`, stopping at the first failure.
    pub fn render_all(&mut self, context: &Context) -> Result<Vec<Document>, RenderError> {
        context
            .docs
            .iter()
            .map(|doc| {
                let rendered = self.render(doc, context)?;
                tracing::debug!(
                    source = %doc.source_path().display(),
                    output = %rendered.output_file_name,
                    "rendered document"
                );
                Ok(rendered)
            })
            .collect()
    }
}

fn body_text(doc: &Document) -> Result<&str, RenderError> {
    doc.body.as_text().ok_or_else(|| RenderError::NotText {
        document: doc.source_path(),
    })
}

fn template_err(doc: &Document, source: TemplateError) -> RenderError {
    RenderError::Template {
        document: doc.source_path(),
        source,
    }
}

/// Swap the final extension for `.html`: `notes.v2.md` → `notes.v2.html`.
fn html_file_name(file_name: &str) -> String {
    Path::new(file_name)
        .with_extension("html")
        .to_string_lossy()
        .to_string()
}
