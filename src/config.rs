//! Site configuration module.
//!
//! Handles loading, validating, and merging `site.toml`. The file lives in the
//! project root (the directory that contains `content/`, `layouts/`, and so
//! on) and is optional: stock defaults reproduce the conventional layout.
//!
//! ## Project Layout
//!
//! ```text
//! my-site/
//! ├── site.toml          # Optional overrides
//! ├── content/           # Documents: .md, .jinja2, anything else passes through
//! ├── layouts/           # Tera templates (page.jinja2 wraps Markdown pages)
//! ├── data/              # CSV/TSV datasets → context.data.<name>
//! ├── static/            # Copied verbatim to build/static/
//! └── build/             # Output, regenerated on every build
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! content = "content"
//! layouts = "layouts"
//! static = "static"
//! data = "data"
//! output = "build"
//!
//! [render]
//! page_layout = "page.jinja2"                # Layout wrapping Markdown pages
//! template_extensions = ["jinja2", "tera"]   # Documents rendered as templates
//!
//! [version]
//! git = true                # Annotate documents with git last-modified time
//!
//! [serve]
//! interface = "127.0.0.1"
//! port = 8000
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [paths]
//! output = "public"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Source and output directories, relative to the project root.
    pub paths: PathsConfig,
    /// Layout and template dispatch settings.
    pub render: RenderConfig,
    /// Last-modified annotation settings.
    pub version: VersionConfig,
    /// Development server settings.
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let paths = [
            ("paths.content", &self.paths.content),
            ("paths.layouts", &self.paths.layouts),
            ("paths.static", &self.paths.static_dir),
            ("paths.data", &self.paths.data),
            ("paths.output", &self.paths.output),
        ];
        for (key, value) in paths {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        // The output root is wiped on every build.
        let output = normalize_path(Path::new(&self.paths.output));
        for (key, value) in &paths[..4] {
            if normalize_path(Path::new(value)) == output {
                return Err(ConfigError::Validation(format!(
                    "paths.output must differ from {key} ({value})"
                )));
            }
        }
        if self.render.page_layout.trim().is_empty() {
            return Err(ConfigError::Validation(
                "render.page_layout must not be empty".into(),
            ));
        }
        if self.render.template_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "render.template_extensions must not be empty".into(),
            ));
        }
        if self
            .render
            .template_extensions
            .iter()
            .any(|ext| ext.is_empty() || ext.eq_ignore_ascii_case("md"))
        {
            return Err(ConfigError::Validation(
                "render.template_extensions must not contain \"md\" or empty entries".into(),
            ));
        }
        Ok(())
    }
}

/// Directory layout, each entry relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub content: String,
    pub layouts: String,
    #[serde(rename = "static")]
    pub static_dir: String,
    pub data: String,
    pub output: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: "content".to_string(),
            layouts: "layouts".to_string(),
            static_dir: "static".to_string(),
            data: "data".to_string(),
            output: "build".to_string(),
        }
    }
}

/// Resolved absolute-ish locations for one build.
#[derive(Debug, Clone, PartialEq)]
pub struct SitePaths {
    pub content: PathBuf,
    pub layouts: PathBuf,
    pub static_dir: PathBuf,
    pub data: PathBuf,
    pub output: PathBuf,
}

impl PathsConfig {
    /// Refuse an output root whose removal on rebuild would reach sources.
    ///
    /// Both sides are made absolute and normalized lexically, so `./content`,
    /// `.` and `..` are caught. The output root must not be or contain the
    /// project root or a source directory, and must not sit inside the
    /// content root.
    pub fn check_output(&self, root: &Path) -> Result<(), ConfigError> {
        let root = normalize_path(&std::path::absolute(root)?);
        let output = normalize_path(&root.join(&self.output));
        if root.starts_with(&output) {
            return Err(ConfigError::Validation(format!(
                "paths.output ({}) would remove the project root",
                self.output
            )));
        }
        let sources = [
            ("paths.content", &self.content),
            ("paths.layouts", &self.layouts),
            ("paths.static", &self.static_dir),
            ("paths.data", &self.data),
        ];
        for (key, value) in sources {
            if normalize_path(&root.join(value)).starts_with(&output) {
                return Err(ConfigError::Validation(format!(
                    "paths.output ({}) would remove {key} ({value})",
                    self.output
                )));
            }
        }
        if output.starts_with(normalize_path(&root.join(&self.content))) {
            return Err(ConfigError::Validation(format!(
                "paths.output ({}) must not be inside paths.content ({})",
                self.output, self.content
            )));
        }
        Ok(())
    }

    /// Join every configured directory onto the project root.
    pub fn resolve(&self, root: &Path) -> SitePaths {
        SitePaths {
            content: root.join(&self.content),
            layouts: root.join(&self.layouts),
            static_dir: root.join(&self.static_dir),
            data: root.join(&self.data),
            output: root.join(&self.output),
        }
    }
}

/// Rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Layout (relative to the layouts directory) that wraps Markdown pages.
    pub page_layout: String,
    /// File extensions (without the dot) whose body is itself a template.
    pub template_extensions: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_layout: "page.jinja2".to_string(),
            template_extensions: vec!["jinja2".to_string(), "tera".to_string()],
        }
    }
}

/// Last-modified annotation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersionConfig {
    /// Ask git for each document's last commit time.
    pub git: bool,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self { git: true }
    }
}

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    pub interface: String,
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Drop `.` segments and fold `..` into the preceding segment without
/// touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other),
        }
    }
    normalized
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `site.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `site.toml` in the given project root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    let config = resolve_config(base, overlay)?;
    config.paths.check_output(root)?;
    Ok(config)
}

/// Returns a fully-commented stock `site.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sitekiln configuration
# ======================
# Every key is optional. Delete what you don't change.

# ---------------------------------------------------------------------------
# Directories (relative to the directory holding this file)
# ---------------------------------------------------------------------------
[paths]
# Documents. Markdown (.md) is wrapped in the page layout, template files are
# rendered as themselves, everything else is copied unchanged.
content = "content"

# Tera templates. Inline templates may {% extends %} anything in here.
layouts = "layouts"

# Copied verbatim to <output>/<name of this directory>/.
static = "static"

# One CSV or TSV file per dataset, exposed as context.data.<file stem>.
data = "data"

# Removed and recreated on every build. Must not be a source directory.
output = "build"

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
# Layout that wraps Markdown pages. Receives `context` and `doc`;
# the converted HTML is in `doc.body`.
page_layout = "page.jinja2"

# Documents with these extensions are rendered as templates and renamed to .html.
template_extensions = ["jinja2", "tera"]

# ---------------------------------------------------------------------------
# Version metadata
# ---------------------------------------------------------------------------
[version]
# Store each document's last git commit time in doc.metadata.last_modified.
git = true

# ---------------------------------------------------------------------------
# Development server (`sitekiln serve`)
# ---------------------------------------------------------------------------
[serve]
interface = "127.0.0.1"
port = 8000
"##
}
