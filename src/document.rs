//! Content documents and front-matter parsing.
//!
//! A document is one file under the content root: an optional YAML header
//! between `---` lines, followed by a body.
//!
//! ```text
//! ---
//! title: About
//! tags: [people, history]
//! ---
//! # About us
//! ```
//!
//! The body is kept verbatim; rendering happens later in [`crate::render`].
//! What a document renders *as* is decided once, here, from its file name
//! (see [`ContentKind`]).

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header key holding the last-modified timestamp, when known.
pub const LAST_MODIFIED_KEY: &str = "last_modified";

pub type Metadata = BTreeMap<String, serde_json::Value>;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed metadata header in {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        #[source]
        source: HeaderError,
    },
}

/// Why a header could not be parsed.
#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("header opened with `---` but never closed")]
    Unterminated,
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("header must be a mapping of keys to values")]
    NotAMapping,
}

/// How a document is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// `.md`: converted to HTML, then wrapped by the page layout.
    Markdown,
    /// A template extension: the body is its own template.
    TemplateSource,
    /// Anything else: copied unchanged.
    Passthrough,
}

impl ContentKind {
    /// Classify a file name. Extensions compare case-insensitively.
    pub fn from_file_name(file_name: &str, template_extensions: &[String]) -> Self {
        let ext = match Path::new(file_name).extension() {
            Some(ext) => ext.to_string_lossy().to_lowercase(),
            None => return ContentKind::Passthrough,
        };
        if ext == "md" {
            ContentKind::Markdown
        } else if template_extensions
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&ext))
        {
            ContentKind::TemplateSource
        } else {
            ContentKind::Passthrough
        }
    }
}

/// Document body: text for anything a template can see, raw bytes for
/// passthrough files that are not UTF-8.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Binary(Vec<u8>),
}

impl Body {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Text(text) => text.as_bytes(),
            Body::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            Body::Binary(_) => None,
        }
    }
}

// Templates see binary bodies as `none`.
impl Serialize for Body {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Body::Text(text) => serializer.serialize_str(text),
            Body::Binary(_) => serializer.serialize_none(),
        }
    }
}

/// One content item, from source location to resolved output location.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Containing directory relative to the content root (empty for the root).
    pub source_dir: PathBuf,
    pub source_file_name: String,
    pub kind: ContentKind,
    pub metadata: Metadata,
    pub body: Body,
    pub output_dir: PathBuf,
    pub output_file_name: String,
}

impl Document {
    pub fn new(
        source_dir: PathBuf,
        source_file_name: String,
        kind: ContentKind,
        metadata: Metadata,
        body: Body,
    ) -> Self {
        Self {
            output_dir: source_dir.clone(),
            output_file_name: source_file_name.clone(),
            source_dir,
            source_file_name,
            kind,
            metadata,
            body,
        }
    }

    /// Path relative to the content root, e.g. `blog/first.md`.
    pub fn source_path(&self) -> PathBuf {
        self.source_dir.join(&self.source_file_name)
    }

    /// Resolved output file path (meaningful once paths are resolved).
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file_name)
    }
}

/// Splits a file's text into header metadata and body.
pub trait HeaderParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<(Metadata, String), HeaderError>;
}

/// YAML front matter delimited by `---` lines (closing `...` also accepted).
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFrontMatter;

impl HeaderParser for YamlFrontMatter {
    fn parse(&self, text: &str) -> Result<(Metadata, String), HeaderError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let Some((first, rest)) = split_line(text) else {
            return Ok((Metadata::new(), text.to_string()));
        };
        if first.trim_end() != "---" {
            return Ok((Metadata::new(), text.to_string()));
        }

        let mut header_len = 0;
        let mut remaining = rest;
        while let Some((line, after)) = split_line(remaining) {
            let marker = line.trim_end();
            if marker == "---" || marker == "..." {
                let header = &rest[..header_len];
                return Ok((parse_yaml_header(header)?, after.to_string()));
            }
            header_len += remaining.len() - after.len();
            remaining = after;
        }
        Err(HeaderError::Unterminated)
    }
}

/// Split off the first line. The returned line excludes its terminator; the
/// remainder starts after it. `None` for empty input.
fn split_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    match text.find('\n') {
        Some(idx) => {
            let line = &text[..idx];
            Some((line.strip_suffix('\r').unwrap_or(line), &text[idx + 1..]))
        }
        None => Some((text, "")),
    }
}

fn parse_yaml_header(header: &str) -> Result<Metadata, HeaderError> {
    if header.trim().is_empty() {
        return Ok(Metadata::new());
    }
    let value: serde_yaml::Value = serde_yaml::from_str(header)?;
    match value {
        serde_yaml::Value::Null => Ok(Metadata::new()),
        serde_yaml::Value::Mapping(_) => Ok(serde_yaml::from_value(value)?),
        _ => Err(HeaderError::NotAMapping),
    }
}

/// Read one file under `content_root` into a [`Document`].
///
/// `relative` is the path below the content root. Passthrough files are
/// never header-parsed: their bytes are copied out exactly as read, and
/// those that are not valid UTF-8 are kept as [`Body::Binary`].
pub fn read_document(
    content_root: &Path,
    relative: &Path,
    parser: &dyn HeaderParser,
    template_extensions: &[String],
) -> Result<Document, DocumentError> {
    let path = content_root.join(relative);
    let file_name = relative
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let source_dir = relative.parent().map(Path::to_path_buf).unwrap_or_default();
    let kind = ContentKind::from_file_name(&file_name, template_extensions);

    let bytes = fs::read(&path).map_err(|source| DocumentError::Read {
        path: path.clone(),
        source,
    })?;

    let text = match String::from_utf8(bytes) {
        Ok(text) if kind == ContentKind::Passthrough => {
            let body = Body::Text(text);
            return Ok(Document::new(source_dir, file_name, kind, Metadata::new(), body));
        }
        Ok(text) => text,
        Err(err) if kind == ContentKind::Passthrough => {
            let body = Body::Binary(err.into_bytes());
            return Ok(Document::new(source_dir, file_name, kind, Metadata::new(), body));
        }
        Err(err) => {
            return Err(DocumentError::Read {
                path,
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, err.utf8_error()),
            });
        }
    };

    let (metadata, body) = parser
        .parse(&text)
        .map_err(|source| DocumentError::MetadataParse {
            path: path.clone(),
            source,
        })?;

    Ok(Document::new(
        source_dir,
        file_name,
        kind,
        metadata,
        Body::Text(body),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        vec!["jinja2".to_string(), "tera".to_string()]
    }

    // =========================================================================
    // Front matter
    // =========================================================================

    #[test]
    fn header_and_body_split() {
        let (meta, body) = YamlFrontMatter
            .parse("---\ntitle: Home\norder: 3\n---\n# Welcome\n")
            .unwrap();
        assert_eq!(meta["title"], "Home");
        assert_eq!(meta["order"], 3);
        assert_eq!(body, "# Welcome\n");
    }

    #[test]
    fn no_header_keeps_whole_file() {
        let text = "# Just markdown\n\nwith --- inside\n";
        let (meta, body) = YamlFrontMatter.parse(text).unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, text);
    }

    #[test]
    fn empty_file_has_empty_body() {
        let (meta, body) = YamlFrontMatter.parse("").unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, "");
    }

    #[test]
    fn empty_header_is_empty_mapping() {
        let (meta, body) = YamlFrontMatter.parse("---\n---\nbody").unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, "body");
    }

    #[test]
    fn body_kept_verbatim() {
        let (_, body) = YamlFrontMatter
            .parse("---\na: 1\n---\n\n  indented\n---\nmore\n")
            .unwrap();
        assert_eq!(body, "\n  indented\n---\nmore\n");
    }

    #[test]
    fn crlf_delimiters_accepted() {
        let (meta, body) = YamlFrontMatter
            .parse("---\r\ntitle: Win\r\n---\r\nbody\r\n")
            .unwrap();
        assert_eq!(meta["title"], "Win");
        assert_eq!(body, "body\r\n");
    }

    #[test]
    fn dots_close_header() {
        let (meta, body) = YamlFrontMatter.parse("---\ntitle: X\n...\nrest").unwrap();
        assert_eq!(meta["title"], "X");
        assert_eq!(body, "rest");
    }

    #[test]
    fn bom_is_ignored() {
        let (meta, _) = YamlFrontMatter.parse("\u{feff}---\ntitle: B\n---\n").unwrap();
        assert_eq!(meta["title"], "B");
    }

    #[test]
    fn header_at_end_of_file() {
        let (meta, body) = YamlFrontMatter.parse("---\ntitle: Only\n---").unwrap();
        assert_eq!(meta["title"], "Only");
        assert_eq!(body, "");
    }

    #[test]
    fn nested_values_survive() {
        let (meta, _) = YamlFrontMatter
            .parse("---\ntags: [a, b]\nauthor:\n  name: Ada\n---\n")
            .unwrap();
        assert_eq!(meta["tags"], serde_json::json!(["a", "b"]));
        assert_eq!(meta["author"]["name"], "Ada");
    }

    #[test]
    fn unterminated_header_is_error() {
        let result = YamlFrontMatter.parse("---\ntitle: Oops\n# body\n");
        assert!(matches!(result, Err(HeaderError::Unterminated)));
    }

    #[test]
    fn invalid_yaml_is_error() {
        let result = YamlFrontMatter.parse("---\ntitle: [unclosed\n---\n");
        assert!(matches!(result, Err(HeaderError::Yaml(_))));
    }

    #[test]
    fn scalar_header_is_error() {
        let result = YamlFrontMatter.parse("---\njust a string\n---\n");
        assert!(matches!(result, Err(HeaderError::NotAMapping)));
    }

    // =========================================================================
    // Content kinds
    // =========================================================================

    #[test]
    fn kind_from_extension() {
        assert_eq!(
            ContentKind::from_file_name("about.md", &exts()),
            ContentKind::Markdown
        );
        assert_eq!(
            ContentKind::from_file_name("list.jinja2", &exts()),
            ContentKind::TemplateSource
        );
        assert_eq!(
            ContentKind::from_file_name("feed.TERA", &exts()),
            ContentKind::TemplateSource
        );
        assert_eq!(
            ContentKind::from_file_name("robots.txt", &exts()),
            ContentKind::Passthrough
        );
        assert_eq!(
            ContentKind::from_file_name("CNAME", &exts()),
            ContentKind::Passthrough
        );
    }

    #[test]
    fn only_last_extension_counts() {
        assert_eq!(
            ContentKind::from_file_name("notes.md.txt", &exts()),
            ContentKind::Passthrough
        );
        assert_eq!(
            ContentKind::from_file_name("archive.2024.md", &exts()),
            ContentKind::Markdown
        );
    }

    // =========================================================================
    // read_document
    // =========================================================================

    #[test]
    fn read_document_sets_identity() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("blog")).unwrap();
        fs::write(tmp.path().join("blog/first.md"), "---\ntitle: First\n---\nHi").unwrap();

        let doc = read_document(
            tmp.path(),
            Path::new("blog/first.md"),
            &YamlFrontMatter,
            &exts(),
        )
        .unwrap();
        assert_eq!(doc.source_dir, PathBuf::from("blog"));
        assert_eq!(doc.source_file_name, "first.md");
        assert_eq!(doc.output_dir, doc.source_dir);
        assert_eq!(doc.output_file_name, doc.source_file_name);
        assert_eq!(doc.kind, ContentKind::Markdown);
        assert_eq!(doc.metadata["title"], "First");
        assert_eq!(doc.body, Body::Text("Hi".to_string()));
        assert_eq!(doc.source_path(), PathBuf::from("blog/first.md"));
    }

    #[test]
    fn read_document_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let result = read_document(tmp.path(), Path::new("nope.md"), &YamlFrontMatter, &exts());
        assert!(matches!(result, Err(DocumentError::Read { .. })));
    }

    #[test]
    fn read_document_bad_header_names_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.md"), "---\ntitle: x\n").unwrap();
        let err = read_document(tmp.path(), Path::new("bad.md"), &YamlFrontMatter, &exts())
            .unwrap_err();
        assert!(matches!(err, DocumentError::MetadataParse { .. }));
        assert!(err.to_string().contains("bad.md"));
    }

    #[test]
    fn binary_passthrough_kept_as_bytes() {
        let tmp = TempDir::new().unwrap();
        let bytes = vec![0x89, b'P', b'N', b'G', 0xff, 0x00, 0xfe];
        fs::write(tmp.path().join("logo.png"), &bytes).unwrap();
        let doc =
            read_document(tmp.path(), Path::new("logo.png"), &YamlFrontMatter, &exts()).unwrap();
        assert_eq!(doc.body, Body::Binary(bytes));
        assert!(doc.metadata.is_empty());
    }

    #[test]
    fn passthrough_header_left_in_body() {
        let tmp = TempDir::new().unwrap();
        let text = "---\nnot: parsed\n---\n{}";
        fs::write(tmp.path().join("raw.json"), text).unwrap();
        let doc =
            read_document(tmp.path(), Path::new("raw.json"), &YamlFrontMatter, &exts()).unwrap();
        assert_eq!(doc.body, Body::Text(text.to_string()));
        assert!(doc.metadata.is_empty());
    }

    #[test]
    fn binary_markdown_is_read_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.md"), [0xff, 0xfe, 0x00]).unwrap();
        let result =
            read_document(tmp.path(), Path::new("broken.md"), &YamlFrontMatter, &exts());
        assert!(matches!(result, Err(DocumentError::Read { .. })));
    }

    #[test]
    fn binary_body_serializes_as_null() {
        let json = serde_json::to_value(Body::Binary(vec![1, 2, 3])).unwrap();
        assert!(json.is_null());
        let json = serde_json::to_value(Body::Text("x".into())).unwrap();
        assert_eq!(json, "x");
    }
}
