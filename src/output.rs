//! CLI output formatting for builds.
//!
//! # Output Format
//!
//! ```text
//! Pages
//! 001 about.md → about/index.html
//! 002 blog/archive.jinja2 → blog/archive/index.html (template)
//! 003 index.md → index.html
//!
//! Files
//! 001 robots.txt → robots.txt
//!
//! Data
//! 001 team (3 rows)
//!
//! Static
//!     2 files → static/
//!
//! Built 3 pages, 1 file, 1 dataset, 2 static files → build
//! ```
//!
//! Sections with nothing in them are omitted. Format functions are pure and
//! return `Vec<String>` for testability; `print_*` wrappers write to stdout.

use crate::build::{BuildReport, PageReport};
use crate::document::ContentKind;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 page`, `2 pages`.
fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// Forward slashes regardless of platform.
fn display_path(path: &std::path::Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn page_line(index: usize, page: &PageReport) -> String {
    let suffix = match page.kind {
        ContentKind::TemplateSource => " (template)",
        ContentKind::Markdown | ContentKind::Passthrough => "",
    };
    format!(
        "{} {} → {}{}",
        format_index(index),
        display_path(&page.source),
        display_path(&page.output),
        suffix
    )
}

// ============================================================================
// Build output
// ============================================================================

/// Format the result of a build.
pub fn format_build_output(report: &BuildReport, static_dir_name: &str) -> Vec<String> {
    let mut lines = Vec::new();

    let (pages, files): (Vec<&PageReport>, Vec<&PageReport>) = report
        .pages
        .iter()
        .partition(|p| p.kind != ContentKind::Passthrough);

    let mut section = |title: &str, body: Vec<String>| {
        if body.is_empty() {
            return;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(title.to_string());
        lines.extend(body);
    };

    section(
        "Pages",
        pages
            .iter()
            .enumerate()
            .map(|(i, p)| page_line(i + 1, p))
            .collect(),
    );
    section(
        "Files",
        files
            .iter()
            .enumerate()
            .map(|(i, p)| page_line(i + 1, p))
            .collect(),
    );
    section(
        "Data",
        report
            .datasets
            .iter()
            .enumerate()
            .map(|(i, (name, rows))| {
                format!("{} {} ({})", format_index(i + 1), name, plural(*rows, "row", "rows"))
            })
            .collect(),
    );
    if report.static_files > 0 {
        section(
            "Static",
            vec![format!(
                "{}{} → {}/",
                indent(1),
                plural(report.static_files, "file", "files"),
                static_dir_name
            )],
        );
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Built {}, {}, {}, {} → {}",
        plural(pages.len(), "page", "pages"),
        plural(files.len(), "file", "files"),
        plural(report.datasets.len(), "dataset", "datasets"),
        plural(report.static_files, "static file", "static files"),
        report.output_root.display()
    ));
    lines
}

/// Print build output to stdout.
pub fn print_build_output(report: &BuildReport, static_dir_name: &str) {
    for line in format_build_output(report, static_dir_name) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn page(source: &str, output: &str, kind: ContentKind) -> PageReport {
        PageReport {
            source: PathBuf::from(source),
            output: PathBuf::from(output),
            kind,
        }
    }

    fn report() -> BuildReport {
        BuildReport {
            output_root: PathBuf::from("build"),
            pages: vec![
                page("about.md", "about/index.html", ContentKind::Markdown),
                page(
                    "blog/archive.jinja2",
                    "blog/archive/index.html",
                    ContentKind::TemplateSource,
                ),
                page("index.md", "index.html", ContentKind::Markdown),
                page("robots.txt", "robots.txt", ContentKind::Passthrough),
            ],
            datasets: vec![("team".to_string(), 3)],
            static_files: 2,
        }
    }

    #[test]
    fn full_build_output() {
        let lines = format_build_output(&report(), "static");
        assert_eq!(
            lines,
            vec![
                "Pages",
                "001 about.md → about/index.html",
                "002 blog/archive.jinja2 → blog/archive/index.html (template)",
                "003 index.md → index.html",
                "",
                "Files",
                "001 robots.txt → robots.txt",
                "",
                "Data",
                "001 team (3 rows)",
                "",
                "Static",
                "    2 files → static/",
                "",
                "Built 3 pages, 1 file, 1 dataset, 2 static files → build",
            ]
        );
    }

    #[test]
    fn empty_sections_omitted() {
        let empty = BuildReport {
            output_root: PathBuf::from("public"),
            pages: vec![],
            datasets: vec![],
            static_files: 0,
        };
        let lines = format_build_output(&empty, "static");
        assert_eq!(
            lines,
            vec!["Built 0 pages, 0 files, 0 datasets, 0 static files → public"]
        );
    }

    #[test]
    fn single_row_dataset_is_singular() {
        let mut r = report();
        r.datasets = vec![("one".to_string(), 1)];
        let lines = format_build_output(&r, "static");
        assert!(lines.contains(&"001 one (1 row)".to_string()));
    }
}
