// src/report.rs

//! Tabulates classified records and writes them out.
//!
//! The primary artifact is a standalone HTML document with one table per
//! view. If it cannot be written, the detail rows go to a CSV file beside it.

use crate::error::{AuditError, Result};
use crate::model::{Category, ClassifiedRecord, PatchType};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::hash::Hash;
use std::path::{Path, PathBuf};

/// Longest text a spreadsheet cell accepts
pub const MAX_CELL_CHARS: usize = 32767;
const TRUNCATED_CHARS: usize = 32760;
const TRUNCATION_MARK: &str = "...[truncated]";

pub const DETAIL_COLUMNS: [&str; 9] = [
    "Commit",
    "Author",
    "Date",
    "Subject",
    "Full message",
    "Changed files",
    "File stats",
    "Category",
    "Type",
];

/// Records plus their category and type tallies
pub struct Report<'a> {
    pub records: &'a [ClassifiedRecord],
    pub category_counts: Vec<(Category, usize)>,
    pub type_counts: Vec<(PatchType, usize)>,
}

impl<'a> Report<'a> {
    pub fn new(records: &'a [ClassifiedRecord]) -> Self {
        Self {
            category_counts: tally(records.iter().map(|r| r.category), Category::label),
            type_counts: tally(records.iter().map(|r| r.patch_type), PatchType::label),
            records,
        }
    }

    pub fn records_in(&self, category: Category) -> impl Iterator<Item = &ClassifiedRecord> {
        self.records.iter().filter(move |r| r.category == category)
    }
}

/// Counts sorted by count descending, then label ascending
fn tally<K: Copy + Eq + Hash>(keys: impl Iterator<Item = K>, label: fn(K) -> &'static str) -> Vec<(K, usize)> {
    let mut counts: HashMap<K, usize> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut counts: Vec<(K, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| label(a.0).cmp(label(b.0))));
    counts
}

/// Strips control characters other than tab and line breaks, and caps the length.
pub fn clean_cell(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|&c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();

    if cleaned.chars().count() > MAX_CELL_CHARS {
        let mut truncated: String = cleaned.chars().take(TRUNCATED_CHARS).collect();
        truncated.push_str(TRUNCATION_MARK);
        truncated
    } else {
        cleaned
    }
}

fn detail_row(record: &ClassifiedRecord) -> [String; 9] {
    let stats: Vec<String> = record.detail.file_stats.iter().map(|s| s.to_string()).collect();
    [
        record.commit.id.clone(),
        clean_cell(&record.commit.author),
        record.commit.date.clone(),
        clean_cell(&record.commit.subject),
        clean_cell(&record.detail.full_message),
        clean_cell(&record.detail.changed_files.join(", ")),
        clean_cell(&stats.join(", ")),
        record.category.label().to_string(),
        record.patch_type.label().to_string(),
    ]
}

/// Turns a report into file contents
pub trait Renderer {
    fn extension(&self) -> &'static str;

    fn render(&self, report: &Report<'_>) -> Result<String>;
}

pub struct HtmlRenderer;

impl HtmlRenderer {
    fn table<R: AsRef<str>>(out: &mut String, title: &str, headers: &[&str], rows: impl Iterator<Item = Vec<R>>) -> std::fmt::Result {
        writeln!(out, "<section>\n<h2>{}</h2>\n<table>\n<thead><tr>", escape_html(title))?;
        for header in headers {
            write!(out, "<th>{}</th>", escape_html(header))?;
        }
        writeln!(out, "</tr></thead>\n<tbody>")?;
        for row in rows {
            out.push_str("<tr>");
            for cell in &row {
                write!(out, "<td>{}</td>", escape_html(cell.as_ref()))?;
            }
            out.push_str("</tr>\n");
        }
        writeln!(out, "</tbody>\n</table>\n</section>")
    }
}

impl Renderer for HtmlRenderer {
    fn extension(&self) -> &'static str {
        "html"
    }

    fn render(&self, report: &Report<'_>) -> Result<String> {
        let mut out = String::new();
        render_html(&mut out, report).map_err(|e| AuditError::render(format!("HTML formatting failed: {e}")))?;
        Ok(out)
    }
}

fn render_html(out: &mut String, report: &Report<'_>) -> std::fmt::Result {
    out.push_str(HTML_HEAD);

    HtmlRenderer::table(
        out,
        "Unique patches",
        &DETAIL_COLUMNS,
        report.records.iter().map(|r| detail_row(r).to_vec()),
    )?;
    HtmlRenderer::table(
        out,
        "By category",
        &["Category", "Count"],
        report.category_counts.iter().map(|(c, n)| vec![c.label().to_string(), n.to_string()]),
    )?;
    HtmlRenderer::table(
        out,
        "By type",
        &["Type", "Count"],
        report.type_counts.iter().map(|(t, n)| vec![t.label().to_string(), n.to_string()]),
    )?;
    for (category, _) in &report.category_counts {
        HtmlRenderer::table(
            out,
            &format!("{} unique patches", category.label()),
            &DETAIL_COLUMNS,
            report.records_in(*category).map(|r| detail_row(r).to_vec()),
        )?;
    }

    out.push_str("</body>\n</html>\n");
    Ok(())
}

const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Unique patch report</title>
<style>
body { font-family: sans-serif; margin: 2em; }
table { border-collapse: collapse; margin-bottom: 2em; }
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; vertical-align: middle; white-space: pre-wrap; max-width: 60em; }
th { font-weight: bold; background: #f4f4f4; }
</style>
</head>
<body>
"#;

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Detail rows only, RFC 4180 quoting, with a BOM so spreadsheet tools detect UTF-8
pub struct CsvRenderer;

impl Renderer for CsvRenderer {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn render(&self, report: &Report<'_>) -> Result<String> {
        let mut out = String::from("\u{feff}");
        push_csv_row(&mut out, DETAIL_COLUMNS.iter().copied());
        for record in report.records {
            let row = detail_row(record);
            push_csv_row(&mut out, row.iter().map(String::as_str));
        }
        Ok(out)
    }
}

fn push_csv_row<'s>(out: &mut String, cells: impl Iterator<Item = &'s str>) {
    let line: Vec<String> = cells.map(csv_field).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

fn csv_field(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn write_with(renderer: &dyn Renderer, report: &Report<'_>, path: &Path) -> Result<()> {
    let contents = renderer.render(report)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Writes the HTML report to `path`, falling back to CSV beside it.
///
/// Returns the path actually written.
pub fn write_report(report: &Report<'_>, path: &Path) -> Result<PathBuf> {
    write_report_with(&HtmlRenderer, &CsvRenderer, report, path)
}

pub fn write_report_with(
    primary: &dyn Renderer,
    fallback: &dyn Renderer,
    report: &Report<'_>,
    path: &Path,
) -> Result<PathBuf> {
    let primary_err = match write_with(primary, report, path) {
        Ok(()) => return Ok(path.to_path_buf()),
        Err(e) => e,
    };
    tracing::warn!(path = %path.display(), "primary report failed: {}", primary_err);

    let fallback_path = path.with_extension(fallback.extension());
    match write_with(fallback, report, &fallback_path) {
        Ok(()) => {
            tracing::info!(path = %fallback_path.display(), "wrote fallback report");
            Ok(fallback_path)
        }
        Err(fallback_err) => Err(AuditError::NoOutput {
            primary: primary_err.to_string(),
            fallback: fallback_err.to_string(),
        }),
    }
}

/// `<source>-to-<target>-diff.html`, with unsafe file name characters replaced
pub fn default_output_path(source: &str, target: &str) -> PathBuf {
    PathBuf::from(format!("{}-to-{}-diff.html", safe_name(source), safe_name(target)))
}

pub fn safe_name(reference: &str) -> String {
    reference
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect()
}
