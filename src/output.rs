//! CLI output formatting.
//!
//! Each listing has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure.
//!
//! # Output Format
//!
//! ## Operations
//!
//! ```text
//! bgRemove (background-removal)
//!     bgRemove (background-removal)
//! crop
//!     crop: x1, y1, x2, y2
//! ```
//!
//! ## Batch
//!
//! ```text
//! ok    jobs/half.json → out/half.response.json
//! 400   jobs/bad.json → out/bad.response.json
//!     The action category: "warp" is invalid.
//!
//! Ran 2 requests: 1 succeeded, 1 failed
//! ```

use crate::artifact::ImageArtifact;
use crate::batch::{BatchItem, BatchReport};
use crate::schema::CategoryDescription;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `name` alone when the alias adds nothing, else `name (alias)`.
fn named(name: &str, alias: &str) -> String {
    if name == alias {
        name.to_string()
    } else {
        format!("{name} ({alias})")
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Operations listing
// ============================================================================

/// One header line per category, one indented line per operation with its
/// parameter names.
pub fn format_operations(categories: &[CategoryDescription]) -> Vec<String> {
    let mut lines = Vec::new();
    for category in categories {
        lines.push(named(category.category, category.alias));
        for op in &category.operations {
            let mut line = format!("{}{}", indent(1), named(op.operation, op.alias));
            if let Some(params) = &op.parameters {
                line.push_str(&format!(": {}", params.join(", ")));
            }
            lines.push(line);
        }
    }
    lines
}

pub fn print_operations(categories: &[CategoryDescription]) {
    for line in format_operations(categories) {
        println!("{}", line);
    }
}

// ============================================================================
// Single edit
// ============================================================================

/// Summary of a locally applied edit.
///
/// ```text
/// photo.png (640x480) → thumb.png (320x240, PNG, 10432 bytes)
/// ```
pub fn format_apply_result(
    input: &Path,
    output: &Path,
    before: (u32, u32),
    result: &ImageArtifact,
    bytes: usize,
) -> String {
    format!(
        "{} ({}x{}) → {} ({}x{}, {}, {} bytes)",
        input.display(),
        before.0,
        before.1,
        output.display(),
        result.width(),
        result.height(),
        result.format().name(),
        bytes
    )
}

// ============================================================================
// Batch
// ============================================================================

fn batch_item_lines(item: &BatchItem) -> Vec<String> {
    let status = if item.succeeded() {
        "ok".to_string()
    } else {
        item.status.to_string()
    };
    let mut lines = vec![format!(
        "{:<5} {} → {}",
        status,
        item.request.display(),
        item.response.display()
    )];
    if let Some(error) = &item.error {
        lines.push(format!("{}{}", indent(1), error));
    }
    lines
}

pub fn format_batch_report(report: &BatchReport) -> Vec<String> {
    let mut lines: Vec<String> = report.items.iter().flat_map(batch_item_lines).collect();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Ran {}: {} succeeded, {} failed",
        plural(report.items.len(), "request"),
        report.succeeded(),
        report.failed()
    ));
    lines
}

pub fn print_batch_report(report: &BatchReport) {
    for line in format_batch_report(report) {
        println!("{}", line);
    }
}
