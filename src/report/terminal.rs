use std::path::Path;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::models::{Annotation, AnnotationStatus, ProcessedLine};

/// Print the run summary to stderr so `--stdout` output stays clean.
pub fn render(lines: &[ProcessedLine], path: &Path, verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let annotations: Vec<&Annotation> = lines
        .iter()
        .filter_map(|l| l.annotation.as_ref())
        .collect();
    let count = |status: AnnotationStatus| {
        annotations
            .iter()
            .filter(|a| a.status == status)
            .count()
    };

    let added = count(AnnotationStatus::Added);
    let present = count(AnnotationStatus::Present);
    let unresolved = count(AnnotationStatus::Unresolved);

    if verbose && !annotations.is_empty() {
        eprintln!("{}", render_table(&annotations));
    }

    eprintln!(
        " {} {}  Dependencies: {}  Added: {}  Present: {}  Unresolved: {}",
        "✓".green(),
        path.display().to_string().bold(),
        annotations.len(),
        added.to_string().green(),
        present,
        unresolved.to_string().yellow(),
    );
}

fn render_table(annotations: &[&Annotation]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Source").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for annotation in annotations {
        let (status_str, status_color) = match annotation.status {
            AnnotationStatus::Added => ("+ added", Color::Green),
            AnnotationStatus::Present => ("= present", Color::Cyan),
            AnnotationStatus::Unresolved => ("? unresolved", Color::Yellow),
        };

        table.add_row(vec![
            Cell::new(&annotation.package),
            Cell::new(annotation.version.as_deref().unwrap_or("-")),
            Cell::new(annotation.license.as_deref().unwrap_or("unknown")),
            Cell::new(annotation.source.to_string()),
            Cell::new(status_str)
                .fg(status_color)
                .set_alignment(CellAlignment::Center),
        ]);
    }

    table
}
