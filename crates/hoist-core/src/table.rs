//! Tabular rendering of service query results.

use crate::types::{META_BUILD, META_GROUP, META_OWNER, META_STATUS, ServiceDescription};

pub const HEADERS: [&str; 6] = ["NAME", "VERSION", "SOURCE", "STATUS", "BUILD", "METADATA"];

/// Shown in place of empty fields.
pub const EMPTY_FIELD: &str = "n/a";

/// Render services as a table sorted by name.
///
/// Returns an empty string when there is nothing to show.
pub fn render(services: &[ServiceDescription]) -> String {
    if services.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<&ServiceDescription> = services.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut rows = vec![HEADERS.map(str::to_string)];
    rows.extend(sorted.into_iter().map(row));

    let mut widths = [0usize; HEADERS.len()];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in &rows {
        let last = row.len() - 1;
        for (i, cell) in row.iter().enumerate() {
            if i == last {
                out.push_str(cell);
            } else {
                out.push_str(&format!("{:<width$} ", cell, width = widths[i]));
            }
        }
        out.push('\n');
    }
    out
}

fn row(service: &ServiceDescription) -> [String; 6] {
    [
        field(&service.name),
        field(&service.version),
        field(&service.source),
        field(service.meta(META_STATUS)),
        field(service.meta(META_BUILD)),
        format!(
            "owner={},group={}",
            field(service.meta(META_OWNER)),
            field(service.meta(META_GROUP))
        ),
    ]
}

fn field(value: &str) -> String {
    if value.is_empty() {
        EMPTY_FIELD.to_string()
    } else {
        value.to_string()
    }
}
