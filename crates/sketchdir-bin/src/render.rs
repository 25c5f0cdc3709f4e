use std::fmt::Write;

use sketchdir_core::{DiagramDocument, Row};
use sketchdir_platform::HandleKind;

/// Indented listing of the visible rows under the root folder name
pub fn tree(root: &str, rows: &[Row]) -> String {
    let mut out = format!("{}/\n", root);
    if rows.is_empty() {
        out.push_str("  (no diagrams yet)\n");
        return out;
    }
    for row in rows {
        let indent = "  ".repeat(usize::from(row.depth) + 1);
        let marker = match (row.kind, row.is_expanded) {
            (HandleKind::Directory, true) => "- ",
            (HandleKind::Directory, false) => "+ ",
            (HandleKind::File, _) => "  ",
        };
        let slash = if row.kind == HandleKind::Directory { "/" } else { "" };
        let selected = if row.is_selected { "  *" } else { "" };
        let _ = writeln!(out, "{}{}{}{}{}", indent, marker, row.name, slash, selected);
    }
    out
}

pub fn document_summary(node: &str, doc: &DiagramDocument) -> String {
    format!(
        "{}: {} elements, {} files, background {}",
        node,
        doc.elements.len(),
        doc.files.len(),
        doc.background().unwrap_or("unset")
    )
}
