use crate::render::cleanup::cleanup_text;
use crate::tree::{ContentTree, NodeKind, StructRole};
use crate::types::NodeId;

/// Render the content under `id` as Markdown: headings, paragraphs and
/// transcribed tables in document order.
pub fn render_blocks(tree: &ContentTree, id: NodeId) -> String {
    let mut output = String::new();
    push_blocks(tree, id, &mut output);
    output.trim_end().to_string()
}

fn push_blocks(tree: &ContentTree, id: NodeId, output: &mut String) {
    for &child in tree.children(id) {
        let Some(node) = tree.get(child) else {
            continue;
        };
        match &node.kind {
            NodeKind::Text(_) => {
                let text = cleanup_text(&tree.text_of(child));
                if !text.is_empty() {
                    output.push_str(&text);
                    output.push_str("\n\n");
                }
            }
            NodeKind::Struct(s) => match s.role {
                StructRole::Table => {
                    output.push_str(&render_table(tree, child));
                    output.push('\n');
                }
                StructRole::Heading(level) => {
                    let hashes = "#".repeat(level.clamp(1, 6) as usize);
                    output.push_str(&format!("{} {}\n\n", hashes, cleanup_text(&tree.text_of(child))));
                }
                _ => push_blocks(tree, child, output),
            },
            NodeKind::Vector(_) | NodeKind::GridInfo(_) => {}
        }
    }
}

/// Lay the cells of a transcribed table out on a dense grid.  Positions
/// covered by a spanning cell stay empty.
pub fn table_rows(tree: &ContentTree, table: NodeId) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<(usize, String)>> = Vec::new();
    let mut columns = 0;
    for &row in tree.children(table) {
        if tree.role(row) != Some(StructRole::TableRow) {
            continue;
        }
        let mut cells = Vec::new();
        for &cell in tree.children(row) {
            if let Some(StructRole::TableCell { col, cols, .. }) = tree.role(cell) {
                columns = columns.max(col + cols);
                cells.push((col, cleanup_text(&tree.text_of(cell))));
            }
        }
        rows.push(cells);
    }

    rows.into_iter()
        .map(|cells| {
            let mut dense = vec![String::new(); columns];
            for (col, text) in cells {
                dense[col] = text;
            }
            dense
        })
        .collect()
}

/// Render a transcribed table as a GitHub Markdown table.  The first row
/// becomes the header.
pub fn render_table(tree: &ContentTree, table: NodeId) -> String {
    let rows = table_rows(tree, table);
    let Some((header, body)) = rows.split_first() else {
        return String::new();
    };
    if header.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push('|');
    for h in header {
        out.push_str(&format!(" {} |", escape_markdown(h)));
    }
    out.push('\n');
    out.push('|');
    for _ in header {
        out.push_str(" --- |");
    }
    out.push('\n');
    for row in body {
        out.push('|');
        for cell in row {
            out.push_str(&format!(" {} |", escape_markdown(cell)));
        }
        out.push('\n');
    }
    out
}

/// Escape Markdown special characters in text.
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
