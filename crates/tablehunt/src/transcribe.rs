//! Transcription: rewrites a settled grid into Table → Row → Cell nodes and
//! moves the covered content into the cells.

use log::debug;

use crate::config::HuntConfig;
use crate::grid::{Grid, GridContext, GridInfo};
use crate::tree::{ContentTree, NodeKind, StructRole};
use crate::types::{NodeId, Rect};

/// Extent of one emitted cell, in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    cols: usize,
    rows: usize,
}

fn row_has_content(grid: &Grid, y: usize) -> bool {
    (0..grid.width() - 1).any(|x| {
        let cell = grid.cell(x, y);
        cell.full || cell.h_line > 0 || cell.v_line > 0
    })
}

/// Grow a cell right across uncertain, crossed column dividers, then down
/// across uncertain row dividers crossed along the whole width.  Inside a
/// flattened box confirmed dividers are crossed too, as long as no ruling
/// lies on them.
fn span_at(grid: &Grid, x: usize, y: usize, emitted: &[bool]) -> Span {
    let (w, h) = (grid.width(), grid.height());
    let taken = |cx: usize, cy: usize| emitted[cy * w + cx];
    let flat = grid.cell(x, y).flat;

    let mut cols = 1;
    while x + cols < w - 1 {
        let k = x + cols;
        let cell = grid.cell(k, y);
        let open = !grid.xpos()[k].is_confirmed() || (flat && cell.flat && cell.v_line == 0);
        if !open || cell.v_crossed == 0 || taken(k, y) {
            break;
        }
        cols += 1;
    }

    let mut rows = 1;
    'grow: while y + rows < h - 1 {
        let k = y + rows;
        let open = !grid.ypos()[k].is_confirmed()
            || (flat
                && (x..x + cols).all(|cx| {
                    let cell = grid.cell(cx, k);
                    cell.flat && cell.h_line == 0
                }));
        if !open {
            break;
        }
        for cx in x..x + cols {
            let cell = grid.cell(cx, k);
            if cell.h_crossed == 0 || taken(cx, k) || (cx > x && cell.v_crossed == 0) {
                break 'grow;
            }
        }
        rows += 1;
    }

    Span { cols, rows }
}

enum Part {
    Group,
    Text,
    Vector,
}

/// Move everything under `parent` that lies in `rect` into `cell`.  Text
/// blocks straddling the rectangle are split character by character.
fn relocate(tree: &mut ContentTree, parent: NodeId, rect: Rect, cell: NodeId, wiggle: f64) {
    let area = rect.expand(wiggle);
    for child in tree.children(parent).to_vec() {
        let bbox = tree.bbox(child);
        let part = match tree.get(child).map(|n| &n.kind) {
            Some(NodeKind::Struct(s)) if s.role.is_table_part() => continue,
            Some(NodeKind::GridInfo(_)) | None => continue,
            Some(NodeKind::Struct(_)) => Part::Group,
            Some(NodeKind::Text(_)) => Part::Text,
            Some(NodeKind::Vector(_)) => Part::Vector,
        };
        match part {
            Part::Group => {
                if area.contains_rect(&bbox) {
                    tree.move_node(child, cell);
                } else if rect.intersects(&bbox) {
                    relocate(tree, child, rect, cell, wiggle);
                }
            }
            Part::Text => {
                if area.contains_rect(&bbox) {
                    tree.move_node(child, cell);
                } else if rect.intersects(&bbox) {
                    if let Some(block) = tree.take_text_within(child, rect) {
                        let part_bbox = block.bbox().unwrap_or(rect);
                        let part = tree.alloc(NodeKind::Text(block), part_bbox);
                        tree.append_child(cell, part);
                    }
                }
            }
            Part::Vector => {
                let (cx, cy) = bbox.center();
                if rect.contains_point(cx, cy) {
                    tree.move_node(child, cell);
                }
            }
        }
    }
}

/// Write the grid of `ctx` into the tree below `scope` and return the new
/// Table node.  Its first child is the grid-info record.
pub(crate) fn transcribe(
    tree: &mut ContentTree,
    scope: NodeId,
    ctx: &GridContext,
    config: &HuntConfig,
) -> NodeId {
    let wiggle = config.wiggle_room;
    let grid = &ctx.grid;
    let bounds = ctx.bounds;
    let container = tree.find_container(scope, bounds, wiggle);

    let table = tree.alloc_struct(StructRole::Table, bounds);
    let info = tree.alloc(NodeKind::GridInfo(GridInfo::from(grid)), bounds);
    tree.append_child(table, info);

    let (w, h) = (grid.width(), grid.height());
    let mut emitted = vec![false; w * h];
    let mut row_index = 0;
    for y in 0..h - 1 {
        if !row_has_content(grid, y) {
            continue;
        }
        let row_rect = Rect::new(bounds.x0, grid.ypos()[y].pos, bounds.x1, grid.ypos()[y + 1].pos);
        let row = tree.alloc_struct(StructRole::TableRow, row_rect);
        tree.append_child(table, row);

        for x in 0..w - 1 {
            if emitted[y * w + x] {
                continue;
            }
            let span = span_at(grid, x, y, &emitted);
            for ey in y..y + span.rows {
                for ex in x..x + span.cols {
                    emitted[ey * w + ex] = true;
                }
            }

            let rect = Rect::new(
                grid.xpos()[x].pos,
                grid.ypos()[y].pos,
                grid.xpos()[x + span.cols].pos,
                grid.ypos()[y + span.rows].pos,
            );
            let role = StructRole::TableCell {
                row: row_index,
                col: x,
                rows: span.rows,
                cols: span.cols,
            };
            let cell = tree.alloc_struct(role, rect);
            tree.append_child(row, cell);
            relocate(tree, container, rect, cell, wiggle);
        }
        tree.refresh_bbox(row);
        row_index += 1;
    }

    // After the last block that ends above the table.
    let index = tree
        .children(container)
        .iter()
        .rposition(|&c| tree.bbox(c).y1 <= bounds.y0 + wiggle)
        .map_or(0, |i| i + 1);
    tree.insert_child(container, index, table);
    tree.refresh_bbox(table);

    debug!(
        "table {table} with {row_index} rows inserted into {container} at {index} covering {}",
        tree.bbox(table)
    );
    table
}
