//! Merge engine: folds over-segmented columns and rows back together.

use log::trace;

use crate::types::Axis;

use super::Grid;

/// Run every merge pass until none of them changes the grid.
pub fn settle(grid: &mut Grid) {
    loop {
        let mut changed = merge_columns(grid);
        changed |= merge_rows(grid);
        changed |= remove_bordered_empty_cells(grid);
        if !changed {
            return;
        }
    }
}

pub(crate) fn merge_columns(grid: &mut Grid) -> bool {
    merge_axis(grid, Axis::X)
}

pub(crate) fn merge_rows(grid: &mut Grid) -> bool {
    let merged = merge_axis(grid, Axis::Y);
    remove_straddling_row(grid) || merged
}

/// Divider `k` on `axis` can go: it is not confirmed, no ruling runs along
/// it, no pair of full cells sits on either side of it without content
/// joining them, and content crosses it somewhere.
fn mergeable(grid: &Grid, axis: Axis, k: usize) -> bool {
    if grid.positions(axis)[k].is_confirmed() {
        return false;
    }
    let across = grid.len(axis.other()) - 1;
    let mut crossed_any = false;
    for j in 0..across {
        let before = grid.cell_along(axis, k - 1, j);
        let after = grid.cell_along(axis, k, j);
        if after.border(axis) > 0 {
            return false;
        }
        let crossed = after.crossed(axis) > 0;
        if before.full && after.full && !crossed {
            return false;
        }
        crossed_any |= crossed;
    }
    crossed_any
}

fn merge_axis(grid: &mut Grid, axis: Axis) -> bool {
    let n = grid.len(axis);
    let mut changed = false;
    for k in (1..n.saturating_sub(1)).rev() {
        if mergeable(grid, axis, k) {
            trace!("merging across {axis} divider {k}");
            grid.remove_divider(axis, k);
            changed = true;
        }
    }
    changed
}

/// Remove one row whose content all reaches into the same neighbour: it is
/// a line of text split by a separator drawn through it.
fn remove_straddling_row(grid: &mut Grid) -> bool {
    let (w, h) = (grid.width(), grid.height());
    for y in 0..h.saturating_sub(1) {
        let full: Vec<usize> = (0..w - 1).filter(|&x| grid.cell(x, y).full).collect();
        if full.is_empty() {
            continue;
        }
        let up = full.iter().all(|&x| grid.cell(x, y).h_crossed > 0);
        let down = full.iter().all(|&x| grid.cell(x, y + 1).h_crossed > 0);
        let removable = |k: usize| k >= 1 && k + 1 < h && !grid.ypos()[k].is_confirmed();

        let target = if up && removable(y) {
            Some(y)
        } else if down && removable(y + 1) {
            Some(y + 1)
        } else {
            None
        };
        if let Some(k) = target {
            trace!("row {y} straddles divider {k}");
            grid.remove_divider(Axis::Y, k);
            return true;
        }
    }
    false
}

/// Find one rectangular block of two or more empty cells whose perimeter is
/// fully ruled and whose inside has no ruling, and flatten it into a single
/// full cell.  Flat cells let the transcriber span the block even across
/// confirmed dividers.
pub(crate) fn remove_bordered_empty_cells(grid: &mut Grid) -> bool {
    let (w, h) = (grid.width(), grid.height());
    for y0 in 0..h.saturating_sub(1) {
        for x0 in 0..w.saturating_sub(1) {
            if let Some((x1, y1)) = bordered_region(grid, x0, y0) {
                trace!("flattening bordered empty cells {x0}..{x1} x {y0}..{y1}");
                for y in y0..y1 {
                    for x in x0..x1 {
                        let cell = grid.cell_mut(x, y);
                        cell.full = true;
                        cell.flat = true;
                        if x > x0 {
                            cell.v_crossed = cell.v_crossed.max(1);
                        }
                        if y > y0 {
                            cell.h_crossed = cell.h_crossed.max(1);
                        }
                    }
                }
                return true;
            }
        }
    }
    false
}

/// Grow a bordered empty region from its top-left cell.  Returns the
/// exclusive bottom-right corner.
fn bordered_region(grid: &Grid, x0: usize, y0: usize) -> Option<(usize, usize)> {
    let (w, h) = (grid.width(), grid.height());
    let corner = grid.cell(x0, y0);
    if corner.full || corner.h_line == 0 || corner.v_line == 0 {
        return None;
    }

    // Along the top edge until a vertical ruling closes it.
    let mut x1 = x0 + 1;
    while x1 < w - 1 && grid.cell(x1, y0).v_line == 0 {
        let cell = grid.cell(x1, y0);
        if cell.full || cell.h_line == 0 {
            return None;
        }
        x1 += 1;
    }
    if grid.cell(x1, y0).v_line == 0 {
        return None;
    }

    // Down the left edge until a horizontal ruling closes the whole width.
    let mut y1 = y0 + 1;
    loop {
        if y1 >= h {
            return None;
        }
        if (x0..x1).all(|x| grid.cell(x, y1).h_line > 0) {
            break;
        }
        if y1 == h - 1 {
            return None;
        }
        let row_ok = grid.cell(x0, y1).v_line > 0
            && grid.cell(x1, y1).v_line > 0
            && (x0..x1).all(|x| {
                let cell = grid.cell(x, y1);
                !cell.full && cell.h_line == 0 && (x == x0 || cell.v_line == 0)
            });
        if !row_ok {
            return None;
        }
        y1 += 1;
    }

    if (x1 - x0) * (y1 - y0) < 2 {
        return None;
    }
    Some((x1, y1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::positions;

    /// `w × h` dividers, interior ones uncertain.
    fn grid(w: usize, h: usize) -> Grid {
        let stops = |n: usize| (0..n).map(|i| i as f64 * 10.0).collect::<Vec<_>>();
        Grid::new(positions(&stops(w), 1), positions(&stops(h), 1))
    }

    fn rule_box(grid: &mut Grid, x0: usize, y0: usize, x1: usize, y1: usize) {
        for x in x0..x1 {
            grid.cell_mut(x, y0).h_line += 1;
            grid.cell_mut(x, y1).h_line += 1;
        }
        for y in y0..y1 {
            grid.cell_mut(x0, y).v_line += 1;
            grid.cell_mut(x1, y).v_line += 1;
        }
    }

    #[test]
    fn test_crossed_columns_merge() {
        let mut g = grid(4, 3);
        // A word spanning columns 0 and 1 in row 0; row 1 only has column 0.
        g.cell_mut(0, 0).full = true;
        g.cell_mut(1, 0).full = true;
        g.cell_mut(1, 0).v_crossed = 1;
        g.cell_mut(0, 1).full = true;
        g.cell_mut(2, 0).full = true;
        g.cell_mut(2, 1).full = true;
        assert!(merge_columns(&mut g));
        assert_eq!(g.width(), 3);
        assert!(g.cell(0, 0).full);
        assert!(g.cell(1, 1).full);
        assert!(g.xpos().is_monotonic());
    }

    #[test]
    fn test_uncrossed_columns_stay() {
        let mut g = grid(4, 3);
        // Sparse but never crossed: no merge even though cells are empty.
        g.cell_mut(0, 0).full = true;
        g.cell_mut(1, 1).full = true;
        g.cell_mut(2, 0).full = true;
        assert!(!merge_columns(&mut g));
        assert_eq!(g.width(), 4);
    }

    #[test]
    fn test_partially_crossed_boundary_stays() {
        // A title crosses the boundary in row 0 only; data rows sit on both sides.
        let mut g = grid(3, 4);
        for y in 0..3 {
            g.cell_mut(0, y).full = true;
            g.cell_mut(1, y).full = true;
        }
        g.cell_mut(1, 0).v_crossed = 1;
        assert!(!merge_columns(&mut g));
    }

    #[test]
    fn test_confirmed_divider_never_merges() {
        let mut g = Grid::new(positions(&[0.0, 10.0, 20.0], 0), positions(&[0.0, 10.0, 20.0], 0));
        g.cell_mut(0, 0).full = true;
        g.cell_mut(1, 0).full = true;
        g.cell_mut(1, 0).v_crossed = 1;
        assert!(!merge_columns(&mut g));
        assert!(!merge_rows(&mut g));
    }

    #[test]
    fn test_ruled_boundary_never_merges() {
        let mut g = grid(3, 3);
        g.cell_mut(0, 0).full = true;
        g.cell_mut(1, 0).full = true;
        g.cell_mut(1, 0).v_crossed = 1;
        g.cell_mut(1, 1).v_line = 1;
        assert!(!merge_columns(&mut g));
    }

    #[test]
    fn test_straddle_never_crosses_confirmed_divider() {
        let mut g = Grid::new(
            positions(&[0.0, 10.0, 20.0, 30.0], 1),
            positions(&[0.0, 10.0, 20.0, 30.0], 0),
        );
        g.cell_mut(0, 1).full = true;
        g.cell_mut(0, 1).h_crossed = 1;
        assert!(!remove_straddling_row(&mut g));
        assert_eq!(g.height(), 4);
    }

    #[test]
    fn test_straddle_merges_upward() {
        let mut g = grid(3, 4);
        // The only content in row 1 is the tail of the text in row 0.
        g.cell_mut(0, 0).full = true;
        g.cell_mut(1, 0).full = true;
        g.cell_mut(0, 1).full = true;
        g.cell_mut(0, 1).h_crossed = 1;
        g.cell_mut(1, 2).full = true;
        assert!(remove_straddling_row(&mut g));
        assert_eq!(g.height(), 3);
        assert!(g.cell(0, 0).full);
        assert!(g.cell(1, 1).full);
    }

    #[test]
    fn test_bordered_empty_box_collapses() {
        let mut g = grid(4, 4);
        rule_box(&mut g, 0, 0, 3, 3);
        settle(&mut g);
        assert_eq!(g.width(), 2);
        assert_eq!(g.height(), 2);
        assert!(g.cell(0, 0).full);
        assert!(g.cell(0, 0).flat);
    }

    #[test]
    fn test_box_across_confirmed_dividers_is_marked_flat() {
        let stops = [0.0, 10.0, 20.0, 30.0];
        let mut g = Grid::new(positions(&stops, 0), positions(&stops[..3], 0));
        rule_box(&mut g, 0, 0, 3, 2);
        settle(&mut g);
        assert_eq!((g.width(), g.height()), (4, 3));
        for y in 0..2 {
            for x in 0..3 {
                assert!(g.cell(x, y).full && g.cell(x, y).flat);
            }
        }
        assert!(!g.cell(0, 2).flat);
    }

    #[test]
    fn test_box_with_inner_ruling_is_kept() {
        let mut g = grid(4, 4);
        rule_box(&mut g, 0, 0, 3, 3);
        g.cell_mut(1, 1).v_line = 1;
        assert!(!remove_bordered_empty_cells(&mut g));
    }

    #[test]
    fn test_single_bordered_cell_is_not_a_region() {
        let mut g = grid(3, 3);
        rule_box(&mut g, 0, 0, 1, 1);
        assert!(!remove_bordered_empty_cells(&mut g));
    }

    #[test]
    fn test_settle_is_idempotent() {
        let mut g = grid(5, 4);
        g.cell_mut(0, 0).full = true;
        g.cell_mut(1, 0).full = true;
        g.cell_mut(1, 0).v_crossed = 1;
        g.cell_mut(3, 1).full = true;
        g.cell_mut(0, 2).full = true;
        g.cell_mut(0, 2).h_crossed = 1;
        settle(&mut g);
        let once = g.clone();
        settle(&mut g);
        assert_eq!(g, once);
        assert!(g.xpos().is_monotonic());
        assert!(g.ypos().is_monotonic());
    }
}
