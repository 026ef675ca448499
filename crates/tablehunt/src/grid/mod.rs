//! Grid discovery.
//!
//! A candidate region goes through four passes, each in its own module:
//!
//! 1. [`edges`] projects text extents onto both axes as start/stop edges.
//! 2. [`positions`] sanitises those edges and sweeps them into dividers.
//! 3. [`lines`] snaps dividers to ruled lines and splits them where rulings
//!    demand it.
//! 4. [`content`] maps every content unit into the cells it covers.
//!
//! [`merge`] then undoes over-segmentation and [`score`] rates the result.

pub mod content;
pub mod edges;
pub mod lines;
pub mod merge;
pub mod positions;
pub mod score;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::HuntConfig;
use crate::tree::{ContentTree, Node, NodeKind};
use crate::types::{Axis, NodeId, Rect};

use self::edges::Edge;

pub use self::score::score;

// ---------------------------------------------------------------------------
// Divider positions
// ---------------------------------------------------------------------------

/// A candidate row or column boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividerPosition {
    pub pos: f64,
    /// Leftmost (topmost) coordinate the divider may occupy.
    pub min: f64,
    /// Rightmost (bottommost) coordinate the divider may occupy.
    pub max: f64,
    /// Residual winding at the divider; zero means no content crosses it.
    pub uncertainty: u32,
    /// How many ruled lines have confirmed this divider.
    pub reinforcement: u32,
}

impl DividerPosition {
    pub fn pinned(at: f64) -> Self {
        DividerPosition {
            pos: at,
            min: at,
            max: at,
            uncertainty: 0,
            reinforcement: 0,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.uncertainty == 0
    }
}

/// Ordered dividers along one axis.  The first and last entries are pinned
/// to the search bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPositions {
    list: Vec<DividerPosition>,
}

impl GridPositions {
    pub fn new(list: Vec<DividerPosition>) -> Self {
        GridPositions { list }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DividerPosition> {
        self.list.iter()
    }

    /// Index of the divider whose `pos` is closest to `c`.
    pub fn nearest(&self, c: f64) -> usize {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (i, d) in self.list.iter().enumerate() {
            let dist = (d.pos - c).abs();
            if dist < best_dist {
                best = i;
                best_dist = dist;
            }
        }
        best
    }

    /// Leftmost cell a unit starting at `c` can occupy: the last cell whose
    /// opening divider may lie at or before `c`.
    pub fn find_cell_l(&self, c: f64, wiggle: f64) -> usize {
        let cells = self.list.len().saturating_sub(1);
        (0..cells)
            .rev()
            .find(|&i| self.list[i].min <= c + wiggle)
            .unwrap_or(0)
    }

    /// Rightmost cell a unit ending at `c` can occupy: the first cell whose
    /// closing divider may lie at or after `c`.
    pub fn find_cell_r(&self, c: f64, wiggle: f64) -> usize {
        let cells = self.list.len().saturating_sub(1);
        (0..cells)
            .find(|&i| self.list[i + 1].max >= c - wiggle)
            .unwrap_or(cells.saturating_sub(1))
    }

    /// `pos` strictly increasing and neighbouring ranges not overlapping.
    pub fn is_monotonic(&self) -> bool {
        self.list
            .windows(2)
            .all(|w| w[0].pos < w[1].pos && w[0].max <= w[1].min)
    }

    /// Index of the divider whose widened range holds `c`, if any.
    pub(crate) fn zone_of(&self, c: f64, wiggle: f64) -> Option<usize> {
        self.list
            .iter()
            .position(|d| c >= d.min - wiggle && c <= d.max + wiggle)
    }
}

impl std::ops::Index<usize> for GridPositions {
    type Output = DividerPosition;

    fn index(&self, index: usize) -> &Self::Output {
        &self.list[index]
    }
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// State of one grid cell.  Line and crossing counters describe the cell's
/// top (`h_*`) and left (`v_*`) borders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub h_line: u32,
    pub v_line: u32,
    pub h_crossed: u32,
    pub v_crossed: u32,
    pub full: bool,
    /// Inside a ruled empty box that was flattened into one cell.
    pub flat: bool,
}

impl Cell {
    /// Ruling on the border crossed when moving along `axis`.
    pub fn border(&self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.v_line,
            Axis::Y => self.h_line,
        }
    }

    /// Crossings of the border crossed when moving along `axis`.
    pub fn crossed(&self, axis: Axis) -> u32 {
        match axis {
            Axis::X => self.v_crossed,
            Axis::Y => self.h_crossed,
        }
    }
}

/// Dense `w × h` cell array kept in lock-step with both divider lists.
///
/// The last column and last row carry only the right and bottom border
/// state and never hold content.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    xpos: GridPositions,
    ypos: GridPositions,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(xpos: GridPositions, ypos: GridPositions) -> Self {
        let cells = vec![Cell::default(); xpos.len() * ypos.len()];
        Grid { xpos, ypos, cells }
    }

    pub fn width(&self) -> usize {
        self.xpos.len()
    }

    pub fn height(&self) -> usize {
        self.ypos.len()
    }

    pub fn len(&self, axis: Axis) -> usize {
        self.positions(axis).len()
    }

    pub fn positions(&self, axis: Axis) -> &GridPositions {
        match axis {
            Axis::X => &self.xpos,
            Axis::Y => &self.ypos,
        }
    }

    pub fn xpos(&self) -> &GridPositions {
        &self.xpos
    }

    pub fn ypos(&self) -> &GridPositions {
        &self.ypos
    }

    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[y * self.width() + x]
    }

    pub fn cell_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        let w = self.width();
        &mut self.cells[y * w + x]
    }

    /// Cell at position `k` along `axis` and `j` across it.
    pub fn cell_along(&self, axis: Axis, k: usize, j: usize) -> &Cell {
        match axis {
            Axis::X => self.cell(k, j),
            Axis::Y => self.cell(j, k),
        }
    }

    pub(crate) fn cell_along_mut(&mut self, axis: Axis, k: usize, j: usize) -> &mut Cell {
        match axis {
            Axis::X => self.cell_mut(k, j),
            Axis::Y => self.cell_mut(j, k),
        }
    }

    /// Every divider on both axes is confirmed.
    pub fn fully_confirmed(&self) -> bool {
        self.xpos.iter().chain(self.ypos.iter()).all(DividerPosition::is_confirmed)
    }

    /// Divider values may be edited in place; the list length may not.
    pub(crate) fn dividers_mut(&mut self, axis: Axis) -> &mut [DividerPosition] {
        match axis {
            Axis::X => &mut self.xpos.list,
            Axis::Y => &mut self.ypos.list,
        }
    }

    /// Insert `div` at `index` on `axis`, splitting the column (or row)
    /// before it.  The new column inherits the split one's state, minus the
    /// border it did not have before.
    pub(crate) fn insert_divider(&mut self, axis: Axis, index: usize, div: DividerPosition) {
        let (w, h) = (self.width(), self.height());
        let src = index.saturating_sub(1);
        let mut cells = Vec::with_capacity(self.cells.len() + self.len(axis.other()));
        match axis {
            Axis::X => {
                for y in 0..h {
                    for x in 0..=w {
                        let cell = if x < index {
                            *self.cell(x, y)
                        } else if x == index {
                            Cell {
                                v_line: 0,
                                v_crossed: 0,
                                ..*self.cell(src, y)
                            }
                        } else {
                            *self.cell(x - 1, y)
                        };
                        cells.push(cell);
                    }
                }
                self.xpos.list.insert(index, div);
            }
            Axis::Y => {
                for y in 0..=h {
                    for x in 0..w {
                        let cell = if y < index {
                            *self.cell(x, y)
                        } else if y == index {
                            Cell {
                                h_line: 0,
                                h_crossed: 0,
                                ..*self.cell(x, src)
                            }
                        } else {
                            *self.cell(x, y - 1)
                        };
                        cells.push(cell);
                    }
                }
                self.ypos.list.insert(index, div);
            }
        }
        self.cells = cells;
    }

    /// Remove divider `index` on `axis`, folding the column (or row) after
    /// it into the one before it.  A folded cell stays flat only if both
    /// halves were.
    pub(crate) fn remove_divider(&mut self, axis: Axis, index: usize) {
        let across = self.len(axis.other());
        for j in 0..across {
            let gone = *self.cell_along(axis, index, j);
            let kept = self.cell_along_mut(axis, index - 1, j);
            kept.full |= gone.full;
            kept.flat &= gone.flat;
            match axis {
                Axis::X => {
                    kept.h_line = kept.h_line.min(gone.h_line);
                    kept.h_crossed += gone.h_crossed;
                }
                Axis::Y => {
                    kept.v_line = kept.v_line.min(gone.v_line);
                    kept.v_crossed += gone.v_crossed;
                }
            }
        }

        let (w, h) = (self.width(), self.height());
        let mut cells = Vec::with_capacity(self.cells.len() - across);
        for y in 0..h {
            for x in 0..w {
                let dropped = match axis {
                    Axis::X => x == index,
                    Axis::Y => y == index,
                };
                if !dropped {
                    cells.push(*self.cell(x, y));
                }
            }
        }
        self.cells = cells;
        match axis {
            Axis::X => self.xpos.list.remove(index),
            Axis::Y => self.ypos.list.remove(index),
        };
    }
}

// ---------------------------------------------------------------------------
// Evaluation context
// ---------------------------------------------------------------------------

/// Everything known about one candidate region while it is evaluated.
#[derive(Debug, Clone)]
pub struct GridContext {
    pub grid: Grid,
    pub bounds: Rect,
    pub has_background: bool,
    xedges: Vec<Edge>,
    yedges: Vec<Edge>,
}

impl GridContext {
    pub(crate) fn new(grid: Grid, bounds: Rect, xedges: Vec<Edge>, yedges: Vec<Edge>) -> Self {
        GridContext {
            grid,
            bounds,
            has_background: false,
            xedges,
            yedges,
        }
    }

    /// Number of content runs open at `c` according to the sanitised edges.
    pub(crate) fn winding_at(&self, axis: Axis, c: f64) -> u32 {
        let edges = match axis {
            Axis::X => &self.xedges,
            Axis::Y => &self.yedges,
        };
        let mut winding: i64 = 0;
        for e in edges {
            if e.is_start && e.pos < c {
                winding += i64::from(e.freq);
            } else if !e.is_start && e.pos <= c {
                winding -= i64::from(e.freq);
            }
        }
        u32::try_from(winding.max(0)).unwrap_or(u32::MAX)
    }
}

/// Why a region is not a table.  None of these is an error: the hunt simply
/// moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Reject {
    #[error("too few dividers on the {0} axis")]
    TooFewDividers(Axis),
    #[error("background fill reaches content outside the region")]
    AmbiguousBackground,
    #[error("{0} vector shapes straddle unrelated cells")]
    Defects(usize),
    #[error("grid collapsed to a single row or column")]
    Degenerate,
}

/// Serialisable record of a transcribed grid, attached as the first child of
/// every table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridInfo {
    pub columns: GridPositions,
    pub rows: GridPositions,
    pub width: usize,
    pub height: usize,
    /// Row-major, `width * height` entries.
    pub cells: Vec<CellInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellInfo {
    pub full: bool,
    pub h_crossed: bool,
    pub v_crossed: bool,
    pub top_border: bool,
    pub left_border: bool,
}

impl From<&Grid> for GridInfo {
    fn from(grid: &Grid) -> Self {
        GridInfo {
            columns: grid.xpos.clone(),
            rows: grid.ypos.clone(),
            width: grid.width(),
            height: grid.height(),
            cells: grid
                .cells
                .iter()
                .map(|c| CellInfo {
                    full: c.full,
                    h_crossed: c.h_crossed > 0,
                    v_crossed: c.v_crossed > 0,
                    top_border: c.h_line > 0,
                    left_border: c.v_line > 0,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the whole grid discovery for the content under `scope` restricted to
/// `bounds`.
pub fn find_grid(
    tree: &ContentTree,
    scope: NodeId,
    bounds: Rect,
    config: &HuntConfig,
) -> Result<GridContext, Reject> {
    let wiggle = config.wiggle_room;

    let (xraw, yraw) = edges::collect(tree, scope, bounds);
    let xedges = positions::sanitize(xraw, wiggle);
    let yedges = positions::sanitize(yraw, wiggle);
    let xpos = positions::build(&xedges, bounds.x0, bounds.x1, wiggle)
        .ok_or(Reject::TooFewDividers(Axis::X))?;
    let ypos = positions::build(&yedges, bounds.y0, bounds.y1, wiggle)
        .ok_or(Reject::TooFewDividers(Axis::Y))?;
    trace!(
        "{} x {} dividers synthesised for {}",
        xpos.len(),
        ypos.len(),
        bounds
    );

    let mut ctx = GridContext::new(Grid::new(xpos, ypos), bounds, xedges, yedges);
    lines::reinforce(&mut ctx, tree, scope, config)?;

    let defects = content::map(&mut ctx, tree, scope, config);
    if defects > 0 {
        return Err(Reject::Defects(defects));
    }

    merge::settle(&mut ctx.grid);
    if ctx.grid.width() <= 2 || ctx.grid.height() <= 2 {
        return Err(Reject::Degenerate);
    }

    debug!(
        "grid {}x{} found in {} (background: {})",
        ctx.grid.width() - 1,
        ctx.grid.height() - 1,
        ctx.bounds,
        ctx.has_background
    );
    Ok(ctx)
}

/// Visit every content node under `scope` in document order, skipping
/// existing tables and grid-info records.
pub(crate) fn for_each_content<F>(tree: &ContentTree, scope: NodeId, f: &mut F)
where
    F: FnMut(NodeId, &Node),
{
    for &child in tree.children(scope) {
        let Some(node) = tree.get(child) else {
            continue;
        };
        match &node.kind {
            NodeKind::Struct(s) if s.role.is_table_part() => {}
            NodeKind::Struct(_) => for_each_content(tree, child, f),
            NodeKind::GridInfo(_) => {}
            NodeKind::Text(_) | NodeKind::Vector(_) => f(child, node),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn divider(pos: f64, uncertainty: u32) -> DividerPosition {
        DividerPosition {
            pos,
            min: pos,
            max: pos,
            uncertainty,
            reinforcement: 0,
        }
    }

    /// Dividers at `stops`, ends pinned, interior ones with `uncertainty`.
    pub(crate) fn positions(stops: &[f64], uncertainty: u32) -> GridPositions {
        let last = stops.len() - 1;
        GridPositions::new(
            stops
                .iter()
                .enumerate()
                .map(|(i, &p)| {
                    if i == 0 || i == last {
                        DividerPosition::pinned(p)
                    } else {
                        divider(p, uncertainty)
                    }
                })
                .collect(),
        )
    }

    #[test]
    fn test_nearest_and_find_cells() {
        let list = GridPositions::new(vec![
            DividerPosition::pinned(0.0),
            DividerPosition {
                pos: 30.0,
                min: 20.0,
                max: 40.0,
                uncertainty: 0,
                reinforcement: 0,
            },
            DividerPosition::pinned(100.0),
        ]);
        assert_eq!(list.nearest(33.0), 1);
        assert_eq!(list.nearest(90.0), 2);
        assert_eq!(list.find_cell_l(40.0, 0.5), 1);
        assert_eq!(list.find_cell_l(5.0, 0.5), 0);
        assert_eq!(list.find_cell_r(20.0, 0.5), 0);
        assert_eq!(list.find_cell_r(60.0, 0.5), 1);
        assert!(list.is_monotonic());
    }

    #[test]
    fn test_insert_column_copies_split_column() {
        let mut grid = Grid::new(positions(&[0.0, 10.0, 20.0], 0), positions(&[0.0, 10.0, 20.0], 0));
        grid.cell_mut(0, 0).h_line = 1;
        grid.cell_mut(0, 0).v_line = 1;
        grid.insert_divider(Axis::X, 1, divider(5.0, 0));
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.cell(1, 0).h_line, 1);
        assert_eq!(grid.cell(1, 0).v_line, 0);
        assert_eq!(grid.cell(0, 0).v_line, 1);
        assert!(grid.xpos().is_monotonic());
    }

    #[test]
    fn test_insert_row_keeps_lockstep() {
        let mut grid = Grid::new(positions(&[0.0, 10.0, 20.0], 0), positions(&[0.0, 10.0, 20.0], 0));
        grid.cell_mut(1, 1).full = true;
        grid.insert_divider(Axis::Y, 2, divider(15.0, 0));
        assert_eq!(grid.height(), 4);
        assert!(grid.cell(1, 1).full);
        assert!(grid.cell(1, 2).full);
        assert!(!grid.cell(1, 3).full);
    }

    #[test]
    fn test_remove_divider_merges_state() {
        let mut grid = Grid::new(
            positions(&[0.0, 10.0, 20.0, 30.0], 1),
            positions(&[0.0, 10.0, 20.0], 0),
        );
        grid.cell_mut(0, 1).h_line = 1;
        grid.cell_mut(0, 1).h_crossed = 1;
        grid.cell_mut(1, 1).h_line = 0;
        grid.cell_mut(1, 1).h_crossed = 2;
        grid.cell_mut(1, 1).full = true;
        grid.cell_mut(1, 0).v_line = 1;
        grid.remove_divider(Axis::X, 1);
        assert_eq!(grid.width(), 3);
        let merged = grid.cell(0, 1);
        assert!(merged.full);
        assert_eq!(merged.h_line, 0);
        assert_eq!(merged.h_crossed, 3);
        assert_eq!(grid.cell(0, 0).v_line, 0);
        assert_eq!(grid.xpos()[1].pos, 20.0);
    }

    #[test]
    fn test_grid_info_flags() {
        let mut grid = Grid::new(positions(&[0.0, 10.0, 20.0], 0), positions(&[0.0, 10.0, 20.0], 0));
        grid.cell_mut(1, 1).full = true;
        grid.cell_mut(1, 1).v_line = 2;
        let info = GridInfo::from(&grid);
        assert_eq!(info.cells.len(), 9);
        assert!(info.cells[4].full);
        assert!(info.cells[4].left_border);
        assert!(!info.cells[4].top_border);
    }
}
