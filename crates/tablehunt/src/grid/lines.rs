//! Ruling reinforcement: snaps dividers to drawn lines and borders, splitting
//! them where a ruling falls between known positions.

use log::{debug, trace};

use crate::config::HuntConfig;
use crate::tree::{ContentTree, NodeKind, VectorShape};
use crate::types::{Axis, NodeId, Rect};

use super::{for_each_content, DividerPosition, GridContext, Reject};

/// What a vector shape means to the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Ruling {
    /// Thin and tall: a column separator at `x`.
    Vertical { x: f64, y0: f64, y1: f64 },
    /// Thin and wide: a row separator at `y`.
    Horizontal { y: f64, x0: f64, x1: f64 },
    /// Outlined or filled rectangle whose edges act as rulings.
    Border(Rect),
    /// Rectangle covering the whole region.
    Background(Rect),
    /// Anything else is content.
    Content,
}

pub(crate) fn classify(shape: &VectorShape, bbox: Rect, bounds: &Rect, config: &HuntConfig) -> Ruling {
    let thick = config.max_line_thickness;
    let (w, h) = (bbox.width(), bbox.height());
    let (cx, cy) = bbox.center();

    if w <= thick && h > thick {
        return Ruling::Vertical {
            x: cx,
            y0: bbox.y0,
            y1: bbox.y1,
        };
    }
    if h <= thick && w > thick {
        return Ruling::Horizontal {
            y: cy,
            x0: bbox.x0,
            x1: bbox.x1,
        };
    }
    if w <= thick && h <= thick {
        return Ruling::Content;
    }
    if shape.rectangle && (shape.filled || shape.stroked) {
        if bbox.expand(config.wiggle_room).contains_rect(bounds) {
            return Ruling::Background(bbox);
        }
        return Ruling::Border(bbox);
    }
    Ruling::Content
}

impl GridContext {
    /// Locate (or create) the divider for coordinate `c` on `axis`.
    ///
    /// Inaccurate lookups only snap.  Accurate ones reinforce a matching
    /// divider, claim an unreinforced one, or split the divider range (or
    /// the cell) they fall into.
    pub(crate) fn find_grid_pos(&mut self, axis: Axis, c: f64, inaccurate: bool, wiggle: f64) -> usize {
        let positions = self.grid.positions(axis);
        if inaccurate {
            return positions.nearest(c);
        }
        let n = positions.len();

        if let Some(i) = positions.zone_of(c, wiggle) {
            if i == 0 || i == n - 1 {
                self.grid.dividers_mut(axis)[i].reinforcement += 1;
                return i;
            }
            let (lo, hi) = (positions[i - 1].max, positions[i + 1].min);
            let divs = self.grid.dividers_mut(axis);
            let d = &mut divs[i];

            if d.reinforcement == 0 {
                let c = c.clamp(lo, hi);
                d.pos = c;
                d.min = d.min.min(c);
                d.max = d.max.max(c);
                d.reinforcement = 1;
                return i;
            }

            let c = c.clamp(d.min, d.max);
            if (c - d.pos).abs() <= wiggle {
                let r = f64::from(d.reinforcement);
                d.pos = (d.pos * r + c) / (r + 1.0);
                d.reinforcement += 1;
                return i;
            }

            let mid = (c + d.pos) / 2.0;
            let split = DividerPosition {
                pos: c,
                min: if c < d.pos { d.min } else { mid },
                max: if c < d.pos { mid } else { d.max },
                uncertainty: 0,
                reinforcement: 1,
            };
            let early = c < d.pos;
            if early {
                d.min = mid;
            } else {
                d.max = mid;
            }
            let index = if early { i } else { i + 1 };
            let split = DividerPosition {
                uncertainty: self.winding_at(axis, c),
                ..split
            };
            trace!("splitting {axis} divider {i} at {c} ({})", if early { "early" } else { "late" });
            self.grid.insert_divider(axis, index, split);
            return index;
        }

        if c <= positions[0].pos || c >= positions[n - 1].pos {
            return positions.nearest(c);
        }
        let index = positions
            .iter()
            .position(|d| d.pos > c)
            .unwrap_or(n - 1);
        let split = DividerPosition {
            pos: c,
            min: c,
            max: c,
            uncertainty: self.winding_at(axis, c),
            reinforcement: 1,
        };
        trace!("new {axis} divider at {c}");
        self.grid.insert_divider(axis, index, split);
        index
    }

    fn mark_horizontal(&mut self, y: usize, x0: usize, x1: usize) {
        for x in x0.min(x1)..x0.max(x1) {
            self.grid.cell_mut(x, y).h_line += 1;
        }
    }

    fn mark_vertical(&mut self, x: usize, y0: usize, y1: usize) {
        for y in y0.min(y1)..y0.max(y1) {
            self.grid.cell_mut(x, y).v_line += 1;
        }
    }

    fn place_border(&mut self, rect: Rect, wiggle: f64) {
        for c in [rect.x0, rect.x1] {
            self.find_grid_pos(Axis::X, c, false, wiggle);
        }
        for c in [rect.y0, rect.y1] {
            self.find_grid_pos(Axis::Y, c, false, wiggle);
        }
    }

    fn mark_border(&mut self, rect: Rect) {
        let (ix0, ix1) = (self.grid.xpos().nearest(rect.x0), self.grid.xpos().nearest(rect.x1));
        let (iy0, iy1) = (self.grid.ypos().nearest(rect.y0), self.grid.ypos().nearest(rect.y1));
        if ix0 == ix1 || iy0 == iy1 {
            return;
        }
        self.mark_horizontal(iy0, ix0, ix1);
        self.mark_horizontal(iy1, ix0, ix1);
        self.mark_vertical(ix0, iy0, iy1);
        self.mark_vertical(ix1, iy0, iy1);
    }

    /// Grow the region to a background fill, provided nothing else lies
    /// between the fill and the current bounds.
    fn adopt_background(
        &mut self,
        tree: &ContentTree,
        fill: Rect,
        fill_id: NodeId,
        wiggle: f64,
    ) -> Result<(), Reject> {
        let inner = self.bounds.expand(wiggle);
        if inner.contains_rect(&fill) {
            self.has_background = true;
            return Ok(());
        }

        let mut ambiguous = false;
        for_each_content(tree, tree.root(), &mut |id, node| {
            if ambiguous || id == fill_id {
                return;
            }
            match &node.kind {
                NodeKind::Text(block) => {
                    ambiguous = block.lines.iter().flat_map(|l| &l.chars).any(|ch| {
                        let (cx, cy) = ch.bbox.center();
                        fill.contains_point(cx, cy) && !inner.contains_point(cx, cy)
                    });
                }
                NodeKind::Vector(_) => {
                    ambiguous = fill.contains_rect(&node.bbox) && !inner.contains_rect(&node.bbox);
                }
                _ => {}
            }
        });
        if ambiguous {
            return Err(Reject::AmbiguousBackground);
        }

        self.bounds = self.bounds.union(&fill);
        for axis in [Axis::X, Axis::Y] {
            let (lo, hi) = (self.bounds.lo(axis), self.bounds.hi(axis));
            let divs = self.grid.dividers_mut(axis);
            let last = divs.len() - 1;
            divs[0] = DividerPosition {
                reinforcement: divs[0].reinforcement,
                ..DividerPosition::pinned(lo)
            };
            divs[last] = DividerPosition {
                reinforcement: divs[last].reinforcement,
                ..DividerPosition::pinned(hi)
            };
        }
        self.has_background = true;
        debug!("background fill extends region to {}", self.bounds);
        Ok(())
    }
}

/// Apply every ruling under `scope` to the grid.
pub(crate) fn reinforce(
    ctx: &mut GridContext,
    tree: &ContentTree,
    scope: NodeId,
    config: &HuntConfig,
) -> Result<(), Reject> {
    let wiggle = config.wiggle_room;
    let bounds = ctx.bounds;

    let mut rulings: Vec<(NodeId, Ruling)> = Vec::new();
    for_each_content(tree, scope, &mut |id, node| {
        if let NodeKind::Vector(shape) = &node.kind {
            if node.bbox.intersects(&bounds) {
                rulings.push((id, classify(shape, node.bbox, &bounds, config)));
            }
        }
    });

    // Backgrounds may move the outer dividers, so they go first.
    for &(id, ruling) in &rulings {
        if let Ruling::Background(fill) = ruling {
            ctx.adopt_background(tree, fill, id, wiggle)?;
            ctx.place_border(fill, wiggle);
        }
    }

    // Every divider is placed before any cell is marked, so a later split
    // copies the marks of the cells it divides.
    for &(_, ruling) in &rulings {
        match ruling {
            Ruling::Border(rect) => ctx.place_border(rect, wiggle),
            Ruling::Horizontal { y, .. } => {
                ctx.find_grid_pos(Axis::Y, y, false, wiggle);
            }
            Ruling::Vertical { x, .. } => {
                ctx.find_grid_pos(Axis::X, x, false, wiggle);
            }
            Ruling::Background(_) | Ruling::Content => {}
        }
    }

    for &(_, ruling) in &rulings {
        match ruling {
            Ruling::Background(rect) | Ruling::Border(rect) => ctx.mark_border(rect),
            Ruling::Horizontal { y, x0, x1 } => {
                let yi = ctx.grid.ypos().nearest(y);
                let xa = ctx.find_grid_pos(Axis::X, x0, true, wiggle);
                let xb = ctx.find_grid_pos(Axis::X, x1, true, wiggle);
                ctx.mark_horizontal(yi, xa, xb);
            }
            Ruling::Vertical { x, y0, y1 } => {
                let xi = ctx.grid.xpos().nearest(x);
                let ya = ctx.find_grid_pos(Axis::Y, y0, true, wiggle);
                let yb = ctx.find_grid_pos(Axis::Y, y1, true, wiggle);
                ctx.mark_vertical(xi, ya, yb);
            }
            Ruling::Content => {}
        }
    }
    Ok(())
}
