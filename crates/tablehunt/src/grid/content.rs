//! Content mapping: records which cells hold content and which borders the
//! content crosses.

use log::trace;

use crate::config::HuntConfig;
use crate::tree::{ContentTree, NodeKind, TextChar, TextLine};
use crate::types::{Axis, NodeId, Rect};

use super::lines::{classify, Ruling};
use super::GridContext;

/// Split a line into content units.  A lone space joins the words around
/// it unless one of them ends (or starts) with a digit; longer space runs
/// always separate.
pub(crate) fn text_units(line: &TextLine, bounds: &Rect) -> Vec<Rect> {
    let chars: Vec<&TextChar> = line
        .chars
        .iter()
        .filter(|ch| {
            let (cx, cy) = ch.bbox.center();
            bounds.contains_point(cx, cy)
        })
        .collect();

    let mut units = Vec::new();
    let mut current: Option<Rect> = None;
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].c.is_whitespace() {
            let bbox = chars[i].bbox;
            current = Some(current.map_or(bbox, |r| r.union(&bbox)));
            i += 1;
            continue;
        }
        let end = (i..chars.len())
            .find(|&j| !chars[j].c.is_whitespace())
            .unwrap_or(chars.len());
        let joins = end - i == 1
            && i > 0
            && end < chars.len()
            && !chars[i - 1].c.is_ascii_digit()
            && !chars[end].c.is_ascii_digit();
        if !joins {
            units.extend(current.take());
        }
        i = end;
    }
    units.extend(current);
    units
}

impl GridContext {
    /// Cell range `(x0, x1, y0, y1)` covered by `rect`, inclusive.
    fn cell_range(&self, rect: &Rect, wiggle: f64) -> (usize, usize, usize, usize) {
        let range = |axis: Axis| {
            let positions = self.grid.positions(axis);
            let l = positions.find_cell_l(rect.lo(axis), wiggle);
            let r = positions.find_cell_r(rect.hi(axis), wiggle);
            (l.min(r), l.max(r))
        };
        let (x0, x1) = range(Axis::X);
        let (y0, y1) = range(Axis::Y);
        (x0, x1, y0, y1)
    }

    fn mark(&mut self, (x0, x1, y0, y1): (usize, usize, usize, usize)) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                let cell = self.grid.cell_mut(x, y);
                cell.full = true;
                if x > x0 {
                    cell.v_crossed += 1;
                }
                if y > y0 {
                    cell.h_crossed += 1;
                }
            }
        }
    }

    /// All four corners of `rect` sit on divider ranges.
    fn on_dividers(&self, rect: &Rect, wiggle: f64) -> bool {
        let xs = self.grid.xpos();
        let ys = self.grid.ypos();
        xs.zone_of(rect.x0, wiggle).is_some()
            && xs.zone_of(rect.x1, wiggle).is_some()
            && ys.zone_of(rect.y0, wiggle).is_some()
            && ys.zone_of(rect.y1, wiggle).is_some()
    }
}

/// Map all content under `scope` into the grid and return the number of
/// vector shapes that could not be placed.
pub(crate) fn map(ctx: &mut GridContext, tree: &ContentTree, scope: NodeId, config: &HuntConfig) -> usize {
    let wiggle = config.wiggle_room;
    let bounds = ctx.bounds;
    let mut defects = 0;

    let mut units: Vec<Rect> = Vec::new();
    let mut shapes: Vec<Rect> = Vec::new();
    collect_units(tree, scope, &bounds, config, &mut units, &mut shapes);

    for unit in &units {
        let range = ctx.cell_range(unit, wiggle);
        ctx.mark(range);
    }

    for shape in &shapes {
        let range = ctx.cell_range(shape, wiggle);
        let (x0, x1, y0, y1) = range;
        if x0 == x1 && y0 == y1 {
            ctx.mark(range);
        } else if !ctx.on_dividers(shape, wiggle) {
            trace!("vector {shape} straddles cells {x0}..={x1} x {y0}..={y1}");
            defects += 1;
        }
    }
    defects
}

fn collect_units(
    tree: &ContentTree,
    scope: NodeId,
    bounds: &Rect,
    config: &HuntConfig,
    units: &mut Vec<Rect>,
    shapes: &mut Vec<Rect>,
) {
    super::for_each_content(tree, scope, &mut |_, node| {
        if !node.bbox.intersects(bounds) {
            return;
        }
        match &node.kind {
            NodeKind::Text(block) => {
                for line in &block.lines {
                    units.extend(text_units(line, bounds));
                }
            }
            NodeKind::Vector(shape) => {
                if classify(shape, node.bbox, bounds, config) == Ruling::Content {
                    shapes.push(node.bbox);
                }
            }
            _ => {}
        }
    });
}
