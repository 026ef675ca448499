//! Edge collection: projects text extents inside the bounds onto each axis.

use std::cmp::Ordering;

use crate::tree::{ContentTree, NodeKind, TextChar, TextLine};
use crate::types::{NodeId, Rect};

use super::for_each_content;

/// One end of a run of content projected onto an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub is_start: bool,
    /// Produced by a single inter-word space rather than a real gap.
    pub weak: bool,
    pub pos: f64,
    pub freq: u32,
}

/// Edges sorted by position, stops before starts at equal positions, and
/// unique by `(pos, is_start)`.
#[derive(Debug, Clone, Default)]
pub(crate) struct EdgeList {
    edges: Vec<Edge>,
}

impl EdgeList {
    pub(crate) fn push(&mut self, pos: f64, is_start: bool, weak: bool) {
        let found = self.edges.binary_search_by(|e| {
            e.pos
                .partial_cmp(&pos)
                .unwrap_or(Ordering::Equal)
                .then(e.is_start.cmp(&is_start))
        });
        match found {
            Ok(i) => {
                let e = &mut self.edges[i];
                e.freq += 1;
                e.weak &= weak;
            }
            Err(i) => self.edges.insert(
                i,
                Edge {
                    is_start,
                    weak,
                    pos,
                    freq: 1,
                },
            ),
        }
    }

    pub(crate) fn into_vec(self) -> Vec<Edge> {
        self.edges
    }
}

fn is_blank(ch: &TextChar) -> bool {
    ch.c.is_whitespace()
}

fn in_bounds(ch: &TextChar, bounds: &Rect) -> bool {
    let (cx, cy) = ch.bbox.center();
    bounds.contains_point(cx, cy)
}

/// Collect `(x edges, y edges)` for the text under `scope` inside `bounds`.
pub(crate) fn collect(tree: &ContentTree, scope: NodeId, bounds: Rect) -> (Vec<Edge>, Vec<Edge>) {
    let mut xs = EdgeList::default();
    let mut ys = EdgeList::default();

    for_each_content(tree, scope, &mut |_, node| {
        let NodeKind::Text(block) = &node.kind else {
            return;
        };
        if !node.bbox.intersects(&bounds) {
            return;
        }

        let mut block_extent: Option<Rect> = None;
        for line in &block.lines {
            let Some(extent) = line_runs(line, &bounds, &mut xs) else {
                continue;
            };
            if block.justified {
                block_extent = Some(block_extent.map_or(extent, |r| r.union(&extent)));
            } else {
                ys.push(extent.y0.max(bounds.y0), true, false);
                ys.push(extent.y1.min(bounds.y1), false, false);
            }
        }
        if let Some(extent) = block_extent {
            ys.push(extent.y0.max(bounds.y0), true, false);
            ys.push(extent.y1.min(bounds.y1), false, false);
        }
    });

    (xs.into_vec(), ys.into_vec())
}

/// Push start/stop edges for every run of non-blank characters on `line`.
/// Returns the extent of the visible characters, if any.
fn line_runs(line: &TextLine, bounds: &Rect, xs: &mut EdgeList) -> Option<Rect> {
    let chars: Vec<&TextChar> = line.chars.iter().filter(|ch| in_bounds(ch, bounds)).collect();
    let first = chars.iter().position(|ch| !is_blank(ch))?;
    let last = chars.iter().rposition(|ch| !is_blank(ch))?;
    let clamp = |v: f64| v.clamp(bounds.x0, bounds.x1);

    let mut extent = chars[first].bbox;
    xs.push(clamp(chars[first].bbox.x0), true, false);

    let mut i = first;
    while i <= last {
        if !is_blank(chars[i]) {
            extent = extent.union(&chars[i].bbox);
            i += 1;
            continue;
        }
        let gap_end = (i..=last).find(|&j| !is_blank(chars[j])).unwrap_or(last);
        let weak = gap_end - i == 1;
        xs.push(clamp(chars[i - 1].bbox.x1), false, weak);
        xs.push(clamp(chars[gap_end].bbox.x0), true, weak);
        i = gap_end;
    }

    xs.push(clamp(chars[last].bbox.x1), false, false);
    Some(extent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{BlockSpec, LineSpec, PageSpec};

    fn edges_of(blocks: Vec<BlockSpec>, bounds: Rect) -> (Vec<Edge>, Vec<Edge>) {
        let tree = ContentTree::from_spec(&PageSpec { bbox: None, blocks });
        collect(&tree, tree.root(), bounds)
    }

    fn summary(edges: &[Edge]) -> Vec<(f64, bool, bool, u32)> {
        edges.iter().map(|e| (e.pos, e.is_start, e.weak, e.freq)).collect()
    }

    #[test]
    fn test_edge_list_orders_stops_first() {
        let mut list = EdgeList::default();
        list.push(10.0, true, false);
        list.push(10.0, false, true);
        list.push(5.0, true, true);
        list.push(10.0, true, true);
        let edges = list.into_vec();
        assert_eq!(
            summary(&edges),
            vec![(5.0, true, true, 1), (10.0, false, true, 1), (10.0, true, false, 2)]
        );
    }

    #[test]
    fn test_single_space_gives_weak_edges() {
        let (xs, ys) = edges_of(
            vec![BlockSpec::text(&[("ab cd", 0.0, 0.0)])],
            Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        assert_eq!(
            summary(&xs),
            vec![
                (0.0, true, false, 1),
                (10.0, false, true, 1),
                (15.0, true, true, 1),
                (25.0, false, false, 1),
            ]
        );
        assert_eq!(summary(&ys), vec![(0.0, true, false, 1), (10.0, false, false, 1)]);
    }

    #[test]
    fn test_space_run_gives_strong_edges_and_trims_ends() {
        let (xs, _) = edges_of(
            vec![BlockSpec::text(&[("  1  23 ", 0.0, 0.0)])],
            Rect::new(0.0, 0.0, 100.0, 100.0),
        );
        assert_eq!(
            summary(&xs),
            vec![
                (10.0, true, false, 1),
                (15.0, false, false, 1),
                (25.0, true, false, 1),
                (35.0, false, false, 1),
            ]
        );
    }

    #[test]
    fn test_justified_block_gives_one_row() {
        let block = BlockSpec::Text {
            lines: vec![LineSpec::new("one", 0.0, 0.0), LineSpec::new("two", 0.0, 12.0)],
            justified: true,
        };
        let (_, ys) = edges_of(vec![block], Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(summary(&ys), vec![(0.0, true, false, 1), (22.0, false, false, 1)]);
    }

    #[test]
    fn test_content_outside_bounds_is_ignored() {
        let (xs, ys) = edges_of(
            vec![
                BlockSpec::text(&[("in", 0.0, 0.0)]),
                BlockSpec::text(&[("out", 200.0, 0.0)]),
                BlockSpec::rule(0.0, 30.0, 100.0, 31.0),
            ],
            Rect::new(0.0, 0.0, 100.0, 50.0),
        );
        assert_eq!(xs.len(), 2);
        assert_eq!(ys.len(), 2);
    }
}
