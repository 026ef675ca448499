//! Recursive table hunt over the content tree.
//!
//! Children are hunted before their parent.  A parent that finds a grid of
//! its own supersedes the tables of its descendants only when it is at
//! least as clean as the best of them and every one of its dividers is
//! confirmed.  Candidates stay pending until the whole walk is over, so
//! ancestors always evaluate the untouched tree.

use log::debug;

use crate::config::HuntConfig;
use crate::grid::{self, Grid, GridContext};
use crate::transcribe::transcribe;
use crate::tree::{ContentTree, NodeKind, StructRole};
use crate::types::NodeId;

/// A grid accepted for transcription.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub scope: NodeId,
    pub ctx: GridContext,
    pub score: f64,
}

/// All children are justified text or headings: running prose.
fn looks_like_prose(tree: &ContentTree, node: NodeId) -> bool {
    let children = tree.children(node);
    !children.is_empty()
        && children.iter().all(|&c| match tree.get(c).map(|n| &n.kind) {
            Some(NodeKind::Text(block)) => block.justified,
            Some(NodeKind::Struct(s)) => matches!(s.role, StructRole::Heading(_)),
            _ => false,
        })
}

/// A grid with no descendant tables needs to beat the threshold.  One with
/// descendants must be at least as clean as the best of them and fully
/// confirmed.
fn accepts(grid: &Grid, score: f64, best: Option<f64>, threshold: f64) -> bool {
    match best {
        Some(best) => score <= best && grid.fully_confirmed(),
        None => score <= threshold,
    }
}

/// Hunt below (and at) `node` without touching the tree.
pub(crate) fn hunt(tree: &ContentTree, node: NodeId, threshold: f64, config: &HuntConfig) -> Vec<Candidate> {
    hunt_node(tree, node, threshold, config, true)
}

fn hunt_node(
    tree: &ContentTree,
    node: NodeId,
    threshold: f64,
    config: &HuntConfig,
    is_root: bool,
) -> Vec<Candidate> {
    let mut found = Vec::new();
    let mut existing_tables = false;
    for &child in tree.children(node) {
        match tree.role(child) {
            Some(StructRole::Table) => existing_tables = true,
            Some(role) if !role.is_table_part() => {
                found.extend(hunt_node(tree, child, threshold, config, false));
            }
            _ => {}
        }
    }

    if looks_like_prose(tree, node) {
        return found;
    }
    let grouping = tree.role(node).is_some_and(|r| r.is_grouping());
    if !is_root && !grouping {
        return found;
    }
    let Some(bounds) = tree.content_bounds(node) else {
        return found;
    };

    let ctx = match grid::find_grid(tree, node, bounds, config) {
        Ok(ctx) => ctx,
        Err(reject) => {
            debug!("no table in {node} at {bounds}: {reject}");
            return found;
        }
    };
    let score = grid::score(&ctx.grid);

    // Tables transcribed by an earlier hunt count as perfect descendants.
    let best = found
        .iter()
        .map(|c| c.score)
        .chain(existing_tables.then_some(0.0))
        .reduce(f64::min);

    if !accepts(&ctx.grid, score, best, threshold) {
        debug!(
            "candidate in {node} at {bounds} rejected (score {score:.3}, best below {best:?}, threshold {threshold})"
        );
        return found;
    }

    if !found.is_empty() {
        debug!("candidate in {node} supersedes {} descendant tables", found.len());
    }
    debug!("candidate in {node} at {bounds} accepted (score {score:.3})");
    vec![Candidate {
        scope: node,
        ctx,
        score,
    }]
}

/// Transcribe accepted candidates, then sweep orphans once.
pub(crate) fn transcribe_all(
    tree: &mut ContentTree,
    candidates: Vec<Candidate>,
    config: &HuntConfig,
) -> Vec<NodeId> {
    let tables = candidates
        .into_iter()
        .map(|c| transcribe(tree, c.scope, &c.ctx, config))
        .collect();
    tree.prune_orphans();
    tables
}
