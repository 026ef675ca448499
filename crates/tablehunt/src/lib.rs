use log::debug;
use thiserror::Error;

pub mod config;
pub mod grid;
pub mod render;
pub mod segment;
pub mod tree;
pub mod types;

mod hunt;
mod transcribe;

pub use config::HuntConfig;
pub use grid::{find_grid, score, GridContext, GridInfo, Reject};
pub use segment::{RectSegmenter, Segmenter};
pub use tree::{BlockSpec, BlockView, ContentTree, NodeKind, PageSpec, StructRole};
pub use types::*;

#[derive(Debug, Error)]
pub enum HuntError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("Invalid bounds: {0}")]
    InvalidBounds(Rect),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Hunt the whole page for tables and transcribe the ones whose score is at
/// most `config.score_threshold`.  Returns the new Table nodes.
pub fn hunt_tables(tree: &mut ContentTree, config: &HuntConfig) -> Vec<NodeId> {
    let candidates = hunt::hunt(tree, tree.root(), config.score_threshold, config);
    hunt::transcribe_all(tree, candidates, config)
}

/// Hunt only inside `rect`, accepting any structurally valid grid.
pub fn hunt_tables_within_bounds(
    tree: &mut ContentTree,
    rect: Rect,
    config: &HuntConfig,
) -> Result<Vec<NodeId>, HuntError> {
    let mut segmenter = RectSegmenter::new(config.wiggle_room);
    hunt_tables_within_bounds_with(tree, rect, config, &mut segmenter)
}

/// Like [`hunt_tables_within_bounds`] with a caller-supplied segmenter.
pub fn hunt_tables_within_bounds_with<S: Segmenter>(
    tree: &mut ContentTree,
    rect: Rect,
    config: &HuntConfig,
    segmenter: &mut S,
) -> Result<Vec<NodeId>, HuntError> {
    let scope = segmenter.segment(tree, rect)?;
    tree.node(scope)?;
    let candidates = hunt::hunt(tree, scope, f64::INFINITY, config);
    Ok(hunt::transcribe_all(tree, candidates, config))
}

/// Evaluate `rect` once, without recursion or scoring, and transcribe the
/// grid if there is one.  The returned Table's first child carries the
/// [`GridInfo`] record.
pub fn find_table_within_bounds(
    tree: &mut ContentTree,
    rect: Rect,
    config: &HuntConfig,
) -> Result<Option<NodeId>, HuntError> {
    if !rect.is_valid() || rect.is_empty() {
        return Err(HuntError::InvalidBounds(rect));
    }
    let container = tree.find_container(tree.root(), rect, config.wiggle_room);
    let ctx = match find_grid(tree, container, rect, config) {
        Ok(ctx) => ctx,
        Err(reject) => {
            debug!("no table within {rect}: {reject}");
            return Ok(None);
        }
    };
    let table = transcribe::transcribe(tree, container, &ctx, config);
    tree.prune_orphans();
    Ok(Some(table))
}

/// Grid-info record of a transcribed table.
pub fn grid_info(tree: &ContentTree, table: NodeId) -> Result<Option<&GridInfo>, HuntError> {
    tree.node(table)?;
    Ok(tree
        .children(table)
        .first()
        .and_then(|&c| tree.get(c))
        .and_then(|n| match &n.kind {
            NodeKind::GridInfo(info) => Some(info),
            _ => None,
        }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_table_rejects_inverted_rect() {
        let mut tree = ContentTree::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let err = find_table_within_bounds(&mut tree, Rect::new(50.0, 0.0, 10.0, 10.0), &HuntConfig::default())
            .unwrap_err();
        assert!(matches!(err, HuntError::InvalidBounds(_)));
    }

    #[test]
    fn test_empty_page_has_no_tables() {
        let mut tree = ContentTree::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(hunt_tables(&mut tree, &HuntConfig::default()).is_empty());
        let found = find_table_within_bounds(&mut tree, Rect::new(0.0, 0.0, 100.0, 100.0), &HuntConfig::default())
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_grid_info_of_unknown_node() {
        let tree = ContentTree::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let missing = NodeId::new(42);
        assert!(matches!(grid_info(&tree, missing), Err(HuntError::UnknownNode(_))));
    }
}
