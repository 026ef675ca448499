//! Page segmentation seam.
//!
//! Callers that already know where a table sits hand the hunt a rectangle.
//! A [`Segmenter`] turns that rectangle into a subtree the hunt can walk.

use log::debug;

use crate::tree::{ContentTree, NodeKind, StructRole};
use crate::types::{NodeId, Rect};
use crate::HuntError;

pub trait Segmenter {
    /// Gather the content inside `rect` under a single structural node and
    /// return it.
    fn segment(&mut self, tree: &mut ContentTree, rect: Rect) -> Result<NodeId, HuntError>;
}

/// Wraps everything inside the rectangle into a new `Div`, placed where the
/// first wrapped block used to be.
#[derive(Debug, Clone, Copy)]
pub struct RectSegmenter {
    pub wiggle_room: f64,
}

impl RectSegmenter {
    pub fn new(wiggle_room: f64) -> Self {
        RectSegmenter { wiggle_room }
    }
}

impl Segmenter for RectSegmenter {
    fn segment(&mut self, tree: &mut ContentTree, rect: Rect) -> Result<NodeId, HuntError> {
        if !rect.is_valid() || rect.is_empty() {
            return Err(HuntError::InvalidBounds(rect));
        }
        let area = rect.expand(self.wiggle_room);
        let parent = tree.find_container(tree.root(), rect, self.wiggle_room);
        let div = tree.alloc_struct(StructRole::Div, rect);

        let mut insert_at: Option<usize> = None;
        let mut removed = 0;
        for (i, child) in tree.children(parent).to_vec().into_iter().enumerate() {
            let bbox = tree.bbox(child);
            let is_text = match tree.get(child).map(|n| &n.kind) {
                Some(NodeKind::Struct(s)) if s.role.is_table_part() => continue,
                Some(NodeKind::GridInfo(_)) | None => continue,
                Some(NodeKind::Text(_)) => true,
                Some(_) => false,
            };

            if area.contains_rect(&bbox) {
                insert_at.get_or_insert(i - removed);
                tree.detach(child);
                tree.append_child(div, child);
                removed += 1;
            } else if is_text && rect.intersects(&bbox) {
                if let Some(block) = tree.take_text_within(child, rect) {
                    insert_at.get_or_insert(i - removed + 1);
                    let part_bbox = block.bbox().unwrap_or(rect);
                    let part = tree.alloc(NodeKind::Text(block), part_bbox);
                    tree.append_child(div, part);
                }
            }
        }

        let index = insert_at.unwrap_or(tree.children(parent).len());
        tree.insert_child(parent, index, div);
        tree.refresh_bbox(div);
        debug!(
            "segmented {} blocks of {parent} inside {rect} into {div}",
            tree.children(div).len()
        );
        Ok(div)
    }
}
