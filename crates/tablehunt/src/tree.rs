//! Arena-backed content tree.
//!
//! Pages arrive already decomposed into positioned blocks: text blocks made
//! of lines of characters, vector shapes, and structural groupings.  Nodes
//! live in a single `Vec` and refer to each other through [`NodeId`]
//! handles, so relocating a subtree is a matter of removing a handle from
//! one child list and pushing it onto another.

use serde::{Deserialize, Serialize};

use crate::grid::GridInfo;
use crate::types::{NodeId, Rect};
use crate::HuntError;

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextChar {
    pub c: char,
    pub bbox: Rect,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub chars: Vec<TextChar>,
}

impl TextLine {
    /// Lay out `text` with fixed-advance glyphs starting at `(x, y)`.
    pub fn monospace(text: &str, x: f64, y: f64, char_width: f64, height: f64) -> Self {
        let chars = text
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let x0 = x + i as f64 * char_width;
                TextChar {
                    c,
                    bbox: Rect::new(x0, y, x0 + char_width, y + height),
                }
            })
            .collect();
        TextLine { chars }
    }

    pub fn bbox(&self) -> Option<Rect> {
        Rect::union_all(self.chars.iter().map(|ch| ch.bbox))
    }

    pub fn text(&self) -> String {
        self.chars.iter().map(|ch| ch.c).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    /// Justified blocks deliberately hide their row structure, so the hunt
    /// treats them as a single row.
    pub justified: bool,
}

impl TextBlock {
    pub fn bbox(&self) -> Option<Rect> {
        Rect::union_all(self.lines.iter().filter_map(TextLine::bbox))
    }

    pub fn char_count(&self) -> usize {
        self.lines.iter().map(|l| l.chars.len()).sum()
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Flags describing a vector path.  Geometry lives on the owning node's bbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorShape {
    pub stroked: bool,
    pub filled: bool,
    /// The path is exactly its bounding rectangle.
    pub rectangle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructRole {
    Page,
    Div,
    Part,
    Sect,
    Art,
    NonStruct,
    Paragraph,
    Heading(u8),
    List,
    ListItem,
    Figure,
    Table,
    TableRow,
    TableCell {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

impl StructRole {
    /// Roles that only group other content and carry no meaning of their own.
    pub fn is_grouping(&self) -> bool {
        matches!(
            self,
            StructRole::Page
                | StructRole::Div
                | StructRole::Part
                | StructRole::Sect
                | StructRole::Art
                | StructRole::NonStruct
        )
    }

    pub fn is_table_part(&self) -> bool {
        matches!(
            self,
            StructRole::Table | StructRole::TableRow | StructRole::TableCell { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructBlock {
    pub role: StructRole,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Text(TextBlock),
    Vector(VectorShape),
    Struct(StructBlock),
    GridInfo(GridInfo),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub bbox: Rect,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl ContentTree {
    /// Create an empty page whose root covers `page`.
    pub fn new(page: Rect) -> Self {
        ContentTree {
            nodes: vec![Node {
                bbox: page,
                parent: None,
                kind: NodeKind::Struct(StructBlock {
                    role: StructRole::Page,
                    children: Vec::new(),
                }),
            }],
            root: NodeId::new(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, HuntError> {
        self.get(id).ok_or(HuntError::UnknownNode(id))
    }

    pub fn bbox(&self, id: NodeId) -> Rect {
        self.nodes[id.index()].bbox
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.index()].kind {
            NodeKind::Struct(s) => &s.children,
            _ => &[],
        }
    }

    pub fn role(&self, id: NodeId) -> Option<StructRole> {
        match &self.nodes[id.index()].kind {
            NodeKind::Struct(s) => Some(s.role),
            _ => None,
        }
    }

    /// Every node reachable from `id`, in document order (`id` first).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Union of the boxes of the content under `id`, ignoring grid-info records.
    pub fn content_bounds(&self, id: NodeId) -> Option<Rect> {
        Rect::union_all(
            self.children(id)
                .iter()
                .filter(|&&c| !matches!(self.nodes[c.index()].kind, NodeKind::GridInfo(_)))
                .map(|&c| self.bbox(c)),
        )
    }

    // -- Construction -----------------------------------------------------

    /// Allocate a node that is not yet linked into the tree.
    pub fn alloc(&mut self, kind: NodeKind, bbox: Rect) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node {
            bbox,
            parent: None,
            kind,
        });
        id
    }

    pub(crate) fn alloc_struct(&mut self, role: StructRole, bbox: Rect) -> NodeId {
        self.alloc(
            NodeKind::Struct(StructBlock {
                role,
                children: Vec::new(),
            }),
            bbox,
        )
    }

    pub fn add_struct(&mut self, parent: NodeId, role: StructRole) -> NodeId {
        let bbox = self.bbox(parent);
        let id = self.alloc_struct(role, bbox);
        self.append_child(parent, id);
        id
    }

    pub fn add_text(&mut self, parent: NodeId, block: TextBlock) -> NodeId {
        let bbox = block.bbox().unwrap_or_default();
        let id = self.alloc(NodeKind::Text(block), bbox);
        self.append_child(parent, id);
        self.refresh_ancestors(id);
        id
    }

    pub fn add_vector(&mut self, parent: NodeId, shape: VectorShape, bbox: Rect) -> NodeId {
        let id = self.alloc(NodeKind::Vector(shape), bbox);
        self.append_child(parent, id);
        self.refresh_ancestors(id);
        id
    }

    // -- Linking ----------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child);
    }

    /// Link a detached `child` under `parent` at `index` (clamped).
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let NodeKind::Struct(s) = &mut self.nodes[parent.index()].kind {
            let index = index.min(s.children.len());
            s.children.insert(index, child);
            self.nodes[child.index()].parent = Some(parent);
        }
    }

    /// Unlink `id` from its parent, returning the index it occupied.
    pub fn detach(&mut self, id: NodeId) -> Option<usize> {
        let parent = self.nodes[id.index()].parent.take()?;
        match &mut self.nodes[parent.index()].kind {
            NodeKind::Struct(s) => {
                let index = s.children.iter().position(|&c| c == id)?;
                s.children.remove(index);
                Some(index)
            }
            _ => None,
        }
    }

    /// Relocate `id` (with its subtree) to the end of `new_parent`'s children.
    pub fn move_node(&mut self, id: NodeId, new_parent: NodeId) {
        self.detach(id);
        self.append_child(new_parent, id);
    }

    // -- Bounding boxes ---------------------------------------------------

    /// Recompute the bbox of a structural node from its children.  Table
    /// cells keep the rectangle they were created with; the page root keeps
    /// the page box.
    pub(crate) fn refresh_bbox(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let bbox = match &self.nodes[id.index()].kind {
            NodeKind::Struct(s) if matches!(s.role, StructRole::TableCell { .. }) => return,
            NodeKind::Struct(_) => self.content_bounds(id),
            NodeKind::Text(block) => block.bbox(),
            _ => return,
        };
        if let Some(bbox) = bbox {
            self.nodes[id.index()].bbox = bbox;
        }
    }

    fn refresh_ancestors(&mut self, id: NodeId) {
        let mut current = self.parent(id);
        while let Some(p) = current {
            self.refresh_bbox(p);
            current = self.parent(p);
        }
    }

    // -- Text surgery -----------------------------------------------------

    /// Remove from text block `id` every character whose centre lies inside
    /// `area`, returning them as a new block.  Lines keep their identity: a
    /// line entirely inside moves whole, a straddling line is split.
    pub(crate) fn take_text_within(&mut self, id: NodeId, area: Rect) -> Option<TextBlock> {
        let node = &mut self.nodes[id.index()];
        let NodeKind::Text(block) = &mut node.kind else {
            return None;
        };

        let mut taken: Vec<TextLine> = Vec::new();
        let mut kept: Vec<TextLine> = Vec::new();
        for line in block.lines.drain(..) {
            let (inside, outside): (Vec<TextChar>, Vec<TextChar>) =
                line.chars.into_iter().partition(|ch| {
                    let (cx, cy) = ch.bbox.center();
                    area.contains_point(cx, cy)
                });
            if !inside.is_empty() {
                taken.push(TextLine { chars: inside });
            }
            if !outside.is_empty() {
                kept.push(TextLine { chars: outside });
            }
        }
        block.lines = kept;
        let justified = block.justified;
        if let Some(bbox) = block.bbox() {
            node.bbox = bbox;
        }

        if taken.is_empty() {
            None
        } else {
            Some(TextBlock {
                lines: taken,
                justified,
            })
        }
    }

    /// Plain text under `id` in document order.
    pub fn text_of(&self, id: NodeId) -> String {
        match &self.nodes[id.index()].kind {
            NodeKind::Text(block) => block.text(),
            NodeKind::Struct(s) => s
                .children
                .iter()
                .map(|&c| self.text_of(c))
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            _ => String::new(),
        }
    }

    // -- Navigation -------------------------------------------------------

    /// Deepest non-table structural node at or below `start` whose bbox
    /// (grown by `slack`) contains `rect`.
    pub fn find_container(&self, start: NodeId, rect: Rect, slack: f64) -> NodeId {
        let mut current = start;
        'descend: loop {
            for &child in self.children(current) {
                let Some(role) = self.role(child) else {
                    continue;
                };
                if !role.is_table_part() && self.bbox(child).expand(slack).contains_rect(&rect) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    // -- Orphan sweep -----------------------------------------------------

    /// Drop text blocks that lost all their characters and structural nodes
    /// that lost all their children, then recompute structural boxes.
    pub fn prune_orphans(&mut self) {
        let root = self.root;
        self.prune_from(root);
    }

    fn prune_from(&mut self, id: NodeId) -> bool {
        for child in self.children(id).to_vec() {
            if !self.prune_from(child) {
                self.detach(child);
            }
        }

        let keep = match &mut self.nodes[id.index()].kind {
            NodeKind::Text(block) => {
                block.lines.retain(|l| !l.chars.is_empty());
                !block.lines.is_empty()
            }
            NodeKind::Struct(s) => {
                id == self.root
                    || matches!(s.role, StructRole::TableCell { .. })
                    || !s.children.is_empty()
            }
            NodeKind::Vector(_) | NodeKind::GridInfo(_) => true,
        };
        if keep {
            self.refresh_bbox(id);
        }
        keep
    }

    // -- Views ------------------------------------------------------------

    /// Nested, serialisable rendering of the subtree under `id`.
    pub fn view(&self, id: NodeId) -> BlockView {
        let node = &self.nodes[id.index()];
        match &node.kind {
            NodeKind::Text(block) => BlockView::Text {
                bbox: node.bbox,
                justified: block.justified,
                lines: block.lines.iter().map(TextLine::text).collect(),
            },
            NodeKind::Vector(shape) => BlockView::Vector {
                bbox: node.bbox,
                shape: *shape,
            },
            NodeKind::Struct(s) => BlockView::Struct {
                role: s.role,
                bbox: node.bbox,
                children: s.children.iter().map(|&c| self.view(c)).collect(),
            },
            NodeKind::GridInfo(info) => BlockView::GridInfo { info: info.clone() },
        }
    }

    // -- Input ------------------------------------------------------------

    /// Build a tree from a nested page description.
    pub fn from_spec(spec: &PageSpec) -> Self {
        let mut tree = ContentTree::new(spec.bbox.unwrap_or_default());
        let root = tree.root;
        for block in &spec.blocks {
            tree.add_spec(root, block);
        }
        if spec.bbox.is_none() {
            if let Some(bounds) = tree.content_bounds(root) {
                tree.nodes[root.index()].bbox = bounds;
            }
        }
        tree
    }

    fn add_spec(&mut self, parent: NodeId, spec: &BlockSpec) {
        match spec {
            BlockSpec::Text { lines, justified } => {
                let block = TextBlock {
                    lines: lines
                        .iter()
                        .map(|l| TextLine::monospace(&l.text, l.x, l.y, l.char_width, l.height))
                        .filter(|l| !l.chars.is_empty())
                        .collect(),
                    justified: *justified,
                };
                if !block.lines.is_empty() {
                    self.add_text(parent, block);
                }
            }
            BlockSpec::Vector {
                bbox,
                stroked,
                filled,
                rectangle,
            } => {
                let shape = VectorShape {
                    stroked: *stroked,
                    filled: *filled,
                    rectangle: *rectangle,
                };
                self.add_vector(parent, shape, *bbox);
            }
            BlockSpec::Struct { role, children } => {
                let id = self.add_struct(parent, *role);
                for child in children {
                    self.add_spec(id, child);
                }
            }
        }
    }
}

/// Nested output form of a subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockView {
    Text {
        bbox: Rect,
        justified: bool,
        lines: Vec<String>,
    },
    Vector {
        bbox: Rect,
        shape: VectorShape,
    },
    Struct {
        role: StructRole,
        bbox: Rect,
        children: Vec<BlockView>,
    },
    GridInfo {
        info: GridInfo,
    },
}

// ---------------------------------------------------------------------------
// Page description (input format)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    #[serde(default)]
    pub bbox: Option<Rect>,
    pub blocks: Vec<BlockSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockSpec {
    Text {
        lines: Vec<LineSpec>,
        #[serde(default)]
        justified: bool,
    },
    Vector {
        bbox: Rect,
        #[serde(default)]
        stroked: bool,
        #[serde(default = "default_true")]
        filled: bool,
        #[serde(default = "default_true")]
        rectangle: bool,
    },
    Struct {
        role: StructRole,
        #[serde(default)]
        children: Vec<BlockSpec>,
    },
}

impl BlockSpec {
    /// A text block with one monospaced line per `(text, x, y)` entry.
    pub fn text(lines: &[(&str, f64, f64)]) -> Self {
        BlockSpec::Text {
            lines: lines
                .iter()
                .map(|&(text, x, y)| LineSpec::new(text, x, y))
                .collect(),
            justified: false,
        }
    }

    /// A filled rectangle, the usual encoding of a ruled line.
    pub fn rule(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        BlockSpec::Vector {
            bbox: Rect::new(x0, y0, x1, y1),
            stroked: false,
            filled: true,
            rectangle: true,
        }
    }

    pub fn group(role: StructRole, children: Vec<BlockSpec>) -> Self {
        BlockSpec::Struct { role, children }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSpec {
    pub text: String,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_char_width")]
    pub char_width: f64,
    #[serde(default = "default_line_height")]
    pub height: f64,
}

impl LineSpec {
    pub fn new(text: &str, x: f64, y: f64) -> Self {
        LineSpec {
            text: text.to_string(),
            x,
            y,
            char_width: default_char_width(),
            height: default_line_height(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_char_width() -> f64 {
    5.0
}

fn default_line_height() -> f64 {
    10.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> ContentTree {
        ContentTree::from_spec(&PageSpec {
            bbox: None,
            blocks: vec![
                BlockSpec::text(&[("Hello world", 0.0, 0.0)]),
                BlockSpec::group(
                    StructRole::Div,
                    vec![
                        BlockSpec::text(&[("abc", 0.0, 20.0), ("def", 0.0, 30.0)]),
                        BlockSpec::rule(0.0, 45.0, 50.0, 46.0),
                    ],
                ),
            ],
        })
    }

    #[test]
    fn test_monospace_layout() {
        let line = TextLine::monospace("ab", 10.0, 20.0, 5.0, 10.0);
        assert_eq!(line.chars.len(), 2);
        assert_eq!(line.chars[1].bbox, Rect::new(15.0, 20.0, 20.0, 30.0));
        assert_eq!(line.bbox(), Some(Rect::new(10.0, 20.0, 20.0, 30.0)));
        assert_eq!(line.text(), "ab");
    }

    #[test]
    fn test_from_spec_builds_nested_structure() {
        let tree = sample_tree();
        let root = tree.root();
        assert_eq!(tree.children(root).len(), 2);
        let div = tree.children(root)[1];
        assert_eq!(tree.role(div), Some(StructRole::Div));
        assert_eq!(tree.children(div).len(), 2);
        assert_eq!(tree.bbox(div), Rect::new(0.0, 20.0, 50.0, 46.0));
        assert_eq!(tree.bbox(root), Rect::new(0.0, 0.0, 55.0, 46.0));
    }

    #[test]
    fn test_text_of_joins_in_document_order() {
        let tree = sample_tree();
        assert_eq!(tree.text_of(tree.root()), "Hello world abc def");
    }

    #[test]
    fn test_move_node_updates_parent_links() {
        let mut tree = sample_tree();
        let root = tree.root();
        let div = tree.children(root)[1];
        let first = tree.children(root)[0];
        tree.move_node(first, div);
        assert_eq!(tree.parent(first), Some(div));
        assert_eq!(tree.children(root), &[div]);
        assert_eq!(tree.children(div).last(), Some(&first));
    }

    #[test]
    fn test_take_text_within_splits_lines_by_char_centre() {
        let mut tree = sample_tree();
        let text = tree.children(tree.root())[0];
        // Take "Hello" (x 0..25) and leave " world".
        let taken = tree
            .take_text_within(text, Rect::new(0.0, 0.0, 25.0, 10.0))
            .unwrap();
        assert_eq!(taken.text(), "Hello");
        assert_eq!(tree.text_of(text), "world");
        assert_eq!(tree.bbox(text), Rect::new(25.0, 0.0, 55.0, 10.0));
    }

    #[test]
    fn test_take_text_within_nothing_inside() {
        let mut tree = sample_tree();
        let text = tree.children(tree.root())[0];
        assert!(tree
            .take_text_within(text, Rect::new(100.0, 100.0, 120.0, 120.0))
            .is_none());
        assert_eq!(tree.text_of(text), "Hello world");
    }

    #[test]
    fn test_prune_orphans_removes_empty_wrappers() {
        let mut tree = sample_tree();
        let root = tree.root();
        let div = tree.children(root)[1];
        let inner_text = tree.children(div)[0];
        let rule = tree.children(div)[1];
        tree.take_text_within(inner_text, Rect::new(0.0, 0.0, 100.0, 100.0));
        tree.move_node(rule, root);
        tree.prune_orphans();
        // The div lost its text (now empty) and its rule, so it is gone.
        assert_eq!(tree.children(root).len(), 2);
        assert!(!tree.children(root).contains(&div));
    }

    #[test]
    fn test_prune_keeps_empty_table_cells() {
        let mut tree = ContentTree::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let root = tree.root();
        let row = tree.add_struct(root, StructRole::TableRow);
        let cell = tree.alloc_struct(
            StructRole::TableCell {
                row: 0,
                col: 0,
                rows: 1,
                cols: 1,
            },
            Rect::new(0.0, 0.0, 10.0, 10.0),
        );
        tree.append_child(row, cell);
        tree.prune_orphans();
        assert_eq!(tree.children(row), &[cell]);
        assert_eq!(tree.bbox(cell), Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_find_container_descends_into_enclosing_struct() {
        let tree = sample_tree();
        let div = tree.children(tree.root())[1];
        let found = tree.find_container(tree.root(), Rect::new(1.0, 21.0, 10.0, 35.0), 0.5);
        assert_eq!(found, div);
        let found = tree.find_container(tree.root(), Rect::new(0.0, 0.0, 50.0, 40.0), 0.5);
        assert_eq!(found, tree.root());
    }

    #[test]
    fn test_descendants_in_document_order() {
        let tree = sample_tree();
        let all = tree.descendants(tree.root());
        assert_eq!(all.len(), 5);
        assert_eq!(all[0], tree.root());
        assert_eq!(all[1], tree.children(tree.root())[0]);
    }

    #[test]
    fn test_struct_role_classification() {
        assert!(StructRole::Div.is_grouping());
        assert!(StructRole::Page.is_grouping());
        assert!(!StructRole::Heading(1).is_grouping());
        assert!(StructRole::TableRow.is_table_part());
        assert!(!StructRole::Paragraph.is_table_part());
    }
}
