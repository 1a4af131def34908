use std::rc::Rc;

use bd_core::{DialogueError, Node, NodeIndex, NodeKind, NodeType, Speaker, TreeDocument};

use crate::instance::{SharedInstance, SharedStore};

mod advance;
mod eval;
mod lifecycle;
mod query;
mod settle;
mod snapshot;

pub use lifecycle::LoadReport;

/// Upper bound on node visits in one settle pass.
pub const MAX_SETTLE_HOPS: usize = 100;
pub const READER_SNAPSHOT_SCHEMA: &str = "reader-snapshot.v1";

/// Walks a dialogue tree from stoppable node to stoppable node.
///
/// The reader is `Idle` until [`TreeReader::load_tree`] succeeds; afterwards the
/// cursor always rests on an End, Dialogue or Branch node between calls.
pub struct TreeReader {
    globals: SharedStore,
    tree: Option<SharedInstance>,
    cursor: NodeIndex,
    /// Speaker to restore on the next hop, set while resting on a Dialogue node
    /// with its own speaker override.
    pending_revert: Option<Speaker>,
    speaker_changed: bool,
}

impl TreeReader {
    pub fn new(globals: SharedStore) -> Self {
        Self {
            globals,
            tree: None,
            cursor: 0,
            pending_revert: None,
            speaker_changed: false,
        }
    }

    pub fn globals(&self) -> SharedStore {
        Rc::clone(&self.globals)
    }

    pub fn tree(&self) -> Option<SharedInstance> {
        self.tree.as_ref().map(Rc::clone)
    }

    pub fn is_loaded(&self) -> bool {
        self.tree.is_some()
    }

    fn loaded(&self) -> Result<&SharedInstance, DialogueError> {
        self.tree
            .as_ref()
            .ok_or_else(|| DialogueError::new("READER_NO_TREE", "No tree is loaded."))
    }

    fn document(&self) -> Result<Rc<TreeDocument>, DialogueError> {
        Ok(self.loaded()?.borrow().document_rc())
    }
}

fn node_at(document: &TreeDocument, index: NodeIndex) -> Result<&Node, DialogueError> {
    document.node(index).ok_or_else(|| {
        DialogueError::at_node(
            "READER_DANGLING_EDGE",
            format!(
                "Edge points at node {} but tree \"{}\" has {} nodes.",
                index,
                document.name,
                document.nodes.len()
            ),
            index,
        )
    })
}

fn output_slot(node: &Node, slot: usize) -> Result<NodeIndex, DialogueError> {
    node.output_at(slot).ok_or_else(|| {
        DialogueError::at_node(
            "READER_DANGLING_EDGE",
            format!(
                "{} node {} has nothing connected to out slot {}.",
                node.node_type().name(),
                node.index,
                slot
            ),
            node.index,
        )
    })
}

fn is_branch(document: &TreeDocument, index: NodeIndex) -> bool {
    matches!(
        document.node(index).map(|node| &node.kind),
        Some(NodeKind::Branch { .. })
    )
}
