use super::*;

impl TreeReader {
    /// Follows the current node's only outbound edge and settles.
    pub fn advance(&mut self) -> Result<NodeType, DialogueError> {
        let document = self.document()?;
        let current = node_at(&document, self.cursor)?;
        let next = current.single_output().ok_or_else(|| {
            DialogueError::at_node(
                "READER_NO_SINGLE_EXIT",
                format!(
                    "{} node {} has {} outbound edges; advance() needs exactly one.",
                    current.node_type().name(),
                    current.index,
                    current.outputs.len()
                ),
                self.cursor,
            )
        })?;
        self.settle(next)
    }

    /// Takes the Branch path wired to out slot `choice` and settles.
    pub fn advance_choice(&mut self, choice: usize) -> Result<NodeType, DialogueError> {
        let document = self.document()?;
        let current = node_at(&document, self.cursor)?;
        if !matches!(current.kind, NodeKind::Branch { .. }) {
            return Err(DialogueError::at_node(
                "READER_NOT_ON_BRANCH",
                format!(
                    "Choices can only be made on a Branch; cursor is on {} node {}.",
                    current.node_type().name(),
                    self.cursor
                ),
                self.cursor,
            ));
        }
        let next = current.output_at(choice).ok_or_else(|| {
            DialogueError::at_node(
                "READER_CHOICE_NOT_FOUND",
                format!(
                    "Branch node {} has nothing wired to choice {}.",
                    self.cursor, choice
                ),
                self.cursor,
            )
        })?;
        self.settle(next)
    }

    /// Places the cursor directly on a stoppable node without running anything.
    pub fn jump_to(&mut self, index: NodeIndex) -> Result<NodeType, DialogueError> {
        let document = self.document()?;
        let node = document.node(index).ok_or_else(|| {
            DialogueError::new(
                "READER_NODE_OUT_OF_RANGE",
                format!(
                    "Node {} does not exist in tree \"{}\".",
                    index, document.name
                ),
            )
        })?;
        let node_type = node.node_type();
        if !node_type.is_stoppable() {
            return Err(DialogueError::at_node(
                "READER_NOT_STOPPABLE",
                format!("Cannot rest on {} node {}.", node_type.name(), index),
                index,
            ));
        }
        self.cursor = index;
        Ok(node_type)
    }
}
