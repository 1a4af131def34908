use super::*;

/// Outcome of a successful [`TreeReader::load_tree`]. Validation issues do not
/// stop the load; they are reported here and logged.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub tree_name: String,
    pub start_id: i32,
    pub start_node: NodeIndex,
    pub resting: NodeType,
    pub issues: Vec<DialogueError>,
}

impl LoadReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

impl TreeReader {
    /// Loads `tree` and settles on its first stoppable node. `None` uses the tree's
    /// current default start id (which StartChange nodes may have moved).
    ///
    /// On error the reader is left idle.
    pub fn load_tree(
        &mut self,
        tree: SharedInstance,
        start_id: Option<i32>,
    ) -> Result<LoadReport, DialogueError> {
        self.unload();

        let (document, start_id) = {
            let instance = tree.borrow();
            (
                instance.document_rc(),
                start_id.unwrap_or(instance.default_start_id),
            )
        };

        let issues = document.validate();
        for issue in &issues {
            tracing::error!(
                tree = %document.name,
                code = %issue.code,
                "tree is not valid: {}",
                issue.message
            );
        }

        let start_node = document.find_start(start_id).ok_or_else(|| {
            DialogueError::new(
                "READER_START_NOT_FOUND",
                format!(
                    "Tree \"{}\" has no Start node with id {}.",
                    document.name, start_id
                ),
            )
        })?;
        let first = node_at(&document, start_node)?
            .single_output()
            .ok_or_else(|| {
                DialogueError::at_node(
                    "READER_NO_SINGLE_EXIT",
                    format!("Start node {} must have exactly one outbound edge.", start_node),
                    start_node,
                )
            })?;

        self.tree = Some(tree);
        self.cursor = start_node;
        self.speaker_changed = false;

        match self.settle(first) {
            Ok(resting) => Ok(LoadReport {
                tree_name: document.name.clone(),
                start_id,
                start_node,
                resting,
                issues,
            }),
            Err(error) => {
                self.unload();
                Err(error)
            }
        }
    }

    /// Drops the current tree, first restoring any speaker override still active on it.
    pub fn unload(&mut self) {
        if let (Some(saved), Some(tree)) = (self.pending_revert.take(), self.tree.as_ref()) {
            tree.borrow_mut().speaker = saved;
        }
        self.tree = None;
        self.cursor = 0;
    }
}
