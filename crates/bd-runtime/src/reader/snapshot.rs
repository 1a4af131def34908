use bd_core::{ReaderSnapshot, VariableStore};

use super::*;

impl TreeReader {
    /// Captures everything needed to continue this conversation in another process.
    pub fn snapshot(&self) -> Result<ReaderSnapshot, DialogueError> {
        let instance = self.loaded()?.borrow();
        Ok(ReaderSnapshot {
            schema_version: READER_SNAPSHOT_SCHEMA.to_string(),
            tree_name: instance.name().to_string(),
            cursor: self.cursor,
            default_start_id: instance.default_start_id,
            speaker: instance.speaker.clone(),
            pending_revert: self.pending_revert.clone(),
            speaker_changed: self.speaker_changed,
            locals: instance.locals.variables().to_vec(),
            globals: self.globals.borrow().variables().to_vec(),
        })
    }

    /// Restores a snapshot onto `tree`, which must be an instance of the same tree.
    /// Both the tree's state and the shared global store are overwritten.
    pub fn resume(
        &mut self,
        tree: SharedInstance,
        snapshot: ReaderSnapshot,
    ) -> Result<(), DialogueError> {
        if snapshot.schema_version != READER_SNAPSHOT_SCHEMA {
            return Err(DialogueError::new(
                "SNAPSHOT_SCHEMA",
                format!(
                    "Unsupported snapshot schema \"{}\"; expected \"{}\".",
                    snapshot.schema_version, READER_SNAPSHOT_SCHEMA
                ),
            ));
        }

        {
            let instance = tree.borrow();
            if instance.name() != snapshot.tree_name {
                return Err(DialogueError::new(
                    "SNAPSHOT_TREE_MISMATCH",
                    format!(
                        "Snapshot belongs to tree \"{}\", not \"{}\".",
                        snapshot.tree_name,
                        instance.name()
                    ),
                ));
            }
            let resting = instance.document().node_type(snapshot.cursor);
            if !resting.is_some_and(NodeType::is_stoppable) {
                return Err(DialogueError::at_node(
                    "SNAPSHOT_CURSOR_INVALID",
                    format!(
                        "Snapshot cursor {} is not a stoppable node of \"{}\".",
                        snapshot.cursor, snapshot.tree_name
                    ),
                    snapshot.cursor,
                ));
            }
        }

        self.unload();
        {
            let mut instance = tree.borrow_mut();
            instance.locals = VariableStore::from_variables(snapshot.locals);
            instance.default_start_id = snapshot.default_start_id;
            instance.speaker = snapshot.speaker;
        }
        *self.globals.borrow_mut() = VariableStore::from_variables(snapshot.globals);

        self.tree = Some(tree);
        self.cursor = snapshot.cursor;
        self.pending_revert = snapshot.pending_revert;
        self.speaker_changed = snapshot.speaker_changed;
        Ok(())
    }
}
