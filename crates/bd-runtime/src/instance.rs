use std::cell::RefCell;
use std::rc::Rc;

use bd_core::{Speaker, TreeDocument, VariableStore};

/// Process-wide global variables, handed to every reader that should share them.
pub type SharedStore = Rc<RefCell<VariableStore>>;

pub type SharedInstance = Rc<RefCell<TreeInstance>>;

pub fn shared_store(store: VariableStore) -> SharedStore {
    Rc::new(RefCell::new(store))
}

/// Live state of one loaded tree. The document is never mutated; everything the
/// traversal changes (locals, default start id, standing speaker) lives here and
/// survives switching to another tree and back.
#[derive(Debug, Clone)]
pub struct TreeInstance {
    document: Rc<TreeDocument>,
    pub locals: VariableStore,
    pub default_start_id: i32,
    pub speaker: Speaker,
}

impl TreeInstance {
    pub fn new(document: TreeDocument) -> Self {
        Self::from_shared(Rc::new(document))
    }

    pub fn from_shared(document: Rc<TreeDocument>) -> Self {
        Self {
            locals: VariableStore::from_variables(document.variables.clone()),
            default_start_id: document.default_start_id,
            speaker: document.default_speaker(),
            document,
        }
    }

    pub fn into_shared(self) -> SharedInstance {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.document.name
    }

    pub fn document(&self) -> &TreeDocument {
        &self.document
    }

    pub fn document_rc(&self) -> Rc<TreeDocument> {
        Rc::clone(&self.document)
    }

    /// Restores authored locals, default start id and speaker.
    pub fn reset(&mut self) {
        self.locals = VariableStore::from_variables(self.document.variables.clone());
        self.default_start_id = self.document.default_start_id;
        self.speaker = self.document.default_speaker();
    }
}

#[cfg(test)]
mod instance_tests {
    use super::*;
    use bd_core::{TreeBuilder, VarValue, Variable};

    fn document() -> TreeDocument {
        let mut builder = TreeBuilder::new("inn")
            .default_start_id(2)
            .variable(Variable::new("rooms").with_int(3));
        builder.info("Keeper");
        builder.build().expect("inn tree")
    }

    #[test]
    fn new_copies_authored_state() {
        let instance = TreeInstance::new(document());
        assert_eq!(instance.name(), "inn");
        assert_eq!(instance.default_start_id, 2);
        assert_eq!(instance.speaker.name, "Keeper");
        assert_eq!(instance.locals.get_int("rooms"), Some(3));
    }

    #[test]
    fn reset_discards_runtime_changes() {
        let mut instance = TreeInstance::new(document());
        instance.locals.set("rooms", VarValue::Int(0));
        instance.default_start_id = 9;
        instance.speaker = Speaker::new("Guard", None);

        instance.reset();

        assert_eq!(instance.locals.get_int("rooms"), Some(3));
        assert_eq!(instance.default_start_id, 2);
        assert_eq!(instance.speaker.name, "Keeper");
        assert_eq!(instance.document().variables[0].int_val, 3);
    }
}
