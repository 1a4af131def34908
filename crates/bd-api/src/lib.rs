use std::collections::BTreeMap;

use bd_core::{DialogueError, ReaderSnapshot, TreeDocument, VariableStore};
use bd_runtime::{shared_store, LoadReport, SharedInstance, SharedStore, TreeInstance, TreeReader};

pub fn parse_tree_json(path: &str, text: &str) -> Result<TreeDocument, DialogueError> {
    serde_json::from_str(text).map_err(|error| {
        DialogueError::new(
            "API_TREE_JSON_INVALID",
            format!("Failed to parse tree document \"{}\": {}", path, error),
        )
    })
}

/// Parses a global variable list. Names must be unique ignoring case.
pub fn parse_globals_json(text: &str) -> Result<VariableStore, DialogueError> {
    let variables: Vec<bd_core::Variable> = serde_json::from_str(text).map_err(|error| {
        DialogueError::new(
            "API_GLOBALS_JSON_INVALID",
            format!("Failed to parse globals: {}", error),
        )
    })?;
    let mut store = VariableStore::new();
    for variable in variables {
        let name = variable.name.clone();
        if !store.add(variable) {
            return Err(DialogueError::new(
                "API_GLOBALS_DUPLICATE",
                format!("Global variable \"{}\" is declared twice.", name),
            ));
        }
    }
    Ok(store)
}

/// Every tree a host knows about plus the global store they share.
pub struct TreeLibrary {
    trees: Vec<SharedInstance>,
    globals: SharedStore,
}

impl TreeLibrary {
    pub fn new(globals: VariableStore) -> Self {
        Self {
            trees: Vec::new(),
            globals: shared_store(globals),
        }
    }

    /// Builds a library from `path -> json` sources. Trees are ordered by path.
    pub fn from_json_map(
        trees_json: &BTreeMap<String, String>,
        globals_json: Option<&str>,
    ) -> Result<Self, DialogueError> {
        let globals = match globals_json {
            Some(text) => parse_globals_json(text)?,
            None => VariableStore::new(),
        };
        let mut library = Self::new(globals);
        for (path, text) in trees_json {
            library.add(parse_tree_json(path, text)?)?;
        }
        Ok(library)
    }

    pub fn add(&mut self, document: TreeDocument) -> Result<SharedInstance, DialogueError> {
        if self.by_name(&document.name).is_some() {
            return Err(DialogueError::new(
                "API_TREE_DUPLICATE",
                format!("Tree \"{}\" is registered twice.", document.name),
            ));
        }
        let instance = TreeInstance::new(document).into_shared();
        self.trees.push(instance.clone());
        Ok(instance)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.trees
            .iter()
            .map(|tree| tree.borrow().name().to_string())
            .collect()
    }

    pub fn by_name(&self, name: &str) -> Option<SharedInstance> {
        self.trees
            .iter()
            .find(|tree| tree.borrow().name() == name)
            .cloned()
    }

    pub fn by_index(&self, index: usize) -> Option<SharedInstance> {
        self.trees.get(index).cloned()
    }

    pub fn globals(&self) -> SharedStore {
        self.globals.clone()
    }

    pub fn reader(&self) -> TreeReader {
        TreeReader::new(self.globals())
    }

    /// Puts every tree back to its authored state. Globals are left alone.
    pub fn reset_trees(&self) {
        for tree in &self.trees {
            tree.borrow_mut().reset();
        }
    }

    /// Named tree, or the first one when no name is given.
    pub fn resolve(&self, name: Option<&str>) -> Result<SharedInstance, DialogueError> {
        match name {
            Some(name) => self.by_name(name).ok_or_else(|| {
                tracing::warn!(tree = name, "requested tree does not exist");
                DialogueError::new(
                    "API_TREE_NOT_FOUND",
                    format!("Tree \"{}\" is not registered.", name),
                )
            }),
            None => self.by_index(0).ok_or_else(|| {
                DialogueError::new("API_LIBRARY_EMPTY", "No dialogue trees are registered.")
            }),
        }
    }
}

pub fn start_reader(
    library: &TreeLibrary,
    tree: Option<&str>,
    start_id: Option<i32>,
) -> Result<(TreeReader, LoadReport), DialogueError> {
    let instance = library.resolve(tree)?;
    let mut reader = library.reader();
    let report = reader.load_tree(instance, start_id)?;
    Ok((reader, report))
}

pub fn resume_reader(
    library: &TreeLibrary,
    snapshot: ReaderSnapshot,
) -> Result<TreeReader, DialogueError> {
    let instance = library.resolve(Some(&snapshot.tree_name))?;
    let mut reader = library.reader();
    reader.resume(instance, snapshot)?;
    Ok(reader)
}
