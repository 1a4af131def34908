use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bd_core::DialogueError;
use walkdir::WalkDir;

use crate::{
    map_cli_source_path, map_cli_source_read, map_cli_source_scan, LoadedLibrary,
    TREES_DIR_PREFIX,
};

pub(crate) const TREE_FILE_SUFFIX: &str = ".tree.json";
pub(crate) const GLOBALS_FILE_NAME: &str = "globals.json";

/// Reads every tree under `trees_dir`. Globals come from `globals_path` when
/// given, otherwise from a `globals.json` at the root of the directory.
pub(crate) fn load_source_by_trees_dir(
    trees_dir: &str,
    globals_path: Option<&str>,
) -> Result<LoadedLibrary, DialogueError> {
    let trees_root = resolve_trees_dir(trees_dir)?;
    let trees_json = read_trees_json_from_dir(&trees_root)?;
    let globals_json = match globals_path {
        Some(path) => Some(read_globals_file(Path::new(path))?),
        None => {
            let default_path = trees_root.join(GLOBALS_FILE_NAME);
            if default_path.is_file() {
                Some(read_globals_file(&default_path)?)
            } else {
                None
            }
        }
    };
    let title = format!(
        "Trees {}",
        trees_root
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown")
    );
    tracing::debug!(
        dir = %trees_root.display(),
        trees = trees_json.len(),
        globals = globals_json.is_some(),
        "tree sources loaded"
    );

    Ok(LoadedLibrary {
        id: make_trees_dir_library_id(&trees_root),
        title,
        trees_json,
        globals_json,
    })
}

/// Reloads the tree sources a saved state points at. Globals are restored from
/// the snapshot itself, so no globals file is read here.
pub(crate) fn load_source_by_ref(library_ref: &str) -> Result<LoadedLibrary, DialogueError> {
    let Some(raw) = library_ref.strip_prefix(TREES_DIR_PREFIX) else {
        return Err(DialogueError::new(
            "CLI_SOURCE_REF_INVALID",
            format!("Unsupported library ref: {}", library_ref),
        ));
    };
    let trees_root = resolve_trees_dir(raw)?;
    Ok(LoadedLibrary {
        id: make_trees_dir_library_id(&trees_root),
        title: format!("Trees {}", raw),
        trees_json: read_trees_json_from_dir(&trees_root)?,
        globals_json: None,
    })
}

pub(crate) fn resolve_trees_dir(trees_dir: &str) -> Result<PathBuf, DialogueError> {
    let path = PathBuf::from(trees_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(DialogueError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("trees-dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(DialogueError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("trees-dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

pub(crate) fn read_trees_json_from_dir(
    trees_dir: &Path,
) -> Result<BTreeMap<String, String>, DialogueError> {
    let mut trees = BTreeMap::new();

    for entry in WalkDir::new(trees_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !path.to_string_lossy().ends_with(TREE_FILE_SUFFIX) {
            continue;
        }

        let relative = path
            .strip_prefix(trees_dir)
            .map_err(map_cli_source_scan)?
            .to_string_lossy()
            .replace('\\', "/");

        let content = fs::read_to_string(path).map_err(map_cli_source_read)?;
        trees.insert(relative, content);
    }

    if trees.is_empty() {
        return Err(DialogueError::new(
            "CLI_SOURCE_EMPTY",
            format!("No {} files under {}", TREE_FILE_SUFFIX, trees_dir.display()),
        ));
    }

    Ok(trees)
}

fn read_globals_file(path: &Path) -> Result<String, DialogueError> {
    if !path.is_file() {
        return Err(DialogueError::new(
            "CLI_GLOBALS_NOT_FOUND",
            format!("globals file does not exist: {}", path.display()),
        ));
    }
    fs::read_to_string(path).map_err(map_cli_source_read)
}

pub(crate) fn make_trees_dir_library_id(trees_dir: &Path) -> String {
    format!("{}{}", TREES_DIR_PREFIX, trees_dir.display())
}
