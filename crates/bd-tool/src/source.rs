use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::{BdToolError, TestCase, TESTCASE_SCHEMA_V1};

const TREE_FILE_SUFFIX: &str = ".tree.json";
const GLOBALS_FILE_NAME: &str = "globals.json";

pub fn read_trees_from_dir(demo_dir: &Path) -> Result<BTreeMap<String, String>, BdToolError> {
    let mut trees = BTreeMap::new();

    for entry in WalkDir::new(demo_dir)
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
            .strip_prefix(demo_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let content = fs::read_to_string(path).map_err(|source| BdToolError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        trees.insert(relative, content);
    }

    if trees.is_empty() {
        return Err(BdToolError::SourceEmpty {
            path: demo_dir.to_path_buf(),
        });
    }

    Ok(trees)
}

/// Contents of `globals.json` at the root of the demo, if there is one.
pub fn read_globals_from_dir(demo_dir: &Path) -> Result<Option<String>, BdToolError> {
    let path = demo_dir.join(GLOBALS_FILE_NAME);
    if !path.is_file() {
        return Ok(None);
    }
    fs::read_to_string(&path)
        .map(Some)
        .map_err(|source| BdToolError::ReadFile { path, source })
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, BdToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| BdToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| BdToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(BdToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod source_tests {
    use super::*;

    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should move forward")
            .as_nanos();
        std::env::temp_dir().join(format!("bd-tool-{}-{}", name, nanos))
    }

    fn write_file(path: &Path, content: &str) {
        let parent = path.parent().expect("path should have parent");
        fs::create_dir_all(parent).expect("parent dir should be created");
        fs::write(path, content).expect("file should be written");
    }

    #[test]
    fn read_trees_from_dir_collects_tree_files_only() {
        let root = temp_dir("trees");
        write_file(&root.join("gate.tree.json"), "{}");
        write_file(&root.join("act2/keep.tree.json"), "{}");
        write_file(&root.join("globals.json"), "[]");
        write_file(&root.join("testcase.json"), "{}");

        let files = read_trees_from_dir(&root).expect("scan should pass");
        assert_eq!(files.len(), 2);
        assert!(files.contains_key("gate.tree.json"));
        assert!(files.contains_key("act2/keep.tree.json"));
    }

    #[test]
    fn read_trees_from_dir_fails_when_no_tree_files() {
        let root = temp_dir("empty-trees");
        write_file(&root.join("ignore.txt"), "skip");

        let error = read_trees_from_dir(&root).expect_err("empty source should fail");
        assert!(matches!(error, BdToolError::SourceEmpty { .. }));
    }

    #[test]
    fn read_globals_from_dir_is_optional() {
        let root = temp_dir("globals");
        fs::create_dir_all(&root).expect("root should be created");
        assert_eq!(read_globals_from_dir(&root).expect("no globals"), None);

        write_file(&root.join("globals.json"), r#"[{"name":"gold"}]"#);
        assert_eq!(
            read_globals_from_dir(&root).expect("globals"),
            Some(r#"[{"name":"gold"}]"#.to_string())
        );
    }

    #[test]
    fn read_test_case_parses_valid_json() {
        let root = temp_dir("case-ok");
        let case_path = root.join("testcase.json");
        write_file(
            &case_path,
            r#"{
  "schemaVersion":"bd-tool-case.v1",
  "tree":"gate",
  "choices":[1],
  "expectedEvents":[{"kind":"end"}]
}"#,
        );

        let parsed = read_test_case(&case_path).expect("case should parse");
        assert_eq!(parsed.schema_version, TESTCASE_SCHEMA_V1);
        assert_eq!(parsed.tree.as_deref(), Some("gate"));
        assert_eq!(parsed.choices, vec![1]);
        assert_eq!(parsed.expected_events.len(), 1);
    }

    #[test]
    fn read_test_case_reports_read_parse_and_schema_errors() {
        let root = temp_dir("case-errors");
        fs::create_dir_all(&root).expect("root should be created");

        let error = read_test_case(&root.join("missing.json")).expect_err("missing case");
        assert!(matches!(error, BdToolError::ReadFile { .. }));

        let bad_json_path = root.join("bad.json");
        write_file(&bad_json_path, "{");
        let parse_error = read_test_case(&bad_json_path).expect_err("parse should fail");
        assert!(matches!(parse_error, BdToolError::ParseCase { .. }));

        let bad_schema_path = root.join("bad-schema.json");
        write_file(
            &bad_schema_path,
            r#"{"schemaVersion":"v0","expectedEvents":[{"kind":"end"}]}"#,
        );
        let schema_error = read_test_case(&bad_schema_path).expect_err("schema should fail");
        assert!(matches!(
            schema_error,
            BdToolError::InvalidSchemaVersion { .. }
        ));
    }
}
