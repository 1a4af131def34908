use thiserror::Error;

use crate::types::NodeIndex;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct DialogueError {
    pub code: String,
    pub message: String,
    pub node: Option<NodeIndex>,
}

impl DialogueError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            node: None,
        }
    }

    pub fn at_node(code: impl Into<String>, message: impl Into<String>, node: NodeIndex) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            node: Some(node),
        }
    }

    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn display_joins_code_and_message() {
        let error = DialogueError::new("READER_NO_TREE", "No tree is loaded.");
        assert_eq!(error.to_string(), "READER_NO_TREE: No tree is loaded.");
        assert!(error.node.is_none());
    }

    #[test]
    fn at_node_keeps_node_index() {
        let error = DialogueError::at_node("READER_DANGLING_EDGE", "x", 4);
        assert_eq!(error.node, Some(4));
        assert!(error.is("READER_DANGLING_EDGE"));
    }
}
