use serde::{Deserialize, Serialize};

use crate::value::{OperandLiteral, VarType, Variable};

/// Position of a node in its tree's node list. Stable while the tree is loaded.
pub type NodeIndex = usize;

/// Opaque sprite handle. The interpreter only stores and returns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpriteRef(pub String);

impl SpriteRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    pub name: String,
    #[serde(default)]
    pub sprite: Option<SpriteRef>,
}

impl Speaker {
    pub fn new(name: impl Into<String>, sprite: Option<SpriteRef>) -> Self {
        Self {
            name: name.into(),
            sprite,
        }
    }
}

/// One end of an edge as seen from the node that owns the list: the node on the
/// other side and the pin (connection slot) on the owning node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub node: NodeIndex,
    pub slot: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompareOp {
    Equals,
    NotEquals,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    And,
    Or,
}

impl CompareOp {
    /// Authoring menu code: 0 `==`, 1 `!=`, 2 `>`, 3 `>=`, 4 `<`, 5 `<=`, 6 `&&`, 7 `||`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Equals),
            1 => Some(Self::NotEquals),
            2 => Some(Self::Greater),
            3 => Some(Self::GreaterOrEqual),
            4 => Some(Self::Less),
            5 => Some(Self::LessOrEqual),
            6 => Some(Self::And),
            7 => Some(Self::Or),
            _ => None,
        }
    }

    /// The bool menu has no ordering entries, so its third and fourth items
    /// (stored as codes 2 and 3) mean `&&` and `||`.
    pub fn normalized_for(self, ty: VarType) -> Self {
        match (ty, self) {
            (VarType::Bool, Self::Greater) => Self::And,
            (VarType::Bool, Self::GreaterOrEqual) => Self::Or,
            (_, op) => op,
        }
    }

    pub fn formatted(self) -> &'static str {
        match self {
            Self::Equals => "A == B",
            Self::NotEquals => "A != B",
            Self::Greater => "A > B",
            Self::GreaterOrEqual => "A >= B",
            Self::Less => "A < B",
            Self::LessOrEqual => "A <= B",
            Self::And => "A && B",
            Self::Or => "A || B",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditOp {
    Set,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl EditOp {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Set),
            1 => Some(Self::Add),
            2 => Some(Self::Subtract),
            3 => Some(Self::Multiply),
            4 => Some(Self::Divide),
            _ => None,
        }
    }
}

fn default_branch_in_pins() -> usize {
    3
}

fn default_branch_out_pins() -> usize {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Info {
        #[serde(default)]
        speaker: Speaker,
    },
    #[serde(rename_all = "camelCase")]
    Start {
        start_id: i32,
    },
    End,
    Dialogue {
        #[serde(default)]
        text: String,
        /// Per-node speaker override, reverted once the reader leaves the node.
        #[serde(default)]
        advanced: Option<Speaker>,
    },
    #[serde(rename_all = "camelCase")]
    Branch {
        #[serde(default = "default_branch_in_pins")]
        in_pins: usize,
        #[serde(default = "default_branch_out_pins")]
        out_pins: usize,
    },
    #[serde(rename_all = "camelCase")]
    Variable {
        var_index: usize,
        var_type: VarType,
        #[serde(default)]
        is_global: bool,
    },
    #[serde(rename_all = "camelCase")]
    Logic {
        var_type: VarType,
        equation: CompareOp,
        #[serde(default)]
        a: OperandLiteral,
        #[serde(default)]
        b: OperandLiteral,
    },
    #[serde(rename_all = "camelCase")]
    EditVariable {
        var_type: VarType,
        equation: EditOp,
        #[serde(default)]
        b: OperandLiteral,
    },
    Comment {
        #[serde(default)]
        text: String,
    },
    NewSpeaker {
        speaker: Speaker,
    },
    #[serde(rename_all = "camelCase")]
    StartChange {
        start_id: i32,
    },
    #[serde(rename_all = "camelCase")]
    TeleportFlow {
        is_in: bool,
        teleport_id: i32,
    },
}

/// Payload-free node tag. Discriminants match the authoring tool's numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Info = 0,
    Start = 1,
    End = 2,
    Dialogue = 3,
    Branch = 4,
    Variable = 5,
    Logic = 6,
    EditVariable = 7,
    Comment = 8,
    NewSpeaker = 9,
    StartChange = 10,
    TeleportFlow = 11,
}

impl NodeType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Start => "START",
            Self::End => "END",
            Self::Dialogue => "DIALOGUE",
            Self::Branch => "BRANCH",
            Self::Variable => "VARIABLE",
            Self::Logic => "LOGIC",
            Self::EditVariable => "EDIT_VARIABLE",
            Self::Comment => "COMMENT",
            Self::NewSpeaker => "NEW_SPEAKER",
            Self::StartChange => "START_CHANGE",
            Self::TeleportFlow => "TELEPORT_FLOW",
        }
    }

    pub fn is_stoppable(self) -> bool {
        matches!(self, Self::End | Self::Dialogue | Self::Branch)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub index: NodeIndex,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub inputs: Vec<Link>,
    #[serde(default)]
    pub outputs: Vec<Link>,
}

impl Node {
    pub fn new(index: NodeIndex, kind: NodeKind) -> Self {
        Self {
            index,
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Info { .. } => NodeType::Info,
            NodeKind::Start { .. } => NodeType::Start,
            NodeKind::End => NodeType::End,
            NodeKind::Dialogue { .. } => NodeType::Dialogue,
            NodeKind::Branch { .. } => NodeType::Branch,
            NodeKind::Variable { .. } => NodeType::Variable,
            NodeKind::Logic { .. } => NodeType::Logic,
            NodeKind::EditVariable { .. } => NodeType::EditVariable,
            NodeKind::Comment { .. } => NodeType::Comment,
            NodeKind::NewSpeaker { .. } => NodeType::NewSpeaker,
            NodeKind::StartChange { .. } => NodeType::StartChange,
            NodeKind::TeleportFlow { .. } => NodeType::TeleportFlow,
        }
    }

    /// First link whose own pin equals `slot`, if any.
    pub fn input_at(&self, slot: usize) -> Option<NodeIndex> {
        self.inputs
            .iter()
            .find(|link| link.slot == slot)
            .map(|link| link.node)
    }

    pub fn output_at(&self, slot: usize) -> Option<NodeIndex> {
        self.outputs
            .iter()
            .find(|link| link.slot == slot)
            .map(|link| link.node)
    }

    /// The target of a single-exit node.
    pub fn single_output(&self) -> Option<NodeIndex> {
        match self.outputs.as_slice() {
            [link] => Some(link.node),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceItem {
    /// Outbound slot taken when this answer is picked.
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ReaderOutput {
    Dialogue {
        text: String,
    },
    Branch {
        question: String,
        answers: Vec<ChoiceItem>,
    },
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderSnapshot {
    pub schema_version: String,
    pub tree_name: String,
    pub cursor: NodeIndex,
    pub default_start_id: i32,
    pub speaker: Speaker,
    /// Speaker to restore on the next hop when the cursor sits on a Dialogue
    /// node with an override.
    pub pending_revert: Option<Speaker>,
    pub speaker_changed: bool,
    pub locals: Vec<Variable>,
    pub globals: Vec<Variable>,
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn node_json_flattens_kind_and_payload() {
        let node: Node = serde_json::from_str(
            r#"{
  "index": 3,
  "kind": "logic",
  "varType": "int",
  "equation": "greaterOrEqual",
  "b": {"int": 4},
  "inputs": [{"node": 2, "slot": 0}],
  "outputs": [{"node": 5, "slot": 0}, {"node": 6, "slot": 1}]
}"#,
        )
        .expect("logic node should deserialize");

        assert_eq!(node.node_type(), NodeType::Logic);
        assert_eq!(node.output_at(1), Some(6));
        assert_eq!(node.input_at(1), None);
        let NodeKind::Logic {
            var_type,
            equation,
            b,
            ..
        } = &node.kind
        else {
            panic!("expected logic payload");
        };
        assert_eq!(*var_type, VarType::Int);
        assert_eq!(*equation, CompareOp::GreaterOrEqual);
        assert_eq!(b.int_val, 4);
    }

    #[test]
    fn branch_pins_default_to_three_in_two_out() {
        let node: Node =
            serde_json::from_str(r#"{"index":1,"kind":"branch"}"#).expect("branch json");
        assert_eq!(
            node.kind,
            NodeKind::Branch {
                in_pins: 3,
                out_pins: 2
            }
        );
        assert!(node.inputs.is_empty());
    }

    #[test]
    fn bool_compare_remaps_ordering_codes() {
        assert_eq!(
            CompareOp::Greater.normalized_for(VarType::Bool),
            CompareOp::And
        );
        assert_eq!(
            CompareOp::GreaterOrEqual.normalized_for(VarType::Bool),
            CompareOp::Or
        );
        assert_eq!(
            CompareOp::Greater.normalized_for(VarType::Int),
            CompareOp::Greater
        );
        assert_eq!(CompareOp::from_code(7), Some(CompareOp::Or));
        assert_eq!(CompareOp::from_code(8), None);
    }

    #[test]
    fn node_type_names_and_stoppable_set() {
        assert_eq!(NodeType::EditVariable.name(), "EDIT_VARIABLE");
        assert_eq!(NodeType::TeleportFlow as i32, 11);
        let stoppable = [
            NodeType::End,
            NodeType::Dialogue,
            NodeType::Branch,
        ];
        assert!(stoppable.iter().all(|ty| ty.is_stoppable()));
        assert!(!NodeType::Logic.is_stoppable());
        assert!(!NodeType::Info.is_stoppable());
    }

    #[test]
    fn reader_output_serializes_with_kind_tag() {
        let json = serde_json::to_string(&ReaderOutput::End).expect("output json");
        assert_eq!(json, r#"{"kind":"end"}"#);
    }
}
