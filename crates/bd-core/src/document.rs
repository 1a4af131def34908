use serde::{Deserialize, Serialize};

use crate::error::DialogueError;
use crate::types::{Link, Node, NodeIndex, NodeKind, NodeType, Speaker};
use crate::value::Variable;

pub const BRANCH_MIN_IN_PINS: usize = 3;
pub const BRANCH_MIN_OUT_PINS: usize = 2;

/// Immutable-shape dialogue graph as authored. Runtime state (locals, default
/// start id, active speaker) lives in the runtime's tree instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDocument {
    pub name: String,
    #[serde(default)]
    pub default_start_id: i32,
    #[serde(default)]
    pub variables: Vec<Variable>,
    pub nodes: Vec<Node>,
}

impl TreeDocument {
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node_type(&self, index: NodeIndex) -> Option<NodeType> {
        self.node(index).map(Node::node_type)
    }

    pub fn count(&self, node_type: NodeType) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.node_type() == node_type)
            .count()
    }

    pub fn info(&self) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|node| node.node_type() == NodeType::Info)
    }

    /// Speaker declared on the Info node, or an empty speaker when the tree has none.
    pub fn default_speaker(&self) -> Speaker {
        match self.info().map(|node| &node.kind) {
            Some(NodeKind::Info { speaker }) => speaker.clone(),
            _ => Speaker::default(),
        }
    }

    /// First Start node carrying `start_id`.
    pub fn find_start(&self, start_id: i32) -> Option<NodeIndex> {
        self.nodes.iter().position(|node| {
            matches!(node.kind, NodeKind::Start { start_id: id } if id == start_id)
        })
    }

    pub fn start_ids(&self) -> Vec<i32> {
        self.nodes
            .iter()
            .filter_map(|node| match node.kind {
                NodeKind::Start { start_id } => Some(start_id),
                _ => None,
            })
            .collect()
    }

    /// The out-endpoint TeleportFlow node sharing `teleport_id`.
    pub fn teleport_out(&self, teleport_id: i32) -> Option<NodeIndex> {
        self.nodes.iter().position(|node| {
            matches!(
                node.kind,
                NodeKind::TeleportFlow { is_in: false, teleport_id: id } if id == teleport_id
            )
        })
    }

    /// Collects every authoring problem found in the graph. An empty list means the
    /// tree is well formed; a non-empty one does not stop traversal.
    pub fn validate(&self) -> Vec<DialogueError> {
        let mut issues = Vec::new();

        match self.count(NodeType::Info) {
            0 => issues.push(DialogueError::new(
                "TREE_NO_INFO",
                format!("Tree \"{}\" has no Info node.", self.name),
            )),
            1 => {}
            many => issues.push(DialogueError::new(
                "TREE_MULTIPLE_INFO",
                format!("Tree \"{}\" has {} Info nodes.", self.name, many),
            )),
        }
        if self.count(NodeType::Start) == 0 {
            issues.push(DialogueError::new(
                "TREE_NO_START",
                format!("Tree \"{}\" has no Start node.", self.name),
            ));
        }
        if self.count(NodeType::End) == 0 {
            issues.push(DialogueError::new(
                "TREE_NO_END",
                format!("Tree \"{}\" has no End node.", self.name),
            ));
        }

        for (position, node) in self.nodes.iter().enumerate() {
            if node.index != position {
                issues.push(DialogueError::at_node(
                    "TREE_INDEX_MISMATCH",
                    format!(
                        "Node at position {} declares index {}.",
                        position, node.index
                    ),
                    position,
                ));
            }

            let node_type = node.node_type();
            if matches!(node_type, NodeType::Info | NodeType::Comment)
                && !(node.inputs.is_empty() && node.outputs.is_empty())
            {
                issues.push(DialogueError::at_node(
                    "TREE_EDGES_ON_PASSIVE_NODE",
                    format!("{} node {} must not have edges.", node_type.name(), position),
                    position,
                ));
            }

            if let NodeKind::Branch { in_pins, out_pins } = node.kind {
                if in_pins < BRANCH_MIN_IN_PINS
                    || out_pins < BRANCH_MIN_OUT_PINS
                    || in_pins != out_pins + 1
                {
                    issues.push(DialogueError::at_node(
                        "TREE_BRANCH_PINS",
                        format!(
                            "Branch node {} has {} in / {} out pins; expected one question pin plus one pin per choice on each side.",
                            position, in_pins, out_pins
                        ),
                        position,
                    ));
                }
            }

            match node.kind {
                NodeKind::Start { .. } if !node.inputs.is_empty() => {
                    issues.push(DialogueError::at_node(
                        "TREE_START_HAS_INPUT",
                        format!("Start node {} must not have inbound edges.", position),
                        position,
                    ));
                }
                NodeKind::TeleportFlow { is_in: true, .. } if !node.outputs.is_empty() => {
                    issues.push(DialogueError::at_node(
                        "TREE_TELEPORT_EDGES",
                        format!(
                            "Teleport in-endpoint {} must not have outbound edges.",
                            position
                        ),
                        position,
                    ));
                }
                NodeKind::TeleportFlow {
                    is_in: false,
                    teleport_id,
                } => {
                    if !node.inputs.is_empty() {
                        issues.push(DialogueError::at_node(
                            "TREE_TELEPORT_EDGES",
                            format!(
                                "Teleport out-endpoint {} must not have inbound edges.",
                                position
                            ),
                            position,
                        ));
                    }
                    let first = self.teleport_out(teleport_id);
                    if let Some(first) = first.filter(|&first| first != position) {
                        issues.push(DialogueError::at_node(
                            "TREE_TELEPORT_DUPLICATE",
                            format!(
                                "Teleport id {} has out-endpoints at nodes {} and {}.",
                                teleport_id, first, position
                            ),
                            position,
                        ));
                    }
                }
                NodeKind::Logic { .. } | NodeKind::EditVariable { .. }
                    if node.output_at(0).is_none() || node.output_at(1).is_none() =>
                {
                    issues.push(DialogueError::at_node(
                        "TREE_MISSING_EXIT",
                        format!(
                            "{} node {} needs both a true (slot 0) and a false (slot 1) exit.",
                            node_type.name(),
                            position
                        ),
                        position,
                    ));
                }
                _ => {}
            }

            self.check_links(position, &node.outputs, true, &mut issues);
            self.check_links(position, &node.inputs, false, &mut issues);
        }

        issues
    }

    fn check_links(
        &self,
        owner: NodeIndex,
        links: &[Link],
        outbound: bool,
        issues: &mut Vec<DialogueError>,
    ) {
        for link in links {
            let Some(other) = self.nodes.get(link.node) else {
                issues.push(DialogueError::at_node(
                    "TREE_EDGE_OUT_OF_RANGE",
                    format!("Node {} links to missing node {}.", owner, link.node),
                    owner,
                ));
                continue;
            };
            let mirror = if outbound { &other.inputs } else { &other.outputs };
            if !mirror.iter().any(|back| back.node == owner) {
                issues.push(DialogueError::at_node(
                    "TREE_EDGE_NOT_MIRRORED",
                    format!(
                        "Edge {} {} {} has no matching entry on node {}.",
                        owner,
                        if outbound { "->" } else { "<-" },
                        link.node,
                        link.node
                    ),
                    owner,
                ));
            }
        }
    }

    /// Connects `from`'s out pin `from_slot` to `to`'s in pin `to_slot`, recording the
    /// edge on both nodes.
    pub fn connect(
        &mut self,
        from: NodeIndex,
        from_slot: usize,
        to: NodeIndex,
        to_slot: usize,
    ) -> Result<(), DialogueError> {
        if from >= self.nodes.len() || to >= self.nodes.len() {
            return Err(DialogueError::new(
                "TREE_EDGE_OUT_OF_RANGE",
                format!(
                    "Cannot connect {} -> {}: tree has {} nodes.",
                    from,
                    to,
                    self.nodes.len()
                ),
            ));
        }
        self.nodes[from].outputs.push(Link {
            node: to,
            slot: from_slot,
        });
        self.nodes[to].inputs.push(Link {
            node: from,
            slot: to_slot,
        });
        Ok(())
    }

    /// Grows a Branch by one choice: one more answer pin in and one more path out.
    pub fn add_choice(&mut self, branch: NodeIndex) -> Result<(), DialogueError> {
        let (in_pins, out_pins) = self.branch_pins(branch)?;
        self.nodes[branch].kind = NodeKind::Branch {
            in_pins: in_pins + 1,
            out_pins: out_pins + 1,
        };
        Ok(())
    }

    /// Drops the last choice of a Branch along with any edges on its pins.
    pub fn remove_choice(&mut self, branch: NodeIndex) -> Result<(), DialogueError> {
        let (in_pins, out_pins) = self.branch_pins(branch)?;
        if in_pins <= BRANCH_MIN_IN_PINS || out_pins <= BRANCH_MIN_OUT_PINS {
            return Err(DialogueError::at_node(
                "TREE_BRANCH_PINS",
                format!(
                    "Branch node {} already has the minimum of {} choices.",
                    branch, BRANCH_MIN_OUT_PINS
                ),
                branch,
            ));
        }
        let (in_slot, out_slot) = (in_pins - 1, out_pins - 1);

        let removed_in = slot_edges(&self.nodes[branch].inputs, in_slot);
        let removed_out = slot_edges(&self.nodes[branch].outputs, out_slot);
        if let Some((missing, _)) = removed_in
            .iter()
            .chain(&removed_out)
            .find(|(node, _)| *node >= self.nodes.len())
        {
            return Err(DialogueError::at_node(
                "TREE_EDGE_OUT_OF_RANGE",
                format!("Branch node {} links to missing node {}.", branch, missing),
                branch,
            ));
        }

        self.nodes[branch].inputs.retain(|link| link.slot != in_slot);
        self.nodes[branch].outputs.retain(|link| link.slot != out_slot);
        for (source, occurrence) in removed_in {
            if let Some(node) = self.nodes.get_mut(source) {
                drop_mirror(&mut node.outputs, branch, occurrence);
            }
        }
        for (target, occurrence) in removed_out {
            if let Some(node) = self.nodes.get_mut(target) {
                drop_mirror(&mut node.inputs, branch, occurrence);
            }
        }

        self.nodes[branch].kind = NodeKind::Branch {
            in_pins: in_slot,
            out_pins: out_slot,
        };
        Ok(())
    }

    fn branch_pins(&self, index: NodeIndex) -> Result<(usize, usize), DialogueError> {
        match self.nodes.get(index).map(|node| &node.kind) {
            Some(NodeKind::Branch { in_pins, out_pins }) => Ok((*in_pins, *out_pins)),
            Some(other) => Err(DialogueError::at_node(
                "TREE_NODE_NOT_BRANCH",
                format!("Node {} is {:?}, not a branch.", index, other),
                index,
            )),
            None => Err(DialogueError::new(
                "TREE_EDGE_OUT_OF_RANGE",
                format!("Node {} does not exist.", index),
            )),
        }
    }
}

/// Edges on `slot` as `(far node, occurrence)`, where occurrence counts earlier links
/// to the same far node. Both ends of a pair of nodes record their edges in the same
/// order, so the occurrence locates the mirror entry.
fn slot_edges(links: &[Link], slot: usize) -> Vec<(NodeIndex, usize)> {
    let mut edges: Vec<(NodeIndex, usize)> = links
        .iter()
        .enumerate()
        .filter(|(_, link)| link.slot == slot)
        .map(|(position, link)| {
            let occurrence = links[..position]
                .iter()
                .filter(|earlier| earlier.node == link.node)
                .count();
            (link.node, occurrence)
        })
        .collect();
    // Later occurrences first so earlier positions stay valid while removing.
    edges.sort_by(|a, b| b.1.cmp(&a.1));
    edges
}

fn drop_mirror(links: &mut Vec<Link>, node: NodeIndex, occurrence: usize) {
    let position = links
        .iter()
        .enumerate()
        .filter(|(_, link)| link.node == node)
        .nth(occurrence)
        .map(|(position, _)| position);
    if let Some(position) = position {
        links.remove(position);
    }
}

/// Builds a [`TreeDocument`] in code. Indices are handed out in insertion order.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    document: TreeDocument,
    first_error: Option<DialogueError>,
}

impl TreeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            document: TreeDocument {
                name: name.into(),
                default_start_id: 0,
                variables: Vec::new(),
                nodes: Vec::new(),
            },
            first_error: None,
        }
    }

    pub fn default_start_id(mut self, start_id: i32) -> Self {
        self.document.default_start_id = start_id;
        self
    }

    pub fn variable(mut self, variable: Variable) -> Self {
        self.document.variables.push(variable);
        self
    }

    pub fn add(&mut self, kind: NodeKind) -> NodeIndex {
        let index = self.document.nodes.len();
        self.document.nodes.push(Node::new(index, kind));
        index
    }

    pub fn info(&mut self, speaker: &str) -> NodeIndex {
        self.add(NodeKind::Info {
            speaker: Speaker::new(speaker, None),
        })
    }

    pub fn start(&mut self, start_id: i32) -> NodeIndex {
        self.add(NodeKind::Start { start_id })
    }

    pub fn end(&mut self) -> NodeIndex {
        self.add(NodeKind::End)
    }

    pub fn dialogue(&mut self, text: &str) -> NodeIndex {
        self.add(NodeKind::Dialogue {
            text: text.to_string(),
            advanced: None,
        })
    }

    pub fn branch(&mut self) -> NodeIndex {
        self.add(NodeKind::Branch {
            in_pins: BRANCH_MIN_IN_PINS,
            out_pins: BRANCH_MIN_OUT_PINS,
        })
    }

    /// Bad indices are remembered and reported by [`TreeBuilder::build`].
    pub fn connect(&mut self, from: NodeIndex, from_slot: usize, to: NodeIndex, to_slot: usize) {
        if let Err(error) = self.document.connect(from, from_slot, to, to_slot) {
            self.first_error.get_or_insert(error);
        }
    }

    pub fn add_choice(&mut self, branch: NodeIndex) {
        if let Err(error) = self.document.add_choice(branch) {
            self.first_error.get_or_insert(error);
        }
    }

    /// Wires `from` out pin 0 into `to` in pin 0.
    pub fn chain(&mut self, from: NodeIndex, to: NodeIndex) {
        self.connect(from, 0, to, 0);
    }

    pub fn build(self) -> Result<TreeDocument, DialogueError> {
        match self.first_error {
            Some(error) => Err(error),
            None => Ok(self.document),
        }
    }
}
