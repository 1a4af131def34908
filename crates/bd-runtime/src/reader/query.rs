use bd_core::{ChoiceItem, ReaderOutput, SpriteRef, VarType, VarValue, Variable};

use super::*;
use crate::template::expand_template;

impl TreeReader {
    pub fn current_index(&self) -> Option<NodeIndex> {
        self.tree.as_ref().map(|_| self.cursor)
    }

    pub fn current_node_type(&self) -> Option<NodeType> {
        let document = self.document().ok()?;
        document.node_type(self.cursor)
    }

    /// Upper-case type name of the resting node, e.g. `"DIALOGUE"`.
    pub fn current_node_name(&self) -> Option<&'static str> {
        self.current_node_type().map(NodeType::name)
    }

    /// Type of the current node's only outbound neighbour.
    pub fn next_node_type(&self) -> Option<NodeType> {
        let document = self.document().ok()?;
        let next = document.node(self.cursor)?.single_output()?;
        document.node_type(next)
    }

    pub fn expand(&self, text: &str) -> Result<String, DialogueError> {
        let instance = self.loaded()?.borrow();
        let globals = self.globals.borrow();
        Ok(expand_template(
            text,
            &instance.locals,
            &globals,
            &instance.speaker.name,
        ))
    }

    /// What the caller should present for the resting node, with templates expanded.
    pub fn current_output(&self) -> Result<ReaderOutput, DialogueError> {
        let document = self.document()?;
        let node = node_at(&document, self.cursor)?;
        match &node.kind {
            NodeKind::Dialogue { text, .. } => Ok(ReaderOutput::Dialogue {
                text: self.expand(text)?,
            }),
            NodeKind::Branch { .. } => {
                let question = match node.input_at(0) {
                    Some(source) => self.expand(dialogue_text(&document, source))?,
                    None => String::new(),
                };
                let mut answer_links = node
                    .inputs
                    .iter()
                    .filter(|link| link.slot > 0)
                    .collect::<Vec<_>>();
                answer_links.sort_by_key(|link| link.slot);
                let answers = answer_links
                    .into_iter()
                    .map(|link| {
                        Ok(ChoiceItem {
                            index: link.slot - 1,
                            text: self.expand(dialogue_text(&document, link.node))?,
                        })
                    })
                    .collect::<Result<Vec<_>, DialogueError>>()?;
                Ok(ReaderOutput::Branch { question, answers })
            }
            NodeKind::End => Ok(ReaderOutput::End),
            _ => Err(DialogueError::at_node(
                "READER_NOT_STOPPABLE",
                format!(
                    "Cursor is on {} node {}, which has no output.",
                    node.node_type().name(),
                    self.cursor
                ),
                self.cursor,
            )),
        }
    }

    /// Returns true once per speaker change, then false until the next change.
    pub fn did_speaker_change(&mut self) -> bool {
        std::mem::take(&mut self.speaker_changed)
    }

    pub fn speaker(&self) -> Option<Speaker> {
        self.tree.as_ref().map(|tree| tree.borrow().speaker.clone())
    }

    /// Speaker name with templates expanded. A speaker-name token inside the name
    /// expands to the raw name.
    pub fn speaker_name(&self) -> Option<String> {
        let speaker = self.speaker()?;
        self.expand(&speaker.name).ok()
    }

    pub fn speaker_sprite(&self) -> Option<SpriteRef> {
        self.speaker().and_then(|speaker| speaker.sprite)
    }

    /// Replaces the standing speaker of the loaded tree.
    pub fn change_speaker(
        &mut self,
        name: impl Into<String>,
        sprite: Option<SpriteRef>,
    ) -> Result<(), DialogueError> {
        self.loaded()?.borrow_mut().speaker = Speaker::new(name, sprite);
        Ok(())
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.tree
            .as_ref()
            .map(|tree| tree.borrow().locals.names())
            .unwrap_or_default()
    }

    pub fn get_variable(&self, name: &str, ty: VarType) -> Option<VarValue> {
        self.tree.as_ref()?.borrow().locals.get(name, ty)
    }

    pub fn set_variable(&mut self, name: &str, value: VarValue) -> bool {
        self.tree
            .as_ref()
            .map(|tree| tree.borrow_mut().locals.set(name, value))
            .unwrap_or(false)
    }

    pub fn add_variable(&mut self, variable: Variable) -> bool {
        self.tree
            .as_ref()
            .map(|tree| tree.borrow_mut().locals.add(variable))
            .unwrap_or(false)
    }

    pub fn remove_variable(&mut self, name: &str) -> bool {
        self.tree
            .as_ref()
            .map(|tree| tree.borrow_mut().locals.remove(name))
            .unwrap_or(false)
    }
}

/// Text of the Dialogue node feeding a Branch pin; other sources contribute nothing.
fn dialogue_text(document: &TreeDocument, index: NodeIndex) -> &str {
    match document.node(index).map(|node| &node.kind) {
        Some(NodeKind::Dialogue { text, .. }) => text,
        _ => "",
    }
}
