use super::*;

impl TreeReader {
    /// Walks from `first` through non-stoppable nodes until one that yields to the
    /// caller. The cursor only moves when a stoppable node is reached; on failure the
    /// speaker state is put back to match the unmoved cursor.
    pub(super) fn settle(&mut self, first: NodeIndex) -> Result<NodeType, DialogueError> {
        let instance = Rc::clone(self.loaded()?);
        let speaker = instance.borrow().speaker.clone();
        let pending_revert = self.pending_revert.clone();
        let speaker_changed = self.speaker_changed;

        let result = self.walk(&instance, first);
        if result.is_err() {
            instance.borrow_mut().speaker = speaker;
            self.pending_revert = pending_revert;
            self.speaker_changed = speaker_changed;
        }
        result
    }

    fn walk(
        &mut self,
        instance: &SharedInstance,
        first: NodeIndex,
    ) -> Result<NodeType, DialogueError> {
        let document = instance.borrow().document_rc();
        let mut next = first;

        for _ in 0..MAX_SETTLE_HOPS {
            if let Some(saved) = self.pending_revert.take() {
                instance.borrow_mut().speaker = saved;
                self.speaker_changed = true;
            }

            let node = node_at(&document, next)?;
            tracing::debug!(
                tree = %document.name,
                node = next,
                kind = node.node_type().name(),
                "settle hop"
            );

            match &node.kind {
                NodeKind::End | NodeKind::Branch { .. } => {
                    return Ok(self.rest_on(&document, node, next));
                }
                NodeKind::Dialogue { advanced, .. } => {
                    if let Some(speaker) = advanced {
                        let mut instance = instance.borrow_mut();
                        let standing = std::mem::replace(&mut instance.speaker, speaker.clone());
                        self.pending_revert = Some(standing);
                        self.speaker_changed = true;
                    }
                    return Ok(self.rest_on(&document, node, next));
                }
                NodeKind::Logic { .. }
                | NodeKind::EditVariable { .. }
                | NodeKind::StartChange { .. } => {
                    let passed = self.solve_logic(instance, &document, node)?;
                    next = output_slot(node, if passed { 0 } else { 1 })?;
                }
                NodeKind::NewSpeaker { speaker } => {
                    instance.borrow_mut().speaker = speaker.clone();
                    self.speaker_changed = true;
                    next = output_slot(node, 0)?;
                }
                NodeKind::TeleportFlow {
                    is_in: true,
                    teleport_id,
                } => {
                    let target = document.teleport_out(*teleport_id).ok_or_else(|| {
                        tracing::error!(
                            tree = %document.name,
                            teleport_id,
                            "teleport has no out endpoint"
                        );
                        DialogueError::at_node(
                            "READER_TELEPORT_TARGET_MISSING",
                            format!(
                                "No out TeleportFlow node carries teleport id {}.",
                                teleport_id
                            ),
                            next,
                        )
                    })?;
                    next = output_slot(node_at(&document, target)?, 0)?;
                }
                NodeKind::TeleportFlow { is_in: false, .. } => {
                    next = output_slot(node, 0)?;
                }
                NodeKind::Info { .. }
                | NodeKind::Start { .. }
                | NodeKind::Variable { .. }
                | NodeKind::Comment { .. } => {
                    tracing::error!(
                        tree = %document.name,
                        node = next,
                        kind = node.node_type().name(),
                        "traversal reached a node that cannot be walked through"
                    );
                    return Err(DialogueError::at_node(
                        "READER_UNEXPECTED_NODE",
                        format!(
                            "Traversal reached {} node {}.",
                            node.node_type().name(),
                            next
                        ),
                        next,
                    ));
                }
            }
        }

        tracing::error!(
            tree = %document.name,
            hops = MAX_SETTLE_HOPS,
            "infinite loop while looking for the next stoppable node"
        );
        Err(DialogueError::at_node(
            "READER_INFINITE_LOOP",
            format!(
                "Visited {} nodes in tree \"{}\" without reaching a stoppable node.",
                MAX_SETTLE_HOPS, document.name
            ),
            self.cursor,
        ))
    }

    /// A Dialogue or End node whose first outbound neighbour is a Branch is the
    /// Branch's question; rest on the Branch instead.
    fn rest_on(&mut self, document: &TreeDocument, node: &Node, index: NodeIndex) -> NodeType {
        let skip_to = match node.kind {
            NodeKind::Branch { .. } => None,
            _ => node
                .outputs
                .first()
                .map(|link| link.node)
                .filter(|target| is_branch(document, *target)),
        };
        match skip_to {
            Some(branch) => {
                self.cursor = branch;
                NodeType::Branch
            }
            None => {
                self.cursor = index;
                node.node_type()
            }
        }
    }
}
