use bd_core::{CompareOp, EditOp, OperandLiteral, VarType, VarValue};

use super::*;

const OPERAND_A_SLOT: usize = 1;
const OPERAND_B_SLOT: usize = 2;

/// A Variable node feeding an operand slot.
#[derive(Debug, Clone, Copy)]
struct WiredVariable {
    node: NodeIndex,
    var_index: usize,
    is_global: bool,
}

impl TreeReader {
    /// Runs a Logic, EditVariable or StartChange node. `true` selects out slot 0.
    pub(super) fn solve_logic(
        &self,
        instance: &SharedInstance,
        document: &TreeDocument,
        node: &Node,
    ) -> Result<bool, DialogueError> {
        match &node.kind {
            NodeKind::Logic {
                var_type,
                equation,
                a,
                b,
            } => {
                let left = self.operand_value(instance, document, node, OPERAND_A_SLOT, *var_type, a)?;
                let right =
                    self.operand_value(instance, document, node, OPERAND_B_SLOT, *var_type, b)?;
                Ok(compare(
                    node.index,
                    equation.normalized_for(*var_type),
                    &left,
                    &right,
                ))
            }
            NodeKind::EditVariable {
                var_type,
                equation,
                b,
            } => {
                let Some(target) = wired_operand(document, node, OPERAND_A_SLOT)? else {
                    tracing::debug!(node = node.index, "edit target is not wired; taking the false path");
                    return Ok(false);
                };
                let operand =
                    self.operand_value(instance, document, node, OPERAND_B_SLOT, *var_type, b)?;
                let current = self.read_wired(instance, target, *var_type)?;
                match apply_edit(node.index, *equation, current, operand)? {
                    Some(updated) => {
                        self.write_wired(instance, target, updated)?;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
            NodeKind::StartChange { start_id } => {
                instance.borrow_mut().default_start_id = *start_id;
                Ok(true)
            }
            other => Err(DialogueError::at_node(
                "READER_UNEXPECTED_NODE",
                format!("Node {} is not a logic node: {:?}.", node.index, other),
                node.index,
            )),
        }
    }

    fn operand_value(
        &self,
        instance: &SharedInstance,
        document: &TreeDocument,
        node: &Node,
        slot: usize,
        ty: VarType,
        literal: &OperandLiteral,
    ) -> Result<VarValue, DialogueError> {
        match wired_operand(document, node, slot)? {
            Some(wired) => self.read_wired(instance, wired, ty),
            None => Ok(literal.value(ty)),
        }
    }

    fn read_wired(
        &self,
        instance: &SharedInstance,
        wired: WiredVariable,
        ty: VarType,
    ) -> Result<VarValue, DialogueError> {
        let value = if wired.is_global {
            self.globals.borrow().at(wired.var_index).map(|v| v.value(ty))
        } else {
            instance.borrow().locals.at(wired.var_index).map(|v| v.value(ty))
        };
        value.ok_or_else(|| unresolved(wired))
    }

    fn write_wired(
        &self,
        instance: &SharedInstance,
        wired: WiredVariable,
        value: VarValue,
    ) -> Result<(), DialogueError> {
        if wired.is_global {
            let mut globals = self.globals.borrow_mut();
            let variable = globals.at_mut(wired.var_index).ok_or_else(|| unresolved(wired))?;
            variable.assign(value);
        } else {
            let mut instance = instance.borrow_mut();
            let variable = instance
                .locals
                .at_mut(wired.var_index)
                .ok_or_else(|| unresolved(wired))?;
            variable.assign(value);
        }
        Ok(())
    }
}

fn unresolved(wired: WiredVariable) -> DialogueError {
    DialogueError::at_node(
        "EVAL_UNRESOLVED_VARIABLE",
        format!(
            "Variable node {} points at {} variable #{}, which does not exist.",
            wired.node,
            if wired.is_global { "global" } else { "local" },
            wired.var_index
        ),
        wired.node,
    )
}

/// The Variable node wired into `slot`, or `None` when the operand uses its literal.
fn wired_operand(
    document: &TreeDocument,
    node: &Node,
    slot: usize,
) -> Result<Option<WiredVariable>, DialogueError> {
    let Some(source) = node.input_at(slot) else {
        return Ok(None);
    };
    match node_at(document, source)?.kind {
        NodeKind::Variable {
            var_index,
            is_global,
            ..
        } => Ok(Some(WiredVariable {
            node: source,
            var_index,
            is_global,
        })),
        ref other => Err(DialogueError::at_node(
            "EVAL_OPERAND_NOT_VARIABLE",
            format!(
                "Operand slot {} of node {} is fed by a non-variable node ({:?}).",
                slot, node.index, other
            ),
            node.index,
        )),
    }
}

fn ordered<T: PartialOrd>(op: CompareOp, left: &T, right: &T) -> Option<bool> {
    match op {
        CompareOp::Equals => Some(left == right),
        CompareOp::NotEquals => Some(left != right),
        CompareOp::Greater => Some(left > right),
        CompareOp::GreaterOrEqual => Some(left >= right),
        CompareOp::Less => Some(left < right),
        CompareOp::LessOrEqual => Some(left <= right),
        CompareOp::And | CompareOp::Or => None,
    }
}

fn compare(node: NodeIndex, op: CompareOp, left: &VarValue, right: &VarValue) -> bool {
    let outcome = match (left, right) {
        (VarValue::Bool(l), VarValue::Bool(r)) => match op {
            CompareOp::Equals => Some(l == r),
            CompareOp::NotEquals => Some(l != r),
            CompareOp::And => Some(*l && *r),
            CompareOp::Or => Some(*l || *r),
            _ => None,
        },
        (VarValue::Int(l), VarValue::Int(r)) => ordered(op, l, r),
        // Plain float equality, no tolerance.
        (VarValue::Float(l), VarValue::Float(r)) => ordered(op, l, r),
        (VarValue::String(l), VarValue::String(r)) => match op {
            CompareOp::Equals => Some(l == r),
            CompareOp::NotEquals => Some(l != r),
            _ => None,
        },
        _ => None,
    };
    outcome.unwrap_or_else(|| {
        tracing::warn!(
            node,
            op = op.formatted(),
            ty = %left.var_type(),
            "comparison is not defined for this type; evaluating to false"
        );
        false
    })
}

/// New value for the edit target, or `None` when the equation does not apply.
fn apply_edit(
    node: NodeIndex,
    op: EditOp,
    current: VarValue,
    operand: VarValue,
) -> Result<Option<VarValue>, DialogueError> {
    let updated = match (current, operand) {
        // Bool targets only support assignment, whatever the equation says.
        (VarValue::Bool(_), VarValue::Bool(b)) => Some(VarValue::Bool(b)),
        (VarValue::Int(a), VarValue::Int(b)) => Some(VarValue::Int(match op {
            EditOp::Set => b,
            EditOp::Add => a.wrapping_add(b),
            EditOp::Subtract => a.wrapping_sub(b),
            EditOp::Multiply => a.wrapping_mul(b),
            EditOp::Divide => {
                if b == 0 {
                    return Err(DialogueError::at_node(
                        "EVAL_DIVIDE_BY_ZERO",
                        format!("Integer division by zero in EditVariable node {}.", node),
                        node,
                    ));
                }
                a.wrapping_div(b)
            }
        })),
        (VarValue::Float(a), VarValue::Float(b)) => Some(VarValue::Float(match op {
            EditOp::Set => b,
            EditOp::Add => a + b,
            EditOp::Subtract => a - b,
            EditOp::Multiply => a * b,
            EditOp::Divide => a / b,
        })),
        (VarValue::String(a), VarValue::String(b)) => match op {
            EditOp::Set => Some(VarValue::String(b)),
            EditOp::Add => Some(VarValue::String(a + &b)),
            EditOp::Subtract => Some(VarValue::String(strip_all(a, &b))),
            EditOp::Multiply | EditOp::Divide => {
                tracing::warn!(node, ?op, "strings only support set, add and subtract");
                None
            }
        },
        _ => None,
    };
    Ok(updated)
}

/// Removes `needle` until no occurrence is left, including ones formed by earlier removals.
fn strip_all(mut haystack: String, needle: &str) -> String {
    if needle.is_empty() {
        return haystack;
    }
    while haystack.contains(needle) {
        haystack = haystack.replace(needle, "");
    }
    haystack
}
