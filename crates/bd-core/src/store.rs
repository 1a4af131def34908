use serde::{Deserialize, Serialize};

use crate::value::{VarType, VarValue, Variable};

/// Ordered list of named variables. Lookup is a linear, case-insensitive scan where
/// the first match wins; Variable nodes address entries by position instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableStore {
    variables: Vec<Variable>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_variables(variables: Vec<Variable>) -> Self {
        Self { variables }
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn names(&self) -> Vec<String> {
        self.variables
            .iter()
            .map(|variable| variable.name.clone())
            .collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.variables
            .iter()
            .position(|variable| variable.name_matches(name))
    }

    pub fn find(&self, name: &str) -> Option<&Variable> {
        self.index_of(name).map(|index| &self.variables[index])
    }

    pub fn at(&self, index: usize) -> Option<&Variable> {
        self.variables.get(index)
    }

    pub fn at_mut(&mut self, index: usize) -> Option<&mut Variable> {
        self.variables.get_mut(index)
    }

    pub fn get(&self, name: &str, ty: VarType) -> Option<VarValue> {
        self.find(name).map(|variable| variable.value(ty))
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.find(name).map(|variable| variable.bool_val)
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.find(name).map(|variable| variable.int_val)
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        self.find(name).map(|variable| variable.float_val)
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.find(name).map(|variable| variable.string_val.as_str())
    }

    /// Writes the slot matching `value`'s type. Returns false when no variable matches.
    pub fn set(&mut self, name: &str, value: VarValue) -> bool {
        match self.index_of(name) {
            Some(index) => {
                self.variables[index].assign(value);
                true
            }
            None => false,
        }
    }

    /// Appends a variable. Returns false (and leaves the store untouched) when the
    /// name is already taken, ignoring case.
    pub fn add(&mut self, variable: Variable) -> bool {
        if self.index_of(&variable.name).is_some() {
            return false;
        }
        self.variables.push(variable);
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        match self.index_of(name) {
            Some(index) => {
                self.variables.remove(index);
                true
            }
            None => false,
        }
    }
}
