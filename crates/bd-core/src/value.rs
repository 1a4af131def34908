use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared type of a variable slot, operand, or template token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    Bool,
    Int,
    Float,
    String,
}

impl VarType {
    pub const ALL: [VarType; 4] = [Self::Bool, Self::Int, Self::Float, Self::String];

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
        }
    }

    /// Case-insensitive lookup used by template tokens (`{var:Name:Int}`).
    pub fn parse_name(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|ty| ty.name() == lowered)
    }

    /// Numeric menu position used by the authoring tool: 0 bool, 1 int, 2 float, 3 string.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Bool),
            1 => Some(Self::Int),
            2 => Some(Self::Float),
            3 => Some(Self::String),
            _ => None,
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
}

impl VarValue {
    pub fn var_type(&self) -> VarType {
        match self {
            Self::Bool(_) => VarType::Bool,
            Self::Int(_) => VarType::Int,
            Self::Float(_) => VarType::Float,
            Self::String(_) => VarType::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
            Self::String(value) => f.write_str(value),
        }
    }
}

/// A named variable. All four typed slots always exist; which one is meaningful
/// depends on how the tree reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(default, rename = "bool")]
    pub bool_val: bool,
    #[serde(default, rename = "int")]
    pub int_val: i32,
    #[serde(default, rename = "float")]
    pub float_val: f32,
    #[serde(default, rename = "string")]
    pub string_val: String,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bool_val: false,
            int_val: 0,
            float_val: 0.0,
            string_val: String::new(),
        }
    }

    pub fn with_bool(mut self, value: bool) -> Self {
        self.bool_val = value;
        self
    }

    pub fn with_int(mut self, value: i32) -> Self {
        self.int_val = value;
        self
    }

    pub fn with_float(mut self, value: f32) -> Self {
        self.float_val = value;
        self
    }

    pub fn with_string(mut self, value: impl Into<String>) -> Self {
        self.string_val = value.into();
        self
    }

    pub fn value(&self, ty: VarType) -> VarValue {
        match ty {
            VarType::Bool => VarValue::Bool(self.bool_val),
            VarType::Int => VarValue::Int(self.int_val),
            VarType::Float => VarValue::Float(self.float_val),
            VarType::String => VarValue::String(self.string_val.clone()),
        }
    }

    /// Writes `value` into the slot matching its own type.
    pub fn assign(&mut self, value: VarValue) {
        match value {
            VarValue::Bool(value) => self.bool_val = value,
            VarValue::Int(value) => self.int_val = value,
            VarValue::Float(value) => self.float_val = value,
            VarValue::String(value) => self.string_val = value,
        }
    }

    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// Literal operand used when a Logic/EditVariable slot is not wired to a Variable node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperandLiteral {
    #[serde(default, rename = "bool")]
    pub bool_val: bool,
    #[serde(default, rename = "int")]
    pub int_val: i32,
    #[serde(default, rename = "float")]
    pub float_val: f32,
    #[serde(default, rename = "string")]
    pub string_val: String,
}

impl OperandLiteral {
    pub fn from_value(value: VarValue) -> Self {
        let mut literal = Self::default();
        match value {
            VarValue::Bool(value) => literal.bool_val = value,
            VarValue::Int(value) => literal.int_val = value,
            VarValue::Float(value) => literal.float_val = value,
            VarValue::String(value) => literal.string_val = value,
        }
        literal
    }

    pub fn value(&self, ty: VarType) -> VarValue {
        match ty {
            VarType::Bool => VarValue::Bool(self.bool_val),
            VarType::Int => VarValue::Int(self.int_val),
            VarType::Float => VarValue::Float(self.float_val),
            VarType::String => VarValue::String(self.string_val.clone()),
        }
    }
}
