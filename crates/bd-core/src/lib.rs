pub mod document;
pub mod error;
pub mod store;
pub mod types;
pub mod value;

pub use document::{TreeBuilder, TreeDocument};
pub use error::DialogueError;
pub use store::VariableStore;
pub use types::*;
pub use value::*;
