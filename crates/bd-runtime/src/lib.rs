mod instance;
mod reader;
pub mod template;

pub use instance::{shared_store, SharedInstance, SharedStore, TreeInstance};
pub use reader::{LoadReport, TreeReader, MAX_SETTLE_HOPS, READER_SNAPSHOT_SCHEMA};
pub use template::expand_template;
