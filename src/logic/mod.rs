pub mod catalog;
pub mod flow_linker;
pub mod generator;
pub mod module_pool;
pub mod plugin_editor;

pub use catalog::*;
pub use flow_linker::*;
pub use generator::*;
pub use module_pool::*;
pub use plugin_editor::*;
