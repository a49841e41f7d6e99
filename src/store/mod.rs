pub mod entity_files;
pub mod project_fs;
pub mod rest;
pub mod traits;
pub mod ui_layout;

pub use entity_files::*;
pub use project_fs::*;
pub use rest::*;
pub use traits::*;
pub use ui_layout::*;
