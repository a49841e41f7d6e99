pub mod common;
pub mod entity;
pub mod environment;
pub mod flow;
pub mod plugin;
pub mod ui;

pub use common::*;
pub use entity::*;
pub use environment::*;
pub use flow::*;
pub use plugin::*;
pub use ui::*;
