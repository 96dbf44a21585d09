pub mod config;
pub mod date;
pub mod document;
pub mod path;
pub mod task;

pub use config::*;
pub use date::*;
pub use document::*;
pub use path::*;
pub use task::*;
