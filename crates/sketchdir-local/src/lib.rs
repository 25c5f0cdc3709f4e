// Local filesystem implementations of the capability traits

pub mod filesystem;
pub mod picker;
pub mod store;

pub use filesystem::{LocalDirectory, LocalFile};
pub use picker::PathPicker;
pub use store::JsonFileStore;
