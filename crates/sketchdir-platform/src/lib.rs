// Capability abstractions shared by the core and the native backends

pub mod error;
pub mod handle;
pub mod picker;
pub mod store;

pub use error::{ErrorKind, FsError};
pub use handle::{
    DirectoryHandle, EntryHandle, FileHandle, HandleKind, HandleToken, Permission, PermissionMode,
    WritableFile,
};
pub use picker::DirectoryPicker;
pub use store::KeyValueStore;
