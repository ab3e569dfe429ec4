mod disks;
mod error;
mod traits;

pub mod filesystem;
pub mod memory;
pub mod path;

pub use disks::DiskRegistry;
pub use error::StorageError;
pub use traits::ObjectStore;
