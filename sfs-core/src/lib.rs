//! sfs-core: a flat, append-oriented file system over a 512-byte-page
//! block device.
//!
//! No directories, no concurrency, no journaling — a fixed-size metadata
//! table maps short owner ids to data pages, and an offline defragmenter
//! is the only thing that ever reclaims space. Intended for a
//! single-threaded, resource-constrained host (the original target was an
//! SD card driven from a microcontroller).

pub mod device;
pub mod directory;
pub mod error;
pub mod filesystem;
pub mod geometry;
pub mod hash;
pub mod metadata;
pub mod record;

pub use device::{BlockDevice, FileDevice, MemoryDevice};
pub use error::{Error, Result};
pub use filesystem::{HashMode, Sfs};
pub use geometry::Geometry;
pub use hash::{legacy_owner_hash, owner_hash};
