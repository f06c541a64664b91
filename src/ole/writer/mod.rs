//! OLE2 compound file writer.
//!
//! Changes are buffered in memory and written atomically: streams are
//! classified small/large, mini sectors and big sectors are allocated, the
//! FAT sizes itself (a fixed-point computation, since the FAT's own sectors
//! enlarge the total it must describe), and finally header, FAT, MiniFAT,
//! DIFAT, directory and data sectors are emitted.

mod core;
mod difat;
mod directory;
mod fat;
mod header;
mod minifat;
#[cfg(test)]
mod tests;

pub use core::OleWriter;
pub use difat::DifatBuilder;
pub use directory::{DirectoryBuilder, DirectoryEntryBuilder};
pub use fat::{BatAllocation, FatBuilder};
pub use header::HeaderBuilder;
pub use minifat::MiniFatBuilder;
