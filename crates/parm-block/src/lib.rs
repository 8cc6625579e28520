//! Types for decoding the parameter block of a Sider hard disk image, and for
//! converting its packed per-family fields into partition offsets and lengths.

extern crate byteorder;
#[macro_use]
extern crate derive_new;
extern crate failure;
#[macro_use]
extern crate failure_derive;
extern crate itertools;
#[macro_use]
extern crate log;

mod block;
mod error;
mod geometry;
mod table;
mod volume;

pub use self::{block::*, error::*, geometry::*, table::*, volume::*};

/// Size of a logical sector, which every partition offset is a multiple of.
pub const SECTOR_BYTES: u64 = 256;
/// Size of a track: 32 sectors of 256 bytes.
pub const TRACK_BYTES: u64 = 32 * SECTOR_BYTES;
/// CP/M partition sizes are recorded in quarter tracks.
pub const QUARTER_TRACK_BYTES: u64 = TRACK_BYTES / 4;
/// ProDOS partition sizes are recorded in 512-byte blocks, whatever the image's sector size.
pub const PRODOS_BLOCK_BYTES: u64 = 512;

/// The boot and parameter sectors reserved ahead of the first DOS volume.
pub const DOS_BASE: u64 = 1024 * SECTOR_BYTES;
/// A small (140K) DOS 3.3 volume.
pub const DOS_SMALL_BYTES: u64 = 140 * 1024;
/// A large (400K) DOS 3.3 volume.
pub const DOS_LARGE_BYTES: u64 = 400 * 1024;

/// The largest stored length a single partition may have.
pub const MAX_PARTITION_BYTES: u64 = 32 * 1024 * 1024 - SECTOR_BYTES;
