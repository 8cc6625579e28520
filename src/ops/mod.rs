//! Operations which rewrite the layout of an image: resizing a partition, and moving
//! it to another place on the disk.

mod mvpart;
mod resize;
mod staging;

pub use self::mvpart::Rotation;

use crate::errors::ImageError;
use parm_block::{Family, ParmError, PartitionRecord, PartitionTable, VolumeId};

/// Where a partition was, and where it has ended up, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct Transform {
    pub volume:     VolumeId,
    pub old_offset: u64,
    pub new_offset: u64,
    pub old_span:   u64,
    pub new_span:   u64,
}

impl Transform {
    /// The change in the span of the partition, which every partition after it was
    /// shifted by.
    pub fn delta(&self) -> i64 { self.new_span as i64 - self.old_span as i64 }

    pub fn is_moving(&self) -> bool { self.old_offset != self.new_offset }

    pub fn is_resizing(&self) -> bool { self.old_span != self.new_span }
}

/// Fetches the record of a volume that a transform will operate on.
fn target(table: &PartitionTable, volume: VolumeId) -> Result<PartitionRecord, ImageError> {
    if volume.family == Family::Dos {
        return Err(ParmError::UnsupportedForFamily { family: Family::Dos }.into());
    }

    let record = table.record(volume)?;
    if !record.is_allocated() {
        return Err(ImageError::VolumeUnallocated { volume });
    }

    Ok(record)
}

/// DOS volumes sit at fixed positions, so nothing may move one.
fn ensure_dos_fixed<F: Fn(&PartitionRecord) -> bool>(
    table: &PartitionTable,
    displaced: F,
) -> Result<(), ImageError> {
    match table.allocated().find(|r| r.volume.family == Family::Dos && displaced(r)) {
        Some(record) => Err(ImageError::DosVolumeDisplaced { index: record.volume.index }),
        None => Ok(()),
    }
}
