//! Conversions between the packed fields of a parameter block and byte offsets and
//! lengths on the disk.
//!
//! Each family records its partitions in its own units: whole tracks for every start,
//! but 512-byte blocks for ProDOS sizes and quarter tracks for CP/M sizes. DOS volumes
//! have no fields of their own, and Pascal volumes no size. Setters divide by the
//! unit and discard the remainder, so a value which is not aligned to its unit is
//! rounded down when it is stored.

use crate::{
    block::ParameterBlock,
    error::ParmError,
    volume::{Family, VolumeId},
    DOS_BASE, DOS_LARGE_BYTES, DOS_SMALL_BYTES, PRODOS_BLOCK_BYTES, QUARTER_TRACK_BYTES,
    TRACK_BYTES,
};

pub const PRODOS_VOLUMES: usize = 2;
pub const PASCAL_VOLUMES: usize = 4;
pub const CPM_VOLUMES: usize = 4;

/// Family-agnostic access to the partitions described by a parameter block.
pub trait PartitionGeometry {
    /// The number of volumes that the given family has slots for.
    fn volumes(&self, family: Family) -> usize;

    /// Byte offset of the volume from the start of the disk.
    fn offset(&self, volume: VolumeId) -> Result<u64, ParmError>;

    /// Length of the volume in bytes.
    fn length(&self, volume: VolumeId) -> Result<u64, ParmError>;

    /// Stores a new offset, rounded down to a whole track.
    fn set_offset(&mut self, volume: VolumeId, offset: u64) -> Result<(), ParmError>;

    /// Stores a new length, rounded down to the family's size unit.
    fn set_length(&mut self, volume: VolumeId, length: u64) -> Result<(), ParmError>;

    /// Size of the whole drive, as given by its geometry.
    fn total_size(&self) -> u64;

    /// Recomputes the cylinder count for a drive of `size` bytes, keeping the heads.
    fn set_total_size(&mut self, size: u64) -> Result<(), ParmError>;

    /// Every volume slot, in family order.
    fn volume_ids(&self) -> Vec<VolumeId> {
        Family::ALL
            .iter()
            .flat_map(|&family| (0..self.volumes(family)).map(move |index| VolumeId::new(family, index)))
            .collect()
    }
}

fn narrow(field: &'static str, value: u64) -> Result<u16, ParmError> {
    if value > u64::from(u16::max_value()) {
        return Err(ParmError::FieldOverflow { field, value, max: u64::from(u16::max_value()) });
    }

    Ok(value as u16)
}

impl ParameterBlock {
    fn check_index(&self, family: Family, index: usize) -> Result<(), ParmError> {
        if index < self.volumes(family) {
            Ok(())
        } else {
            Err(ParmError::IndexOutOfRange { family, index })
        }
    }

    pub fn dos_offset(&self, index: usize) -> Result<u64, ParmError> {
        self.check_index(Family::Dos, index)?;
        let index = index as u64;
        let small = u64::from(self.dos_small_volumes);

        Ok(if index < small {
            DOS_BASE + index * DOS_SMALL_BYTES
        } else {
            DOS_BASE + small * DOS_SMALL_BYTES + (index - small) * DOS_LARGE_BYTES
        })
    }

    pub fn dos_length(&self, index: usize) -> Result<u64, ParmError> {
        self.check_index(Family::Dos, index)?;
        Ok(if index < self.dos_small_volumes as usize { DOS_SMALL_BYTES } else { DOS_LARGE_BYTES })
    }

    pub fn prodos_offset(&self, index: usize) -> Result<u64, ParmError> {
        self.check_index(Family::ProDos, index)?;
        Ok(u64::from(self.prodos[index].start) * TRACK_BYTES)
    }

    pub fn prodos_length(&self, index: usize) -> Result<u64, ParmError> {
        self.check_index(Family::ProDos, index)?;
        Ok(u64::from(self.prodos[index].size) * PRODOS_BLOCK_BYTES)
    }

    pub fn set_prodos_offset(&mut self, index: usize, offset: u64) -> Result<(), ParmError> {
        self.check_index(Family::ProDos, index)?;
        self.prodos[index].start = narrow("prodos start", offset / TRACK_BYTES)?;
        Ok(())
    }

    pub fn set_prodos_length(&mut self, index: usize, length: u64) -> Result<(), ParmError> {
        self.check_index(Family::ProDos, index)?;
        self.prodos[index].size = narrow("prodos size", length / PRODOS_BLOCK_BYTES)?;
        Ok(())
    }

    pub fn pascal_offset(&self, index: usize) -> Result<u64, ParmError> {
        self.check_index(Family::Pascal, index)?;
        Ok(u64::from(self.pascal_starts[index]) * TRACK_BYTES)
    }

    /// Pascal volumes run up to the start of the next Pascal volume, and the last one
    /// to the end of the disk.
    ///
    /// A slot whose successor is not in use (starts at 0) is treated as the last one.
    pub fn pascal_length(&self, index: usize) -> Result<u64, ParmError> {
        let offset = self.pascal_offset(index)?;
        if offset == 0 {
            return Ok(0);
        }

        let next = match index + 1 {
            next if next < PASCAL_VOLUMES => self.pascal_offset(next)?,
            _ => 0,
        };

        Ok(if next != 0 {
            next.saturating_sub(offset)
        } else {
            self.total_size().saturating_sub(offset)
        })
    }

    pub fn set_pascal_offset(&mut self, index: usize, offset: u64) -> Result<(), ParmError> {
        self.check_index(Family::Pascal, index)?;
        self.pascal_starts[index] = narrow("pascal start", offset / TRACK_BYTES)?;
        Ok(())
    }

    pub fn cpm_offset(&self, index: usize) -> Result<u64, ParmError> {
        self.check_index(Family::Cpm, index)?;
        Ok(u64::from(self.cpm[index].start) * TRACK_BYTES)
    }

    pub fn cpm_length(&self, index: usize) -> Result<u64, ParmError> {
        self.check_index(Family::Cpm, index)?;
        Ok(u64::from(self.cpm[index].size) * QUARTER_TRACK_BYTES)
    }

    pub fn set_cpm_offset(&mut self, index: usize, offset: u64) -> Result<(), ParmError> {
        self.check_index(Family::Cpm, index)?;
        self.cpm[index].start = narrow("cpm start", offset / TRACK_BYTES)?;
        Ok(())
    }

    pub fn set_cpm_length(&mut self, index: usize, length: u64) -> Result<(), ParmError> {
        self.check_index(Family::Cpm, index)?;
        self.cpm[index].size = narrow("cpm size", length / QUARTER_TRACK_BYTES)?;
        Ok(())
    }
}

impl PartitionGeometry for ParameterBlock {
    fn volumes(&self, family: Family) -> usize {
        match family {
            Family::ProDos => PRODOS_VOLUMES,
            Family::Dos => self.dos_volumes as usize,
            Family::Pascal => PASCAL_VOLUMES,
            Family::Cpm => CPM_VOLUMES,
        }
    }

    fn offset(&self, volume: VolumeId) -> Result<u64, ParmError> {
        match volume.family {
            Family::ProDos => self.prodos_offset(volume.index),
            Family::Dos => self.dos_offset(volume.index),
            Family::Pascal => self.pascal_offset(volume.index),
            Family::Cpm => self.cpm_offset(volume.index),
        }
    }

    fn length(&self, volume: VolumeId) -> Result<u64, ParmError> {
        match volume.family {
            Family::ProDos => self.prodos_length(volume.index),
            Family::Dos => self.dos_length(volume.index),
            Family::Pascal => self.pascal_length(volume.index),
            Family::Cpm => self.cpm_length(volume.index),
        }
    }

    fn set_offset(&mut self, volume: VolumeId, offset: u64) -> Result<(), ParmError> {
        match volume.family {
            Family::ProDos => self.set_prodos_offset(volume.index, offset),
            Family::Dos => Err(ParmError::UnsupportedForFamily { family: Family::Dos }),
            Family::Pascal => self.set_pascal_offset(volume.index, offset),
            Family::Cpm => self.set_cpm_offset(volume.index, offset),
        }
    }

    fn set_length(&mut self, volume: VolumeId, length: u64) -> Result<(), ParmError> {
        match volume.family {
            Family::ProDos => self.set_prodos_length(volume.index, length),
            Family::Dos => Err(ParmError::UnsupportedForFamily { family: Family::Dos }),
            // The length of a Pascal volume follows from where the next one starts.
            Family::Pascal => self.check_index(Family::Pascal, volume.index),
            Family::Cpm => self.set_cpm_length(volume.index, length),
        }
    }

    fn total_size(&self) -> u64 {
        u64::from(self.cylinders) * u64::from(self.heads) * TRACK_BYTES
    }

    fn set_total_size(&mut self, size: u64) -> Result<(), ParmError> {
        if self.heads == 0 {
            return Err(ParmError::ZeroHeads);
        }

        self.cylinders = narrow("cylinders", size / (u64::from(self.heads) * TRACK_BYTES))?;
        Ok(())
    }
}
