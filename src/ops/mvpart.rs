use super::{ensure_dos_fixed, staging::Staging, target, Transform};
use crate::{
    errors::ImageError,
    image::{copy_range, copy_to_end, DiskImage},
};
use parm_block::{VolumeId, TRACK_BYTES};
use std::{collections::BTreeSet, fs::File};

/// A rotation of the bytes within `begin..end`.
///
/// A positive `amount` rotates right, bringing that many bytes from the end of the
/// region to its front. A negative `amount` rotates left, sending that many bytes
/// from the front of the region to its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct Rotation {
    pub begin:  u64,
    pub end:    u64,
    pub amount: i64,
}

impl Rotation {
    /// The rotation which moves `size` bytes at `offset` so that they begin at
    /// `new_offset`, and shifts the bytes between the two places to make room.
    pub fn for_move(offset: u64, size: u64, new_offset: u64) -> Rotation {
        if new_offset < offset {
            Rotation::new(new_offset, offset + size, size as i64)
        } else {
            Rotation::new(offset, new_offset + size, -(size as i64))
        }
    }

    pub fn len(&self) -> u64 { self.end - self.begin }

    pub fn is_empty(&self) -> bool { self.amount == 0 || self.len() == 0 }

    pub fn contains(&self, offset: u64) -> bool { self.begin <= offset && offset < self.end }

    /// Ranges of the source, given as `(start, length)`, in the order that they are
    /// written out to produce the rotated region.
    pub fn segments(&self) -> [(u64, u64); 2] {
        let amount = self.amount.unsigned_abs();
        let rest = self.len() - amount;
        if self.amount >= 0 {
            [(self.end - amount, amount), (self.begin, rest)]
        } else {
            [(self.begin + amount, rest), (self.begin, amount)]
        }
    }

    /// Where the byte at `offset` lands after the rotation.
    pub fn map(&self, offset: u64) -> u64 {
        if !self.contains(offset) {
            return offset;
        }

        let amount = self.amount.unsigned_abs();
        let rest = self.len() - amount;
        if self.amount >= 0 {
            if offset >= self.end - amount { offset - rest } else { offset + amount }
        } else if offset < self.begin + amount {
            offset + rest
        } else {
            offset - amount
        }
    }
}

impl DiskImage {
    /// Moves a partition so that it begins at `new_offset`, keeping its size.
    ///
    /// The partitions between the old and new places shift over to fill the space
    /// which the partition leaves behind. Moving towards the start of the disk,
    /// `new_offset` must be where another partition begins or ends. Moving towards
    /// the end, it is the partition's new end, `new_offset` plus its span, that must
    /// land on such a boundary rather than `new_offset` itself. Either way, the moved
    /// partition is left flush against its new neighbours.
    ///
    /// The span of the partition must be a whole number of tracks, since every
    /// partition it passes is shifted by that span.
    pub fn move_to(&mut self, volume: VolumeId, new_offset: u64) -> Result<Transform, ImageError> {
        let mut table = self.table()?;
        let record = target(&table, volume)?;
        let transform =
            Transform::new(volume, record.offset, new_offset, record.span, record.span);

        if new_offset == record.offset {
            info!("{} is already at {}", volume, new_offset);
            return Ok(transform);
        }

        let boundaries: BTreeSet<u64> = table
            .by_offset()
            .iter()
            .filter(|other| other.volume != volume)
            .flat_map(|other| vec![other.offset, other.end()])
            .collect();

        let edge = if new_offset < record.offset {
            Some(new_offset)
        } else {
            new_offset.checked_add(record.span)
        };

        match edge {
            Some(edge) if boundaries.contains(&edge) && new_offset % TRACK_BYTES == 0 => (),
            _ => return Err(ImageError::NotOnPartitionBoundary { offset: new_offset }),
        }

        if record.span % TRACK_BYTES != 0 {
            return Err(ImageError::SpanNotTrackAligned { volume, span: record.span });
        }

        let rotation = Rotation::for_move(record.offset, record.span, new_offset);
        if rotation.end > self.data_len()? {
            return Err(ImageError::NotOnPartitionBoundary { offset: new_offset });
        }

        ensure_dos_fixed(&table, |dos| rotation.contains(dos.offset))?;

        info!(
            "moving {} from {} to {}: rotating {}..{} by {}",
            volume, record.offset, new_offset, rotation.begin, rotation.end, rotation.amount
        );

        for other in table.iter_mut() {
            if other.is_allocated() {
                other.offset = rotation.map(other.offset);
            }
        }

        let mut block = self.block().clone();
        table.apply(&mut block)?;

        let mut source = File::open(self.path())?;
        let mut staging = Staging::new(self.path())?;
        let mut buffer = vec![0; self.config.buffer_size];

        copy_range(&mut source, &mut staging.file, 0, self.position(rotation.begin), &mut buffer)?;
        for &(start, len) in rotation.segments().iter() {
            copy_range(&mut source, &mut staging.file, self.position(start), len, &mut buffer)?;
        }
        copy_to_end(&mut source, &mut staging.file, self.position(rotation.end), &mut buffer)?;

        self.write_block(&mut staging.file, &block)?;
        staging.commit(self.path())?;
        self.set_block(block);

        Ok(transform)
    }
}
