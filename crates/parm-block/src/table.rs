use crate::{
    error::ParmError,
    geometry::PartitionGeometry,
    volume::{Family, VolumeId},
};
use itertools::Itertools;
use std::collections::{btree_map, BTreeMap};

/// The location of a single partition, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct PartitionRecord {
    pub volume: VolumeId,
    pub offset: u64,
    /// The length recorded for the partition (implied, for Pascal volumes).
    pub length: u64,
    /// The bytes the partition occupies up to the next partition. Only meaningful
    /// once the table has been passed through `PartitionTable::with_spans`.
    #[new(default)]
    pub span:   u64,
}

impl PartitionRecord {
    /// A slot starting at byte 0 is not in use: the start of the disk holds the boot
    /// sectors and the parameter block.
    pub fn is_allocated(&self) -> bool { self.offset != 0 }

    /// Where the occupied span ends.
    pub fn end(&self) -> u64 { self.offset + self.span }
}

/// Every partition slot of a parameter block, keyed by its volume id.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionTable {
    records:    BTreeMap<VolumeId, PartitionRecord>,
    total_size: u64,
}

impl PartitionTable {
    /// Collects the records of every CP/M, ProDOS, Pascal, and DOS slot.
    pub fn build<G: PartitionGeometry>(geometry: &G) -> Result<Self, ParmError> {
        let mut records = BTreeMap::new();
        for volume in geometry.volume_ids() {
            let record =
                PartitionRecord::new(volume, geometry.offset(volume)?, geometry.length(volume)?);
            records.insert(volume, record);
        }

        Ok(PartitionTable { records, total_size: geometry.total_size() })
    }

    /// Annotates each allocated record with the span that it occupies on the disk.
    ///
    /// Records are walked in order of their offsets. A record spans up to the offset of
    /// the record after it, and the last record spans its own length. Unallocated
    /// records span nothing.
    pub fn with_spans(mut self) -> Self {
        let mut order: Vec<(u64, VolumeId)> = self
            .records
            .values()
            .filter(|record| record.is_allocated())
            .map(|record| (record.offset, record.volume))
            .collect();
        order.sort();

        for record in self.records.values_mut() {
            record.span = 0;
        }

        for (&(offset, volume), &(next, _)) in order.iter().tuple_windows() {
            if let Some(record) = self.records.get_mut(&volume) {
                record.span = next - offset;
            }
        }

        if let Some(&(_, last)) = order.last() {
            if let Some(record) = self.records.get_mut(&last) {
                record.span = record.length;
            }
        }

        self
    }

    /// Writes every record that differs from the block back through its setters.
    ///
    /// DOS volumes are laid out by their counts alone, and are never written.
    pub fn apply<G: PartitionGeometry>(&self, geometry: &mut G) -> Result<(), ParmError> {
        for record in self.records.values().filter(|r| r.volume.family != Family::Dos) {
            let volume = record.volume;

            let offset = geometry.offset(volume)?;
            if offset != record.offset {
                debug!("{}: offset {} -> {}", volume, offset, record.offset);
                geometry.set_offset(volume, record.offset)?;
            }

            let length = geometry.length(volume)?;
            if volume.family != Family::Pascal && length != record.length {
                debug!("{}: length {} -> {}", volume, length, record.length);
                geometry.set_length(volume, record.length)?;
            }
        }

        Ok(())
    }

    pub fn get(&self, volume: VolumeId) -> Option<&PartitionRecord> { self.records.get(&volume) }

    pub fn get_mut(&mut self, volume: VolumeId) -> Option<&mut PartitionRecord> {
        self.records.get_mut(&volume)
    }

    /// Like `get`, but reports a volume that has no slot as an error.
    pub fn record(&self, volume: VolumeId) -> Result<PartitionRecord, ParmError> {
        self.get(volume).cloned().ok_or(ParmError::IndexOutOfRange {
            family: volume.family,
            index:  volume.index,
        })
    }

    pub fn iter(&self) -> btree_map::Values<VolumeId, PartitionRecord> { self.records.values() }

    pub fn iter_mut(&mut self) -> btree_map::ValuesMut<VolumeId, PartitionRecord> {
        self.records.values_mut()
    }

    pub fn allocated(&self) -> impl Iterator<Item = &PartitionRecord> {
        self.records.values().filter(|record| record.is_allocated())
    }

    /// The allocated records, in the order that they appear on the disk.
    pub fn by_offset(&self) -> Vec<PartitionRecord> {
        let mut records: Vec<PartitionRecord> = self.allocated().cloned().collect();
        records.sort_by_key(|record| (record.offset, record.volume));
        records
    }

    pub fn total_size(&self) -> u64 { self.total_size }

    pub fn set_total_size(&mut self, size: u64) { self.total_size = size; }

    /// Bytes that no span accounts for: the reserved area before the first partition,
    /// and whatever follows the end of the last one.
    pub fn gaps(&self) -> u64 {
        let records = self.by_offset();
        match (records.first(), records.last()) {
            (Some(first), Some(last)) => first.offset + self.total_size.saturating_sub(last.end()),
            _ => self.total_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{block::tests::sample, block::ParameterBlock, TRACK_BYTES};

    /// DOS volumes fill 262144..1368064, followed by Pascal, ProDOS, and CP/M volumes.
    fn block() -> ParameterBlock {
        let mut block = ParameterBlock::decode(&sample()).unwrap();
        block.cylinders = 60;
        block.pascal_starts = [167, 0, 0, 0];
        block.prodos[0].start = 170;
        block.prodos[0].size = 40;
        block.prodos[1].start = 175;
        block.prodos[1].size = 64;
        block.cpm[0].start = 180;
        block.cpm[0].size = 6;
        block
    }

    #[test]
    fn table_contains_every_slot() {
        let table = PartitionTable::build(&block()).unwrap();
        assert_eq!(table.iter().count(), 2 + 4 + 4 + 4);
        assert_eq!(table.allocated().count(), 8);
        assert_eq!(
            table.record(VolumeId::new(Family::Dos, 3)),
            Ok(PartitionRecord::new(VolumeId::new(Family::Dos, 3), 958_464, 409_600))
        );
        assert!(table.record(VolumeId::new(Family::Dos, 4)).is_err());
    }

    #[test]
    fn spans_follow_offsets() {
        let table = PartitionTable::build(&block()).unwrap().with_spans();
        let span = |family, index| table.get(VolumeId::new(family, index)).unwrap().span;

        assert_eq!(span(Family::Dos, 0), 143_360);
        // The last DOS volume runs up to the Pascal volume at track 167.
        assert_eq!(span(Family::Dos, 3), 167 * TRACK_BYTES - 958_464);
        assert_eq!(span(Family::Pascal, 0), 3 * TRACK_BYTES);
        // ProDOS 1 records 20480 bytes, but occupies 5 tracks.
        assert_eq!(table.get(VolumeId::new(Family::ProDos, 0)).unwrap().length, 20_480);
        assert_eq!(span(Family::ProDos, 0), 5 * TRACK_BYTES);
        // CP/M A is last, so it spans its recorded length.
        assert_eq!(span(Family::Cpm, 0), 6 * 2048);
        assert_eq!(span(Family::Cpm, 1), 0);
    }

    #[test]
    fn spans_and_gaps_cover_disk() {
        let table = PartitionTable::build(&block()).unwrap().with_spans();
        let spans: u64 = table.iter().map(|r| r.span).sum();
        assert_eq!(spans + table.gaps(), table.total_size());
        assert_eq!(table.total_size(), 60 * 4 * TRACK_BYTES);
    }

    #[test]
    fn by_offset_orders_records() {
        let table = PartitionTable::build(&block()).unwrap();
        let order: Vec<String> = table.by_offset().iter().map(|r| r.volume.to_string()).collect();
        assert_eq!(
            order,
            vec!["dos:0", "dos:1", "dos:2", "dos:3", "pascal:0", "prodos:0", "prodos:1", "cpm:0"]
        );
    }

    #[test]
    fn apply_writes_changes() {
        let mut block = block();
        let mut table = PartitionTable::build(&block).unwrap();

        table.get_mut(VolumeId::new(Family::ProDos, 1)).unwrap().offset = 190 * TRACK_BYTES;
        table.get_mut(VolumeId::new(Family::Cpm, 0)).unwrap().length = 12 * 2048;
        table.apply(&mut block).unwrap();

        assert_eq!(block.prodos[1].start, 190);
        assert_eq!(block.prodos[1].size, 64);
        assert_eq!(block.cpm[0].size, 12);
        assert_eq!(block.cpm[0].start, 180);
        assert_eq!(PartitionTable::build(&block).unwrap(), table);
    }

    #[test]
    fn apply_ignores_dos() {
        let mut block = block();
        let mut table = PartitionTable::build(&block).unwrap();
        table.get_mut(VolumeId::new(Family::Dos, 1)).unwrap().offset = 0;
        table.apply(&mut block).unwrap();
        assert_eq!(block, self::block());
    }
}
