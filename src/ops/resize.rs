use super::{ensure_dos_fixed, staging::Staging, target, Transform};
use crate::{
    errors::ImageError,
    image::{copy_range, copy_to_end, write_zeroes, DiskImage},
};
use parm_block::{
    PartitionGeometry, VolumeId, MAX_PARTITION_BYTES, SECTOR_BYTES, TRACK_BYTES,
};
use std::fs::File;

fn align_up(value: u64, unit: u64) -> Option<u64> {
    value.checked_add(unit - 1).map(|value| value / unit * unit)
}

/// Rounds `delta` up to a multiple of `unit`, so that the disk keeps a whole number
/// of cylinders.
fn whole_cylinders(delta: i64, unit: i64) -> i64 {
    match delta.rem_euclid(unit) {
        0 => delta,
        rem => delta + (unit - rem),
    }
}

fn shift(value: u64, delta: i64) -> u64 {
    if delta < 0 {
        value.saturating_sub(delta.unsigned_abs())
    } else {
        value + delta as u64
    }
}

impl DiskImage {
    /// Changes the size of a partition, shifting every partition after it.
    ///
    /// The partition will span `size` rounded up to a whole track, and records `size`
    /// rounded up to a whole sector (then down to its family's size unit). Bytes after
    /// the partition move by the change in its span, which the disk's total size also
    /// grows or shrinks by. On drives with more than one head, the span is rounded up
    /// further until that change is a whole number of cylinders. Growing fills the new
    /// space with zeroes; shrinking discards the end of the partition.
    pub fn resize(&mut self, volume: VolumeId, size: u64) -> Result<Transform, ImageError> {
        let mut table = self.table()?;
        let record = target(&table, volume)?;

        if size == 0 {
            return Err(ImageError::SizeTooSmall);
        }

        let too_large = ImageError::SizeTooLarge { size, max: MAX_PARTITION_BYTES };
        let length = match align_up(size, SECTOR_BYTES) {
            Some(length) if length <= MAX_PARTITION_BYTES => length,
            _ => return Err(too_large),
        };

        let new_span = align_up(size, TRACK_BYTES).ok_or(too_large)?;
        let cylinder = (u64::from(self.block().heads).max(1) * TRACK_BYTES) as i64;
        let delta = whole_cylinders(new_span as i64 - record.span as i64, cylinder);
        let new_span = shift(record.span, delta);
        let transform = Transform::new(volume, record.offset, record.offset, record.span, new_span);
        let delta = transform.delta();

        info!(
            "resizing {}: span {} -> {} ({:+} bytes)",
            volume, record.span, new_span, delta
        );

        if delta != 0 {
            ensure_dos_fixed(&table, |dos| dos.offset > record.offset)?;
        }

        for other in table.iter_mut() {
            if other.is_allocated() && other.offset > record.offset {
                other.offset = shift(other.offset, delta);
            }
        }

        if let Some(resized) = table.get_mut(volume) {
            resized.length = length;
        }

        // Every field is validated on a copy, before anything is written.
        let mut block = self.block().clone();
        table.apply(&mut block)?;
        let total = shift(block.total_size(), delta);
        block.set_total_size(total)?;

        let start = self.position(record.offset);
        let mut source = File::open(self.path())?;
        let mut staging = Staging::new(self.path())?;
        let mut buffer = vec![0; self.config.buffer_size];

        copy_range(&mut source, &mut staging.file, 0, start, &mut buffer)?;
        copy_range(&mut source, &mut staging.file, start, record.span.min(new_span), &mut buffer)?;
        if new_span > record.span {
            write_zeroes(&mut staging.file, new_span - record.span, &mut buffer)?;
        }
        let rest = copy_to_end(&mut source, &mut staging.file, start + record.span, &mut buffer)?;
        debug!("{}: shifted {} trailing bytes", volume, rest);

        self.write_block(&mut staging.file, &block)?;
        staging.commit(self.path())?;
        self.set_block(block);

        Ok(transform)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        fixtures::{self, without_block, TRACK},
        Config, DiskImage, ImageError, Transform,
    };
    use parm_block::{Family, ParmError, VolumeId, MAX_PARTITION_BYTES};
    use std::fs;

    fn open(fixture: &fixtures::Fixture) -> DiskImage {
        DiskImage::open(&fixture.path, Config::default().buffer_size(3000)).unwrap()
    }

    fn offset(image: &DiskImage, family: Family, index: usize) -> u64 {
        image.record(VolumeId::new(family, index)).unwrap().offset
    }

    fn track(n: u64) -> usize { (n * TRACK) as usize }

    #[test]
    fn grow_prodos() {
        let fixture = fixtures::image(&fixtures::block(0), None, 256);
        let before = fs::read(&fixture.path).unwrap();
        let mut image = open(&fixture);
        let prodos = VolumeId::new(Family::ProDos, 0);

        let transform = image.resize(prodos, 5 * TRACK).unwrap();
        assert_eq!(transform, Transform::new(prodos, 52 * TRACK, 52 * TRACK, 3 * TRACK, 5 * TRACK));

        let after = fs::read(&fixture.path).unwrap();
        assert_eq!(after.len(), before.len() + track(2));

        // The partition keeps its contents, and gains two tracks of zeroes.
        assert_eq!(
            without_block(&after[..track(55)], 0),
            without_block(&before[..track(55)], 0)
        );
        assert!(after[track(55)..track(57)].iter().all(|&byte| byte == 0));
        // Everything after it moves along by two tracks.
        assert_eq!(after[track(57)..], before[track(55)..]);

        assert_eq!(image.record(prodos).unwrap().length, 5 * TRACK);
        assert_eq!(offset(&image, Family::Pascal, 0), 57 * TRACK);
        assert_eq!(offset(&image, Family::Pascal, 1), 60 * TRACK);
        assert_eq!(image.total_size(), 64 * TRACK);
        assert_eq!(image.block().cylinders, 64);

        // The block on disk matches the one that was adopted.
        let reopened = open(&fixture);
        assert_eq!(reopened.block(), image.block());
    }

    #[test]
    fn shrink_cpm() {
        let fixture = fixtures::image(&fixtures::block(0), None, 256);
        let before = fs::read(&fixture.path).unwrap();
        let mut image = open(&fixture);
        let cpm = VolumeId::new(Family::Cpm, 0);

        let transform = image.resize(cpm, TRACK).unwrap();
        assert_eq!(transform.delta(), -(TRACK as i64));

        let after = fs::read(&fixture.path).unwrap();
        assert_eq!(after.len(), before.len() - track(1));
        assert_eq!(
            without_block(&after[..track(51)], 0),
            without_block(&before[..track(51)], 0)
        );
        assert_eq!(after[track(51)..], before[track(52)..]);

        assert_eq!(image.block().cpm[0].size, 4);
        assert_eq!(offset(&image, Family::ProDos, 0), 51 * TRACK);
        assert_eq!(offset(&image, Family::Pascal, 0), 54 * TRACK);
        assert_eq!(offset(&image, Family::Pascal, 1), 57 * TRACK);
        assert_eq!(image.total_size(), 61 * TRACK);
    }

    #[test]
    fn grow_last_pascal() {
        let fixture = fixtures::image(&fixtures::block(0), None, 256);
        let mut image = open(&fixture);
        let pascal = VolumeId::new(Family::Pascal, 1);

        image.resize(pascal, 6 * TRACK).unwrap();
        assert_eq!(image.total_size(), 64 * TRACK);
        // The length of the last Pascal volume follows from the size of the disk.
        assert_eq!(image.record(pascal).unwrap().length, 6 * TRACK);
        assert_eq!(fs::metadata(&fixture.path).unwrap().len(), 64 * TRACK);
    }

    #[test]
    fn unaligned_size() {
        let fixture = fixtures::image(&fixtures::block(0), None, 256);
        let mut image = open(&fixture);
        let cpm = VolumeId::new(Family::Cpm, 0);

        // Spans round up to a track, but lengths are stored in quarter tracks.
        let transform = image.resize(cpm, 2 * TRACK + 100).unwrap();
        assert_eq!(transform.new_span, 3 * TRACK);
        assert_eq!(image.block().cpm[0].size, 8);
        assert_eq!(offset(&image, Family::ProDos, 0), 53 * TRACK);
    }

    /// The same layout on a drive with two heads, so that a cylinder is two tracks.
    fn two_heads() -> fixtures::Fixture {
        let mut block = fixtures::block(0);
        block.heads = 2;
        block.cylinders = 31;
        fixtures::image(&block, None, 256)
    }

    #[test]
    fn grow_by_whole_cylinders() {
        let fixture = two_heads();
        let mut image = open(&fixture);
        let prodos = VolumeId::new(Family::ProDos, 0);

        let transform = image.resize(prodos, 4 * TRACK).unwrap();
        assert_eq!(transform.new_span, 5 * TRACK);
        assert_eq!(transform.delta(), 2 * TRACK as i64);

        assert_eq!(image.record(prodos).unwrap().length, 4 * TRACK);
        assert_eq!(image.block().prodos[0].size, 64);
        assert_eq!(offset(&image, Family::Pascal, 0), 57 * TRACK);
        assert_eq!(offset(&image, Family::Pascal, 1), 60 * TRACK);
        assert_eq!(image.record(VolumeId::new(Family::Pascal, 1)).unwrap().length, 4 * TRACK);

        assert_eq!(image.block().cylinders, 32);
        assert_eq!(image.total_size(), 64 * TRACK);
        assert_eq!(fs::metadata(&fixture.path).unwrap().len(), image.total_size());
    }

    #[test]
    fn shrink_within_a_cylinder() {
        let fixture = two_heads();
        let before = fs::read(&fixture.path).unwrap();
        let mut image = open(&fixture);
        let cpm = VolumeId::new(Family::Cpm, 0);

        let transform = image.resize(cpm, TRACK).unwrap();
        assert_eq!(transform.delta(), 0);
        assert_eq!(transform.new_span, 2 * TRACK);

        assert_eq!(image.block().cpm[0].size, 4);
        assert_eq!(offset(&image, Family::ProDos, 0), 52 * TRACK);
        assert_eq!(image.block().cylinders, 31);
        assert_eq!(image.total_size(), 62 * TRACK);

        let after = fs::read(&fixture.path).unwrap();
        assert_eq!(after.len(), before.len());
        assert_eq!(after[track(51)..], before[track(51)..]);
    }

    #[test]
    fn sizes_past_the_end_of_the_address_space() {
        let fixture = fixtures::image(&fixtures::block(0), None, 256);
        let before = fs::read(&fixture.path).unwrap();
        let mut image = open(&fixture);

        match image.resize(VolumeId::new(Family::Cpm, 0), u64::MAX) {
            Err(ImageError::SizeTooLarge { size, max }) => {
                assert_eq!(size, u64::MAX);
                assert_eq!(max, MAX_PARTITION_BYTES);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(fs::read(&fixture.path).unwrap(), before);
    }

    #[test]
    fn resize_to_current_span() {
        let fixture = fixtures::image(&fixtures::block(0), None, 256);
        let before = fs::read(&fixture.path).unwrap();
        let mut image = open(&fixture);
        let prodos = VolumeId::new(Family::ProDos, 0);

        let transform = image.resize(prodos, 2 * TRACK).unwrap();
        assert_eq!(transform.delta(), -(TRACK as i64));
        assert_eq!(image.record(prodos).unwrap().length, 2 * TRACK);

        let mut image = open(&fixture);
        let transform = image.resize(prodos, 2 * TRACK).unwrap();
        assert_eq!(transform.delta(), 0);
        assert_eq!(fs::metadata(&fixture.path).unwrap().len(), before.len() as u64 - TRACK);
    }

    #[test]
    fn container_header_is_preserved() {
        let header = fixtures::container_header();
        let fixture = fixtures::image(&fixtures::block(0), Some(&header), 256);
        let mut image = open(&fixture);

        image.resize(VolumeId::new(Family::Cpm, 0), 4 * TRACK).unwrap();
        let after = fs::read(&fixture.path).unwrap();
        assert_eq!(after[..header.len()], header[..]);

        let reopened = open(&fixture);
        assert_eq!(reopened.header_len(), header.len() as u64);
        assert_eq!(reopened.record(VolumeId::new(Family::ProDos, 0)).unwrap().offset, 54 * TRACK);
    }

    #[test]
    fn rejected_resizes_leave_image_untouched() {
        let fixture = fixtures::image(&fixtures::block(0), None, 256);
        let before = fs::read(&fixture.path).unwrap();
        let mut image = open(&fixture);

        let cpm = VolumeId::new(Family::Cpm, 0);
        match image.resize(cpm, 0) {
            Err(ImageError::SizeTooSmall) => (),
            other => panic!("unexpected result: {:?}", other),
        }

        match image.resize(cpm, 32 * 1024 * 1024) {
            Err(ImageError::SizeTooLarge { max, .. }) => assert_eq!(max, MAX_PARTITION_BYTES),
            other => panic!("unexpected result: {:?}", other),
        }

        match image.resize(VolumeId::new(Family::Cpm, 3), TRACK) {
            Err(ImageError::VolumeUnallocated { .. }) => (),
            other => panic!("unexpected result: {:?}", other),
        }

        match image.resize(VolumeId::new(Family::Dos, 0), TRACK) {
            Err(ImageError::Parm { why }) => {
                assert_eq!(why, ParmError::UnsupportedForFamily { family: Family::Dos })
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert_eq!(fs::read(&fixture.path).unwrap(), before);
        assert_eq!(image.block(), &fixtures::block(0));
    }

    #[test]
    fn dos_volumes_are_never_displaced() {
        let mut block = fixtures::block(1);
        block.cpm[1].start = 20;
        block.cpm[1].size = 16;
        let fixture = fixtures::image(&block, None, 256);
        let before = fs::read(&fixture.path).unwrap();
        let mut image = open(&fixture);

        match image.resize(VolumeId::new(Family::Cpm, 1), 6 * TRACK) {
            Err(ImageError::DosVolumeDisplaced { index }) => assert_eq!(index, 0),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(fs::read(&fixture.path).unwrap(), before);

        // Partitions after the DOS volumes are free to change.
        image.resize(VolumeId::new(Family::Cpm, 0), 4 * TRACK).unwrap();
        assert_eq!(offset(&image, Family::Dos, 0), 32 * TRACK);
    }
}
