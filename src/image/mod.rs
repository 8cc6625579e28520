//! Opening an image, locating its parameter block, and reading its partitions.

mod copy;
mod volume;

pub(crate) use self::copy::{copy_range, copy_to_end, write_zeroes};

use crate::{config::Config, errors::ImageError};
use parm_block::{
    ParameterBlock, PartitionGeometry, PartitionRecord, PartitionTable, VolumeId,
    PARM_BLOCK_BYTES,
};
use std::{
    fmt,
    fs::File,
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Length of the header that precedes the disk data in a 2IMG container.
pub const CONTAINER_HEADER_BYTES: u64 = 64;
const CONTAINER_MAGIC: &[u8] = b"2IMG";

/// Images are stored with either 256 or 512 bytes per sector. In a 512-byte sector
/// image, only the first half of the second sector belongs to the parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorSize {
    Bytes256,
    Bytes512,
}

impl SectorSize {
    pub fn bytes(self) -> u64 {
        match self {
            SectorSize::Bytes256 => 256,
            SectorSize::Bytes512 => 512,
        }
    }

    /// Images written with 512-byte sectors leave the upper half of the first two
    /// sectors empty, which an image of 256-byte sectors never does.
    fn detect(data: &[u8]) -> SectorSize {
        let empty = |range: std::ops::Range<usize>| {
            data.get(range).map_or(false, |bytes| bytes.iter().all(|&byte| byte == 0))
        };

        if empty(256..512) && empty(768..1024) {
            SectorSize::Bytes512
        } else {
            SectorSize::Bytes256
        }
    }
}

impl fmt::Display for SectorSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self.bytes()) }
}

impl FromStr for SectorSize {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "256" => Ok(SectorSize::Bytes256),
            "512" => Ok(SectorSize::Bytes512),
            _ => Err(format!("'{}' is not a sector size: must be 256 or 512", input)),
        }
    }
}

/// An open disk image, and the parameter block that was decoded from it.
#[derive(Debug)]
pub struct DiskImage {
    path:        PathBuf,
    header:      u64,
    sector_size: SectorSize,
    block:       ParameterBlock,
    /// The raw sector holding the parameter block. Bytes beyond the block itself are
    /// written back untouched.
    slot:        Vec<u8>,
    pub(crate) config: Config,
}

impl DiskImage {
    pub fn open<P: AsRef<Path>>(path: P, config: Config) -> Result<DiskImage, ImageError> {
        let path = path.as_ref().to_path_buf();
        let mut file =
            File::open(&path).map_err(|why| ImageError::Open { path: path.clone(), why })?;
        let len = file.metadata()?.len();

        let mut head = Vec::new();
        (&mut file).take(CONTAINER_HEADER_BYTES + 1024).read_to_end(&mut head)?;

        let header = if head.starts_with(CONTAINER_MAGIC) { CONTAINER_HEADER_BYTES } else { 0 };
        let data = &head[head.len().min(header as usize)..];
        let sector_size = config.sector_size.unwrap_or_else(|| SectorSize::detect(data));
        let sector = sector_size.bytes() as usize;

        if len < header + 2 * sector as u64 || data.len() < 2 * sector {
            return Err(ImageError::TooSmall { len });
        }

        let slot = data[sector..2 * sector].to_vec();
        let block = ParameterBlock::decode(&slot[..PARM_BLOCK_BYTES])?;

        info!(
            "opened {:?}: {} bytes, {}-byte sectors{}",
            path,
            len,
            sector_size,
            if header != 0 { ", 2IMG container" } else { "" }
        );

        if !block.small_volumes_consistent() {
            warn!("{:?}: small DOS volume count fails its XOR check", path);
        }

        Ok(DiskImage { path, header, sector_size, block, slot, config })
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Bytes of container header that precede the disk data.
    pub fn header_len(&self) -> u64 { self.header }

    pub fn sector_size(&self) -> SectorSize { self.sector_size }

    pub fn block(&self) -> &ParameterBlock { &self.block }

    pub fn config(&self) -> &Config { &self.config }

    /// The partition table of the image, with the span of every record computed.
    pub fn table(&self) -> Result<PartitionTable, ImageError> {
        Ok(PartitionTable::build(&self.block)?.with_spans())
    }

    /// The record of a volume which is in use.
    pub fn record(&self, volume: VolumeId) -> Result<PartitionRecord, ImageError> {
        let record = self.table()?.record(volume)?;
        if !record.is_allocated() {
            return Err(ImageError::VolumeUnallocated { volume });
        }

        Ok(record)
    }

    /// The size of the disk according to its geometry.
    pub fn total_size(&self) -> u64 { self.block.total_size() }

    /// Bytes of disk data in the image file, excluding any container header.
    pub fn data_len(&self) -> Result<u64, ImageError> {
        let len = self.path.metadata()?.len();
        Ok(len.saturating_sub(self.header))
    }

    /// Position of a partition's first byte within the image file.
    pub(crate) fn position(&self, offset: u64) -> u64 { self.header + offset }

    /// Writes `block` into its slot within `file`, which must hold this image's data.
    pub(crate) fn write_block<F: Write + Seek>(
        &self,
        file: &mut F,
        block: &ParameterBlock,
    ) -> io::Result<()> {
        let mut slot = self.slot.clone();
        slot[..PARM_BLOCK_BYTES].copy_from_slice(&block.encode());
        file.seek(SeekFrom::Start(self.position(self.sector_size.bytes())))?;
        file.write_all(&slot)
    }

    /// Adopts the block that was written by a committed transform.
    pub(crate) fn set_block(&mut self, block: ParameterBlock) {
        self.slot[..PARM_BLOCK_BYTES].copy_from_slice(&block.encode());
        self.block = block;
    }
}
