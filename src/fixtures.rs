//! Images for tests to operate upon.

use crate::image::CONTAINER_HEADER_BYTES;
use parm_block::{ParameterBlock, PartitionGeometry, PARM_BLOCK_BYTES, SMALL_VOLUMES_XOR, TRACK_BYTES};
use std::{fs, path::PathBuf};
use tempdir::TempDir;

pub const TRACK: u64 = TRACK_BYTES;

pub struct Fixture {
    pub dir:  TempDir,
    pub path: PathBuf,
}

/// A single-head drive of 62 tracks:
///
/// | volume   | tracks | recorded length |
/// | -------- | ------ | --------------- |
/// | cpm:0    | 50..52 | 8 quarter tracks |
/// | prodos:0 | 52..55 | 24 blocks       |
/// | pascal:0 | 55..58 | implied         |
/// | pascal:1 | 58..62 | implied         |
///
/// With `dos_volumes` small DOS volumes from track 32 onwards.
pub fn block(dos_volumes: u8) -> ParameterBlock {
    let mut raw = [0u8; PARM_BLOCK_BYTES];
    raw[0] = dos_volumes;
    raw[1] = dos_volumes ^ SMALL_VOLUMES_XOR;
    raw[4] = dos_volumes;
    raw[100..108].copy_from_slice(b"03/12/87");

    let mut block = ParameterBlock::decode(&raw).unwrap();
    block.cylinders = 62;
    block.heads = 1;
    block.cpm[0].start = 50;
    block.cpm[0].size = 8;
    block.cpm_online[0] = 1;
    block.prodos[0].start = 52;
    block.prodos[0].size = 24;
    block.pascal_starts = [55, 58, 0, 0];
    block
}

pub fn container_header() -> Vec<u8> {
    let mut header = vec![0u8; CONTAINER_HEADER_BYTES as usize];
    header[..4].copy_from_slice(b"2IMG");
    header[4..8].copy_from_slice(b"SIDR");
    header[8..].iter_mut().enumerate().for_each(|(i, byte)| *byte = i as u8);
    header
}

/// Data which identifies both the track that a byte belongs to, and where it lies
/// within that track.
pub fn pattern(len: u64) -> Vec<u8> {
    (0..len).map(|i| ((i / TRACK) as u8).wrapping_mul(37) ^ (i % 251) as u8).collect()
}

/// Writes an image holding `block`, filled out with `pattern` to its total size.
///
/// For 512-byte sectors, the upper halves of the first two sectors are cleared.
pub fn image(block: &ParameterBlock, header: Option<&[u8]>, sector: usize) -> Fixture {
    let mut data = pattern(block.total_size());
    if sector == 512 {
        data[256..512].iter_mut().for_each(|byte| *byte = 0);
        data[768..1024].iter_mut().for_each(|byte| *byte = 0);
    }
    data[sector..sector + PARM_BLOCK_BYTES].copy_from_slice(&block.encode());

    let mut file = header.map(|header| header.to_vec()).unwrap_or_default();
    file.extend_from_slice(&data);

    let dir = TempDir::new("sider").unwrap();
    let path = dir.path().join("drive.hdv");
    fs::write(&path, &file).unwrap();
    Fixture { dir, path }
}

/// Bytes of the image outside of its parameter block sector.
pub fn without_block(image: &[u8], header: usize) -> Vec<u8> {
    let mut image = image.to_vec();
    image.drain(header + 256..header + 512);
    image
}
