use crate::error::ParmError;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Size of an encoded parameter block.
pub const PARM_BLOCK_BYTES: usize = 256;

/// Where the descriptor of each CP/M slot (A through D) begins.
///
/// A slot is laid out as a 5-byte descriptor, the LE16 size, a 6-byte descriptor,
/// and the LE16 start track.
const CPM_SLOTS: [usize; 4] = [41, 56, 130, 145];
const CPM_ONLINE: [usize; 4] = [71, 72, 160, 161];
const PASCAL_STARTS: [usize; 4] = [81, 83, 174, 176];
/// ProDOS slots are the LE16 start track, the LE16 block count, then a status byte.
const PRODOS_SLOTS: [usize; 2] = [163, 168];

/// Value that `small_volumes_xor` is obfuscated with.
pub const SMALL_VOLUMES_XOR: u8 = 0xA5;

/// A CP/M drive as recorded in the parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpmSlot {
    pub descriptor:  [u8; 5],
    /// Size in quarter tracks.
    pub size:        u16,
    pub descriptor2: [u8; 6],
    /// Start in tracks.
    pub start:       u16,
}

/// A ProDOS volume as recorded in the parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProdosSlot {
    /// Start in tracks.
    pub start:  u16,
    /// Size in 512-byte blocks.
    pub size:   u16,
    pub status: u8,
}

/// The decoded contents of the 256-byte parameter block that a Sider drive keeps
/// in the second block of the disk.
///
/// Every byte of the block is represented, so that reserved regions survive being
/// decoded and encoded again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBlock {
    pub dos_small_volumes:       u8,
    pub small_volumes_xor:       u8,
    pub interleave:              u8,
    pub reserved:                [u8; 1],
    pub dos_volumes:             u8,
    pub reserved2:               [u8; 19],
    pub xor_3233:                u8,
    pub cylinders:               u16,
    pub heads:                   u8,
    pub reduced_write_cylinders: u16,
    pub precomp_cylinders:       u16,
    pub max_ecc_data_burst:      u8,
    pub control_byte:            u8,
    pub reserved3:               [u8; 7],
    /// CP/M drives A through D.
    pub cpm:                     [CpmSlot; 4],
    pub cpm_online:              [u8; 4],
    pub reserved4:               [u8; 7],
    pub pascal_unit1:            u8,
    /// Start tracks of Pascal volumes 1 through 4.
    pub pascal_starts:           [u16; 4],
    pub reserved5:               [u8; 15],
    pub install_date:            [u8; 8],
    pub modified_date:           [u8; 8],
    pub backup_date:             [u8; 8],
    pub reserved6:               [u8; 6],
    pub reserved7:               [u8; 1],
    pub prodos:                  [ProdosSlot; 2],
    pub pascal_unit2:            u8,
    pub reserved8:               [u8; 77],
    pub alt_tracks_avail:        u8,
}

fn array<const N: usize>(raw: &[u8], at: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&raw[at..at + N]);
    out
}

impl ParameterBlock {
    /// Unpacks a raw parameter block.
    ///
    /// The drive geometry fields are stored big endian; everything else is little endian.
    pub fn decode(raw: &[u8]) -> Result<Self, ParmError> {
        if raw.len() != PARM_BLOCK_BYTES {
            return Err(ParmError::MalformedBlock {
                expected: PARM_BLOCK_BYTES,
                found:    raw.len(),
            });
        }

        let cpm_slot = |at: usize| CpmSlot {
            descriptor:  array(raw, at),
            size:        LittleEndian::read_u16(&raw[at + 5..]),
            descriptor2: array(raw, at + 7),
            start:       LittleEndian::read_u16(&raw[at + 13..]),
        };

        let prodos_slot = |at: usize| ProdosSlot {
            start:  LittleEndian::read_u16(&raw[at..]),
            size:   LittleEndian::read_u16(&raw[at + 2..]),
            status: raw[at + 4],
        };

        let block = ParameterBlock {
            dos_small_volumes:       raw[0],
            small_volumes_xor:       raw[1],
            interleave:              raw[2],
            reserved:                array(raw, 3),
            dos_volumes:             raw[4],
            reserved2:               array(raw, 5),
            xor_3233:                raw[24],
            cylinders:               BigEndian::read_u16(&raw[25..]),
            heads:                   raw[27],
            reduced_write_cylinders: BigEndian::read_u16(&raw[28..]),
            precomp_cylinders:       BigEndian::read_u16(&raw[30..]),
            max_ecc_data_burst:      raw[32],
            control_byte:            raw[33],
            reserved3:               array(raw, 34),
            cpm:                     [
                cpm_slot(CPM_SLOTS[0]),
                cpm_slot(CPM_SLOTS[1]),
                cpm_slot(CPM_SLOTS[2]),
                cpm_slot(CPM_SLOTS[3]),
            ],
            cpm_online:              [
                raw[CPM_ONLINE[0]],
                raw[CPM_ONLINE[1]],
                raw[CPM_ONLINE[2]],
                raw[CPM_ONLINE[3]],
            ],
            reserved4:               array(raw, 73),
            pascal_unit1:            raw[80],
            pascal_starts:           [
                LittleEndian::read_u16(&raw[PASCAL_STARTS[0]..]),
                LittleEndian::read_u16(&raw[PASCAL_STARTS[1]..]),
                LittleEndian::read_u16(&raw[PASCAL_STARTS[2]..]),
                LittleEndian::read_u16(&raw[PASCAL_STARTS[3]..]),
            ],
            reserved5:               array(raw, 85),
            install_date:            array(raw, 100),
            modified_date:           array(raw, 108),
            backup_date:             array(raw, 116),
            reserved6:               array(raw, 124),
            reserved7:               array(raw, 162),
            prodos:                  [prodos_slot(PRODOS_SLOTS[0]), prodos_slot(PRODOS_SLOTS[1])],
            pascal_unit2:            raw[173],
            reserved8:               array(raw, 178),
            alt_tracks_avail:        raw[255],
        };

        debug!(
            "decoded parameter block: {} cylinders, {} heads, {} DOS volumes ({} small)",
            block.cylinders, block.heads, block.dos_volumes, block.dos_small_volumes
        );

        Ok(block)
    }

    /// Packs the block back into its on-disk form.
    pub fn encode(&self) -> [u8; PARM_BLOCK_BYTES] {
        let mut raw = [0u8; PARM_BLOCK_BYTES];

        raw[0] = self.dos_small_volumes;
        raw[1] = self.small_volumes_xor;
        raw[2] = self.interleave;
        raw[3..4].copy_from_slice(&self.reserved);
        raw[4] = self.dos_volumes;
        raw[5..24].copy_from_slice(&self.reserved2);
        raw[24] = self.xor_3233;
        BigEndian::write_u16(&mut raw[25..27], self.cylinders);
        raw[27] = self.heads;
        BigEndian::write_u16(&mut raw[28..30], self.reduced_write_cylinders);
        BigEndian::write_u16(&mut raw[30..32], self.precomp_cylinders);
        raw[32] = self.max_ecc_data_burst;
        raw[33] = self.control_byte;
        raw[34..41].copy_from_slice(&self.reserved3);

        for (slot, &at) in self.cpm.iter().zip(CPM_SLOTS.iter()) {
            raw[at..at + 5].copy_from_slice(&slot.descriptor);
            LittleEndian::write_u16(&mut raw[at + 5..at + 7], slot.size);
            raw[at + 7..at + 13].copy_from_slice(&slot.descriptor2);
            LittleEndian::write_u16(&mut raw[at + 13..at + 15], slot.start);
        }

        for (&online, &at) in self.cpm_online.iter().zip(CPM_ONLINE.iter()) {
            raw[at] = online;
        }

        raw[73..80].copy_from_slice(&self.reserved4);
        raw[80] = self.pascal_unit1;

        for (&start, &at) in self.pascal_starts.iter().zip(PASCAL_STARTS.iter()) {
            LittleEndian::write_u16(&mut raw[at..at + 2], start);
        }

        raw[85..100].copy_from_slice(&self.reserved5);
        raw[100..108].copy_from_slice(&self.install_date);
        raw[108..116].copy_from_slice(&self.modified_date);
        raw[116..124].copy_from_slice(&self.backup_date);
        raw[124..130].copy_from_slice(&self.reserved6);
        raw[162..163].copy_from_slice(&self.reserved7);

        for (slot, &at) in self.prodos.iter().zip(PRODOS_SLOTS.iter()) {
            LittleEndian::write_u16(&mut raw[at..at + 2], slot.start);
            LittleEndian::write_u16(&mut raw[at + 2..at + 4], slot.size);
            raw[at + 4] = slot.status;
        }

        raw[173] = self.pascal_unit2;
        raw[178..255].copy_from_slice(&self.reserved8);
        raw[255] = self.alt_tracks_avail;

        raw
    }

    /// True if the obfuscated copy of the small volume count agrees with the count.
    pub fn small_volumes_consistent(&self) -> bool {
        self.dos_small_volumes ^ SMALL_VOLUMES_XOR == self.small_volumes_xor
    }

    pub fn install_date(&self) -> String { date_string(&self.install_date) }

    pub fn modified_date(&self) -> String { date_string(&self.modified_date) }

    pub fn backup_date(&self) -> String { date_string(&self.backup_date) }
}

/// Dates are stored as 8 ASCII characters, padded with NULs or spaces.
fn date_string(raw: &[u8; 8]) -> String {
    String::from_utf8_lossy(raw).trim_end_matches(|c: char| c == '\0' || c == ' ').to_owned()
}
