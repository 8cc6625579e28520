use crate::error::ParmError;
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// The operating system families that may own partitions on a Sider drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    ProDos,
    Dos,
    Pascal,
    Cpm,
}

impl Family {
    /// Every family, in the order that they are listed.
    pub const ALL: [Family; 4] = [Family::ProDos, Family::Dos, Family::Pascal, Family::Cpm];

    /// The lowercase name used in volume ids.
    pub fn name(self) -> &'static str {
        match self {
            Family::ProDos => "prodos",
            Family::Dos => "dos",
            Family::Pascal => "pascal",
            Family::Cpm => "cpm",
        }
    }
}

impl Display for Family {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result { f.write_str(self.name()) }
}

impl FromStr for Family {
    type Err = ParmError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let family = match input.to_ascii_lowercase().as_str() {
            "prodos" => Family::ProDos,
            "dos" => Family::Dos,
            "pascal" => Family::Pascal,
            "cpm" => Family::Cpm,
            _ => return Err(ParmError::UnknownFamily { family: input.into() }),
        };

        Ok(family)
    }
}

/// Identifies a single partition, written as `<family>:<index>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, new)]
pub struct VolumeId {
    pub family: Family,
    pub index:  usize,
}

impl VolumeId {
    /// A description in the terms each system used for its own volumes.
    pub fn label(&self) -> String {
        match self.family {
            Family::ProDos => format!("ProDOS volume {}", self.index + 1),
            Family::Dos => format!("DOS 3.3 volume {}", self.index + 1),
            Family::Pascal => format!("Pascal volume {}", self.index + 1),
            Family::Cpm => format!("CP/M drive {}", (b'A' + self.index as u8) as char),
        }
    }
}

impl Display for VolumeId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result { write!(f, "{}:{}", self.family, self.index) }
}

impl FromStr for VolumeId {
    type Err = ParmError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || ParmError::InvalidVolumeId { id: input.into() };

        let mut fields = input.splitn(2, ':');
        let family = fields.next().filter(|f| !f.is_empty()).ok_or_else(invalid)?;
        let index = fields.next().ok_or_else(invalid)?;

        let family = family.parse::<Family>()?;
        let index = index.trim().parse::<usize>().map_err(|_| invalid())?;

        Ok(VolumeId { family, index })
    }
}
