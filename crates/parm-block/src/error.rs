use crate::volume::Family;

/// Errors that arise from decoding a parameter block or addressing its partitions.
#[rustfmt::skip]
#[derive(Debug, Fail, PartialEq)]
pub enum ParmError {
    #[fail(display = "parameter block must be {} bytes, but {} were given", expected, found)]
    MalformedBlock { expected: usize, found: usize },
    #[fail(display = "{} of {} does not fit in its field (max: {})", field, value, max)]
    FieldOverflow { field: &'static str, value: u64, max: u64 },
    #[fail(display = "'{}' is not a valid volume id: expected <family>:<index>", id)]
    InvalidVolumeId { id: String },
    #[fail(display = "'{}' is not a known partition family", family)]
    UnknownFamily { family: String },
    #[fail(display = "{} volume {} does not exist", family, index)]
    IndexOutOfRange { family: Family, index: usize },
    #[fail(display = "operation is not supported on {} volumes", family)]
    UnsupportedForFamily { family: Family },
    #[fail(display = "drive geometry has no heads")]
    ZeroHeads,
}
