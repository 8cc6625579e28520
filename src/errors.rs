use parm_block::{ParmError, VolumeId};
use std::{io, path::PathBuf};

pub trait IoContext<T> {
    fn with_context<F: FnMut(&io::Error) -> String>(self, func: F) -> io::Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn with_context<F: FnMut(&io::Error) -> String>(self, mut func: F) -> io::Result<T> {
        self.map_err(|why| io::Error::new(why.kind(), func(&why)))
    }
}

/// Errors that may occur while reading or rewriting a disk image.
#[rustfmt::skip]
#[derive(Debug, Fail)]
pub enum ImageError {
    #[fail(display = "{}", why)]
    Parm { why: ParmError },
    #[fail(display = "unable to open image at {:?}: {}", path, why)]
    Open { path: PathBuf, why: io::Error },
    #[fail(display = "image I/O failed: {}", why)]
    IO { why: io::Error },
    #[fail(display = "image of {} bytes is too small to hold a parameter block", len)]
    TooSmall { len: u64 },
    #[fail(display = "{} is not in use", volume)]
    VolumeUnallocated { volume: VolumeId },
    #[fail(display = "partition size must be greater than zero")]
    SizeTooSmall,
    #[fail(display = "partition was too large (size: {}, max: {})", size, max)]
    SizeTooLarge { size: u64, max: u64 },
    #[fail(display = "offset {} does not land on a partition boundary", offset)]
    NotOnPartitionBoundary { offset: u64 },
    #[fail(display = "{} spans {} bytes, which is not a whole number of tracks", volume, span)]
    SpanNotTrackAligned { volume: VolumeId, span: u64 },
    #[fail(display = "operation would displace DOS volume {}", index)]
    DosVolumeDisplaced { index: usize },
    #[fail(display = "replacement for {} exceeds its length of {} bytes", volume, length)]
    ReplaceTooLarge { volume: VolumeId, length: u64 },
}

impl From<ParmError> for ImageError {
    fn from(why: ParmError) -> ImageError { ImageError::Parm { why } }
}

impl From<io::Error> for ImageError {
    fn from(why: io::Error) -> ImageError { ImageError::IO { why } }
}

impl From<ImageError> for io::Error {
    fn from(err: ImageError) -> io::Error {
        match err {
            ImageError::IO { why } => why,
            err => io::Error::new(io::ErrorKind::Other, format!("{}", err)),
        }
    }
}
