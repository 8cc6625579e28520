//! Copying the contents of a single partition in and out of an image.

use super::{copy_range, DiskImage};
use crate::errors::{ImageError, IoContext};
use parm_block::VolumeId;
use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

impl DiskImage {
    /// Writes the recorded length of `volume` to `output`, returning the bytes written.
    pub fn extract<W: Write>(&self, volume: VolumeId, output: &mut W) -> Result<u64, ImageError> {
        let record = self.record(volume)?;
        let mut file = File::open(&self.path)?;
        let mut buffer = vec![0; self.config.buffer_size];

        copy_range(&mut file, output, self.position(record.offset), record.length, &mut buffer)
            .with_context(|why| format!("failed to extract {}: {}", volume, why))?;

        info!("extracted {} bytes from {}", record.length, volume);
        Ok(record.length)
    }

    /// Overwrites `volume`, from its first byte, with everything that `input` yields.
    ///
    /// Bytes of the volume beyond the end of the input are left as they were. Input
    /// which would run past the recorded length is an error, after the volume itself
    /// has been filled.
    pub fn replace<R: Read>(&self, volume: VolumeId, input: &mut R) -> Result<u64, ImageError> {
        let record = self.record(volume)?;
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(self.position(record.offset)))?;

        let mut buffer = vec![0; self.config.buffer_size];
        let mut written = 0;
        loop {
            let limit = (record.length - written).min(buffer.len() as u64) as usize;
            if limit == 0 {
                break;
            }

            let read = input.read(&mut buffer[..limit])?;
            if read == 0 {
                break;
            }

            file.write_all(&buffer[..read])?;
            written += read as u64;
        }

        if written == record.length && input.read(&mut [0u8])? != 0 {
            return Err(ImageError::ReplaceTooLarge { volume, length: record.length });
        }

        file.sync_all()?;
        info!("replaced {} bytes of {}", written, volume);
        Ok(written)
    }

    /// Replaces `volume` with the contents of the file at `path`, which is rejected
    /// before anything is written if it is longer than the volume.
    pub fn replace_from<P: AsRef<Path>>(
        &self,
        volume: VolumeId,
        path: P,
    ) -> Result<u64, ImageError> {
        let path = path.as_ref();
        let record = self.record(volume)?;
        let mut input =
            File::open(path).map_err(|why| ImageError::Open { path: path.to_path_buf(), why })?;

        if input.metadata()?.len() > record.length {
            return Err(ImageError::ReplaceTooLarge { volume, length: record.length });
        }

        self.replace(volume, &mut input)
    }
}
