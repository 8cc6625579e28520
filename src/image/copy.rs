use std::io::{self, Read, Seek, SeekFrom, Write};

/// Copies exactly `len` bytes found at `start` in `source` to the current position of
/// `dest`, a buffer's worth at a time.
pub(crate) fn copy_range<R: Read + Seek, W: Write>(
    source: &mut R,
    dest: &mut W,
    start: u64,
    len: u64,
    buffer: &mut [u8],
) -> io::Result<()> {
    source.seek(SeekFrom::Start(start))?;

    let mut remaining = len;
    while remaining != 0 {
        let chunk = remaining.min(buffer.len() as u64) as usize;
        source.read_exact(&mut buffer[..chunk])?;
        dest.write_all(&buffer[..chunk])?;
        remaining -= chunk as u64;
    }

    Ok(())
}

/// Copies everything from `start` to the end of `source`, returning the bytes copied.
pub(crate) fn copy_to_end<R: Read + Seek, W: Write>(
    source: &mut R,
    dest: &mut W,
    start: u64,
    buffer: &mut [u8],
) -> io::Result<u64> {
    source.seek(SeekFrom::Start(start))?;

    let mut copied = 0;
    loop {
        match source.read(buffer) {
            Ok(0) => return Ok(copied),
            Ok(read) => {
                dest.write_all(&buffer[..read])?;
                copied += read as u64;
            }
            Err(ref why) if why.kind() == io::ErrorKind::Interrupted => (),
            Err(why) => return Err(why),
        }
    }
}

pub(crate) fn write_zeroes<W: Write>(dest: &mut W, len: u64, buffer: &mut [u8]) -> io::Result<()> {
    for byte in buffer.iter_mut() {
        *byte = 0;
    }

    let mut remaining = len;
    while remaining != 0 {
        let chunk = remaining.min(buffer.len() as u64) as usize;
        dest.write_all(&buffer[..chunk])?;
        remaining -= chunk as u64;
    }

    Ok(())
}
