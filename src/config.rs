use crate::image::SectorSize;

/// Options for opening and rewriting an image.
#[derive(Debug, Clone, SmartDefault, PartialEq)]
pub struct Config {
    /// Use this sector size instead of detecting one from the image.
    pub sector_size: Option<SectorSize>,
    /// Size of the buffer used when copying image data.
    #[default = 65536]
    pub buffer_size: usize,
}

impl Config {
    pub fn sector_size(mut self, size: SectorSize) -> Self {
        self.sector_size = Some(size);
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }
}
