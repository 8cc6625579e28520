//! Reading and rewriting the partitions of Sider hard disk images.
//!
//! An image opens into a `DiskImage`, which decodes the parameter block that the
//! drive keeps in its second sector. Partitions can then be listed, extracted,
//! replaced, resized, or moved. Operations which change the layout of the image
//! write their result to a staging file beside it, and only replace the original
//! once every byte and the updated parameter block have been written.

#[macro_use]
extern crate derive_new;
extern crate failure;
#[macro_use]
extern crate failure_derive;
extern crate fern;
#[macro_use]
extern crate log;
extern crate parm_block;
#[macro_use]
extern crate smart_default;
extern crate tempdir;

mod config;
mod errors;
mod image;
mod logging;
mod ops;

#[cfg(test)]
pub(crate) mod fixtures;

pub use self::{
    config::Config,
    errors::{ImageError, IoContext},
    image::{DiskImage, SectorSize, CONTAINER_HEADER_BYTES},
    logging::log,
    ops::{Rotation, Transform},
};
pub use parm_block::*;
