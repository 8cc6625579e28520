use sider::{ImageError, ParmError};
use std::{io, path::PathBuf};

#[rustfmt::skip]
#[derive(Debug, Fail)]
pub(crate) enum CliError {
    #[fail(display = "{}", why)]
    Image { why: ImageError },
    #[fail(display = "invalid volume: {}", why)]
    Volume { why: ParmError },
    #[fail(display = "'{}' is not a size: expected bytes, or a number with a K or M suffix", value)]
    InvalidSize { value: String },
    #[fail(display = "{}", why)]
    InvalidSectorSize { why: String },
    #[fail(display = "failed to initialize logging: {}", why)]
    Logging { why: String },
    #[fail(display = "unable to open {:?}: {}", path, why)]
    File { path: PathBuf, why: io::Error },
    #[fail(display = "failed to write output: {}", why)]
    Output { why: io::Error },
    #[fail(display = "'{}' is not a command", name)]
    UnknownCommand { name: String },
}

impl From<ImageError> for CliError {
    fn from(why: ImageError) -> CliError { CliError::Image { why } }
}

impl From<ParmError> for CliError {
    fn from(why: ParmError) -> CliError { CliError::Volume { why } }
}
