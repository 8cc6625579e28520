use log::LevelFilter;
use std::{io, path::Path};

/// Initialize logging with the fern logger.
///
/// Records are written to stderr, and additionally appended to `file` when one is given.
pub fn log(level: LevelFilter, file: Option<&Path>) -> Result<(), fern::InitError> {
    let mut logger = fern::Dispatch::new()
        .level(level)
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} sider{}] {}",
                record.level(),
                match (record.file(), record.line()) {
                    (Some(file), Some(line)) => format!(":{}:{}", file, line),
                    _ => "".into(),
                },
                message
            ))
        })
        .chain(io::stderr());

    if let Some(path) = file {
        match fern::log_file(path) {
            Ok(log) => logger = logger.chain(log),
            Err(why) => {
                eprintln!("failed to create log file at {}: {}", path.display(), why);
            }
        }
    }

    logger.apply()?;
    Ok(())
}
