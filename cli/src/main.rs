extern crate clap;
extern crate failure;
#[macro_use]
extern crate failure_derive;
extern crate log;
extern crate sider;

mod errors;
mod size;

use self::errors::CliError;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::LevelFilter;
use sider::{Config, DiskImage, PartitionGeometry, SectorSize, VolumeId};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    process::exit,
};

fn main() {
    let status = match run(&app().get_matches()) {
        Ok(()) => 0,
        Err(why) => {
            eprintln!("sider: {}", why);
            1
        }
    };

    exit(status);
}

fn app() -> App<'static, 'static> {
    let volume = || {
        Arg::with_name("volume")
            .help("the volume to operate on, such as 'prodos:0' or 'cpm:2'")
            .required(true)
    };

    App::new("sider")
        .about("Inspect and rearrange the partitions of Sider hard disk images")
        .version(env!("CARGO_PKG_VERSION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("log more details: once for info, twice for debug, thrice for trace"),
        )
        .arg(
            Arg::with_name("log")
                .long("log")
                .takes_value(true)
                .help("also append log records to this file"),
        )
        .arg(
            Arg::with_name("sector-size")
                .long("sector-size")
                .takes_value(true)
                .possible_values(&["256", "512"])
                .help("use this sector size instead of detecting it from the image"),
        )
        .arg(Arg::with_name("image").help("the disk image to operate on").required(true))
        .subcommand(SubCommand::with_name("info").about("show the geometry and configuration of the drive"))
        .subcommand(SubCommand::with_name("list").about("list the partitions in use, in disk order"))
        .subcommand(
            SubCommand::with_name("extract")
                .about("copy the contents of a volume to a file")
                .arg(volume())
                .arg(Arg::with_name("file").help("where to write the volume").required(true)),
        )
        .subcommand(
            SubCommand::with_name("replace")
                .about("overwrite a volume with the contents of a file")
                .arg(volume())
                .arg(Arg::with_name("file").help("the file to read from").required(true)),
        )
        .subcommand(
            SubCommand::with_name("resize")
                .about("change the size of a volume, shifting the volumes after it")
                .arg(volume())
                .arg(Arg::with_name("size").help("the new size, such as '16K' or '2M'").required(true)),
        )
        .subcommand(
            SubCommand::with_name("move")
                .about("move a volume to another partition boundary")
                .arg(volume())
                .arg(Arg::with_name("offset").help("the new offset of the volume").required(true)),
        )
}

fn run(matches: &ArgMatches) -> Result<(), CliError> {
    let level = match matches.occurrences_of("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    sider::log(level, matches.value_of("log").map(Path::new))
        .map_err(|why| CliError::Logging { why: why.to_string() })?;

    let mut config = Config::default();
    if let Some(size) = matches.value_of("sector-size") {
        let size = size.parse::<SectorSize>().map_err(|why| CliError::InvalidSectorSize { why })?;
        config = config.sector_size(size);
    }

    let mut image = DiskImage::open(value(matches, "image"), config)?;

    match matches.subcommand() {
        ("info", _) => info(&image),
        ("list", _) => list(&image),
        ("extract", Some(args)) => {
            let volume = volume(args)?;
            let path = Path::new(value(args, "file"));
            let file = File::create(path)
                .map_err(|why| CliError::File { path: path.to_path_buf(), why })?;
            let mut output = BufWriter::new(file);
            let bytes = image.extract(volume, &mut output)?;
            output.flush().map_err(|why| CliError::Output { why })?;
            println!("extracted {} bytes from {} to {}", bytes, volume, path.display());
            Ok(())
        }
        ("replace", Some(args)) => {
            let volume = volume(args)?;
            let bytes = image.replace_from(volume, value(args, "file"))?;
            println!("wrote {} bytes to {}", bytes, volume);
            Ok(())
        }
        ("resize", Some(args)) => {
            let volume = volume(args)?;
            let bytes = size::parse(value(args, "size"))?;
            let transform = image.resize(volume, bytes)?;
            println!(
                "resized {}: span {} -> {} ({:+} bytes)",
                volume,
                size::human(transform.old_span),
                size::human(transform.new_span),
                transform.delta()
            );
            Ok(())
        }
        ("move", Some(args)) => {
            let volume = volume(args)?;
            let offset = size::parse(value(args, "offset"))?;
            let transform = image.move_to(volume, offset)?;
            if transform.is_moving() {
                println!("moved {} from {} to {}", volume, transform.old_offset, transform.new_offset);
            } else {
                println!("{} is already at {}", volume, offset);
            }
            Ok(())
        }
        (name, _) => Err(CliError::UnknownCommand { name: name.into() }),
    }
}

/// Arguments which clap has already required to be present.
fn value<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches.value_of(name).unwrap_or_default()
}

fn volume(matches: &ArgMatches) -> Result<VolumeId, CliError> {
    Ok(value(matches, "volume").parse::<VolumeId>()?)
}

fn info(image: &DiskImage) -> Result<(), CliError> {
    let block = image.block();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut lines = || -> io::Result<()> {
        writeln!(out, "image:            {}", image.path().display())?;
        if image.header_len() != 0 {
            writeln!(out, "container:        2IMG ({} byte header)", image.header_len())?;
        }
        writeln!(out, "sector size:      {}", image.sector_size())?;
        writeln!(out, "cylinders:        {}", block.cylinders)?;
        writeln!(out, "heads:            {}", block.heads)?;
        writeln!(
            out,
            "total size:       {} ({})",
            block.total_size(),
            size::human(block.total_size())
        )?;
        writeln!(out, "interleave:       {}", block.interleave)?;
        writeln!(out, "reduced write:    {}", block.reduced_write_cylinders)?;
        writeln!(out, "precompensation:  {}", block.precomp_cylinders)?;
        writeln!(out, "max ECC burst:    {}", block.max_ecc_data_burst)?;
        writeln!(out, "control byte:     {:#04x}", block.control_byte)?;
        writeln!(
            out,
            "DOS volumes:      {} ({} small{})",
            block.dos_volumes,
            block.dos_small_volumes,
            if block.small_volumes_consistent() { "" } else { ", failed XOR check" }
        )?;
        writeln!(out, "installed:        {}", block.install_date())?;
        writeln!(out, "modified:         {}", block.modified_date())?;
        writeln!(out, "backed up:        {}", block.backup_date())?;
        Ok(())
    };

    lines().map_err(|why| CliError::Output { why })
}

fn list(image: &DiskImage) -> Result<(), CliError> {
    let table = image.table()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut lines = || -> io::Result<()> {
        writeln!(out, "{:<10} {:>10} {:>10} {:>10} {:>8}  NAME", "VOLUME", "OFFSET", "LENGTH", "SPAN", "SIZE")?;
        for record in table.by_offset() {
            writeln!(
                out,
                "{:<10} {:>10} {:>10} {:>10} {:>8}  {}",
                record.volume.to_string(),
                record.offset,
                record.length,
                record.span,
                size::human(record.length),
                record.volume.label()
            )?;
        }

        writeln!(out, "unused: {} of {}", size::human(table.gaps()), size::human(table.total_size()))
    };

    lines().map_err(|why| CliError::Output { why })
}
