use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use zip::{ZipArchive, ZipWriter};

use respack::discovery::FileStats;
use respack::{
    create_partitions, parse_all, walk_files, zip_shard, Archiver, Config, Context, DeclarationOrder,
    PartitionSession, Sharder,
};

/// respack - Fast processing of Android resource directories
#[derive(Parser, Debug)]
#[command(name = "respack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Number of parser threads (overrides the config file)
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split resources into per-type, sharded zip archives
    Bucketize {
        /// Resource directories or files, in declaration order
        #[arg(long, value_name = "PATH", num_args = 1.., required = true)]
        res_paths: Vec<PathBuf>,

        /// Output archives as <type>:<file>, one per shard
        #[arg(long, value_name = "TYPE:FILE", num_args = 1.., required = true)]
        typed_outputs: Vec<String>,
    },

    /// List the resources a set of files declares, as JSON
    Liteparse {
        /// Resource directories or files
        #[arg(long, value_name = "PATH", num_args = 1.., required = true)]
        res_files: Vec<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Java package of the resources (overrides the config file)
        #[arg(long)]
        pkg: Option<String>,
    },

    /// Redistribute the entries of a zip archive over several archives
    Zipshard {
        /// Input archive
        #[arg(long)]
        input: PathBuf,

        /// Output archives, one per shard
        #[arg(long, num_args = 1.., required = true)]
        outputs: Vec<PathBuf>,

        /// Only hash the part of each entry name before the last separator
        #[arg(long)]
        separator: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!("respack v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    config.validate()?;
    debug!("Using {} workers", config.workers);

    match &cli.command {
        Command::Bucketize {
            res_paths,
            typed_outputs,
        } => run_bucketize(&config, res_paths, typed_outputs, cli.quiet),
        Command::Liteparse { res_files, out, pkg } => {
            run_liteparse(&config, res_files, out.as_deref(), pkg.as_deref(), cli.quiet)
        }
        Command::Zipshard {
            input,
            outputs,
            separator,
        } => run_zipshard(&config, input, outputs, separator.as_deref(), cli.quiet),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        let cwd = std::env::current_dir().into_diagnostic()?;
        Config::from_default_locations(&cwd)?
    };

    // Override with CLI arguments
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }

    Ok(config)
}

fn run_bucketize(config: &Config, res_paths: &[PathBuf], typed_outputs: &[String], quiet: bool) -> Result<()> {
    let start_time = Instant::now();

    info!("Discovering files...");
    let files = walk_files(res_paths)
        .into_diagnostic()
        .wrap_err("Failed to walk resource paths")?;
    let stats = FileStats::from_paths(&files);
    info!(
        "Found {} files ({} values, {} other, {} skipped)",
        stats.total(),
        stats.values_files,
        stats.path_files,
        stats.skipped_files
    );

    let order = DeclarationOrder::new(&files);
    let partitions = create_partitions(typed_outputs)
        .into_diagnostic()
        .wrap_err("Failed to create output archives")?;
    let shard_count: usize = partitions.values().map(Vec::len).sum();

    let session = PartitionSession::new(partitions, config.sharder.sharder()?, order);
    let mut archiver = Archiver::new(&files, session)
        .into_diagnostic()?
        .with_workers(config.workers);
    archiver
        .archive(&Context::new())
        .into_diagnostic()
        .wrap_err("Bucketize failed")?;

    if !quiet {
        println!(
            "{} {} values files and {} other files into {} archives in {:.2?}",
            "Archived".green().bold(),
            stats.values_files,
            stats.path_files,
            shard_count,
            start_time.elapsed()
        );
    }
    Ok(())
}

fn run_liteparse(
    config: &Config,
    res_files: &[PathBuf],
    out: Option<&Path>,
    pkg: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let package = pkg.unwrap_or(&config.package);
    let set = parse_all(&Context::new(), res_files, package, config.workers)
        .into_diagnostic()
        .wrap_err("Liteparse failed")?;
    let json = serde_json::to_string_pretty(&set).into_diagnostic()?;

    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).into_diagnostic()?;
            }
            fs::write(path, json)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            if !quiet {
                println!(
                    "{} {} resources to {}",
                    "Wrote".green().bold(),
                    set.resources.len(),
                    path.display()
                );
            }
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_zipshard(
    config: &Config,
    input: &Path,
    outputs: &[PathBuf],
    separator: Option<&str>,
    quiet: bool,
) -> Result<()> {
    let sharder = match separator {
        Some(separator) => Sharder::with_separator(separator, config.sharder.sharder()?),
        None => config.sharder.sharder()?,
    };

    let file = File::open(input)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to open {}", input.display()))?;
    let mut archive = ZipArchive::new(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", input.display()))?;

    let mut writers = outputs
        .iter()
        .map(|path| {
            File::create(path)
                .map(ZipWriter::new)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to create {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    zip_shard(&mut archive, &mut writers, &sharder)
        .into_diagnostic()
        .wrap_err("Zip sharding failed")?;
    for writer in writers {
        writer.finish().into_diagnostic()?;
    }

    if !quiet {
        println!(
            "{} {} entries over {} archives",
            "Sharded".green().bold(),
            archive.len(),
            outputs.len()
        );
    }
    Ok(())
}
