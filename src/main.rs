use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wikiundump::config::{UndumpConfig, DEFAULT_TARGET_DIR};
use wikiundump::namespace::NamespaceFilter;
use wikiundump::parser::WikiReader;
use wikiundump::path::build_path;
use wikiundump::persist;
use wikiundump::undump::Undumper;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wikiundump")]
#[command(about = "Unpack MediaWiki XML dumps into one file per page")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every page of the given dumps (or stdin) into a directory tree
    Undump(UndumpArgs),
    /// Print the path a title maps to in an existing tree
    Locate(LocateArgs),
}

#[derive(Args)]
struct UndumpArgs {
    /// Dump files (.xml or .xml.bz2); reads stdin when none are given
    files: Vec<String>,

    /// Target directory
    #[arg(short, long, default_value = DEFAULT_TARGET_DIR)]
    dir: PathBuf,

    /// Skip redirects instead of creating symlinks for them
    #[arg(long)]
    no_symlinks: bool,

    /// Comma separated namespaces to keep, e.g. ',Template' (empty = all)
    #[arg(long, default_value = "")]
    keep: String,

    /// Stop after this many pages (for testing)
    #[arg(long)]
    limit: Option<u64>,

    /// Derive paths but don't write anything
    #[arg(long)]
    dry_run: bool,

    /// Log and skip pages with unusable titles instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// Warn when two titles map to the same path (keeps every path in memory)
    #[arg(long)]
    check_collisions: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct LocateArgs {
    /// Directory holding a tree written by `undump`
    #[arg(short, long, default_value = DEFAULT_TARGET_DIR)]
    dir: PathBuf,

    /// Print paths joined onto the directory
    #[arg(long)]
    absolute: bool,

    /// Page titles
    #[arg(required = true)]
    titles: Vec<String>,
}

fn run_undump(args: UndumpArgs) -> Result<()> {
    let config = UndumpConfig {
        target_dir: args.dir,
        symlink_redirects: !args.no_symlinks,
        keep: NamespaceFilter::parse(&args.keep),
        limit: args.limit,
        dry_run: args.dry_run,
        keep_going: args.keep_going,
        check_collisions: args.check_collisions,
    };

    let start = Instant::now();
    let mut undumper = Undumper::new(config)?;

    if args.files.is_empty() {
        info!("Reading dump from stdin");
        undumper
            .process(WikiReader::stdin()?)
            .context("stdin")?;
    }
    for file in &args.files {
        if undumper.limit_reached() {
            break;
        }
        info!(file = %file, "Reading dump");
        undumper
            .process(WikiReader::open(file)?)
            .with_context(|| file.clone())?;
    }

    let duration = start.elapsed();
    let stats = undumper.into_stats();
    info!(duration_secs = duration.as_secs_f64(), "Undump complete");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    println!("=== Summary ===");
    println!("Total time:         {:.2}s", duration.as_secs_f64());
    println!("Pages seen:         {}", stats.pages_seen);
    println!("Pages written:      {}", stats.pages_written);
    println!("Redirects linked:   {}", stats.redirects_linked);
    println!("Redirects skipped:  {}", stats.redirects_skipped);
    println!("Pages filtered:     {}", stats.pages_filtered);
    println!("Pages failed:       {}", stats.pages_failed);
    if args.check_collisions {
        println!("Path collisions:    {}", stats.path_collisions);
    }

    Ok(())
}

fn run_locate(args: LocateArgs) -> Result<()> {
    let table = persist::load_namespaces(&args.dir)?;

    for title in &args.titles {
        let path = build_path(&table, title).with_context(|| format!("{:?}", title))?;
        if args.absolute {
            println!("{}", args.dir.join(path.trim_start_matches('/')).display());
        } else {
            println!("{}", path);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    // RUST_LOG, when set, refines the level picked by -v.
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Undump(args) => run_undump(args),
        Commands::Locate(args) => run_locate(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
