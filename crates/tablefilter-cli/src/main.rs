//! CLI tool for checking which files of a table are visible to readers.

mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::debug;
use snafu::{ResultExt, ensure};
use tablefilter_core::{FilterConfig, TablePath, TablePathFilter, list_visible_files};

use crate::error::{
    CliResult, FilterSnafu, InvalidPathSnafu, LoadConfigSnafu, RootMissingSnafu,
    ZeroConcurrencySnafu,
};

#[derive(Debug, Subcommand)]
enum Command {
    /// Print `accept` or `reject` for each path
    Check {
        /// Absolute file paths
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// List the visible files of a directory
    Ls {
        /// Absolute directory path
        dir: String,

        /// Descend into subdirectories
        #[arg(long, default_value_t = false)]
        recursive: bool,

        /// Also print hidden files, prefixed with `-`
        #[arg(long = "show-rejected", default_value_t = false)]
        show_rejected: bool,

        /// Files checked concurrently (default: from config, else 8)
        #[arg(long)]
        concurrency: Option<usize>,
    },
}

#[derive(Debug, Parser)]
#[command(name = "tfilter", version)]
struct Cli {
    /// Local directory that table paths are resolved under
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log classification decisions to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

async fn load_config(cli: &Cli) -> CliResult<FilterConfig> {
    let mut config = match &cli.config {
        Some(path) => FilterConfig::from_json_file(path)
            .await
            .context(LoadConfigSnafu { path })?,
        None => FilterConfig::default(),
    };

    if let Some(root) = &cli.root {
        ensure!(root.is_dir(), RootMissingSnafu { path: root });
        config.storage.root = Some(root.clone());
    }

    debug!("effective config: {config:?}");
    Ok(config)
}

fn parse_path(input: &str) -> CliResult<TablePath> {
    TablePath::parse(input).context(InvalidPathSnafu { input })
}

async fn cmd_check(filter: &TablePathFilter, paths: &[String]) -> CliResult<()> {
    for input in paths {
        let path = parse_path(input)?;
        let verdict = if filter.accept(&path).await.context(FilterSnafu)? {
            "accept"
        } else {
            "reject"
        };
        println!("{verdict}\t{path}");
    }
    Ok(())
}

async fn cmd_ls(
    filter: &TablePathFilter,
    mut config: FilterConfig,
    dir: &str,
    recursive: bool,
    show_rejected: bool,
    concurrency: Option<usize>,
) -> CliResult<()> {
    let dir = parse_path(dir)?;
    if let Some(n) = concurrency {
        ensure!(n > 0, ZeroConcurrencySnafu);
        config.scan.concurrency = n;
    }
    if recursive {
        config.scan.recursive = true;
    }

    let report = list_visible_files(filter, &dir, &config.scan)
        .await
        .context(FilterSnafu)?;

    for path in &report.accepted {
        println!("{path}");
    }
    if show_rejected {
        for path in &report.rejected {
            println!("-{path}");
        }
    }
    debug!(
        "{} of {} files visible under {dir}",
        report.accepted.len(),
        report.total()
    );
    Ok(())
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli).await?;
    let filter = TablePathFilter::from_config(&config);

    match cli.cmd {
        Command::Check { paths } => cmd_check(&filter, &paths).await,
        Command::Ls {
            dir,
            recursive,
            show_rejected,
            concurrency,
        } => cmd_ls(&filter, config, &dir, recursive, show_rejected, concurrency).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
