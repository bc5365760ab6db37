use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use markdown_entangled_config::Config;
use markdown_entangled_engine::hooks::{Files, Page, on_page_markdown, on_pre_build};
use markdown_entangled_engine::io;
use relative_path::RelativePathBuf;

#[derive(Parser)]
#[command(
    name = "markdown-entangled",
    version,
    about = "Render literate Markdown pages for a static site"
)]
struct Cli {
    /// Configuration file (defaults to ~/.config/markdown-entangled/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pre-build sync command
    Sync,

    /// Filter one page
    Filter(FilterArgs),

    /// Sync, then filter every page of the docs directory into the site directory
    Build(BuildArgs),

    /// Write the default configuration
    InitConfig(InitConfigArgs),
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Markdown page to filter
    file: PathBuf,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Do not run the sync command first
    #[arg(long)]
    skip_sync: bool,
}

#[derive(clap::Args)]
struct InitConfigArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    force: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);

    match cli.command {
        Command::Sync => {
            let config = load_config(&config_path)?;
            on_pre_build(&config).context("sync failed")?;
        }
        Command::Filter(args) => filter_page(&load_config(&config_path)?, &args)?,
        Command::Build(args) => build_site(&load_config(&config_path)?, &args)?,
        Command::InitConfig(args) => init_config(&config_path, &args)?,
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    log::debug!("Config path: {}", path.display());
    match Config::load_from_path(path)? {
        Some(config) => Ok(config),
        None => {
            log::info!(
                "No config file at {}, using defaults",
                path.display()
            );
            Ok(Config::default())
        }
    }
}

/// Index of the docs directory, or an empty one when there is none.
fn site_files(config: &Config) -> Result<Files> {
    let docs = config.docs_path();
    if !docs.is_dir() {
        return Ok(Files::default());
    }
    Files::from_docs_dir(&docs)
        .with_context(|| format!("failed to index {}", docs.display()))
}

fn filter_page(config: &Config, args: &FilterArgs) -> Result<()> {
    let markdown = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    // Pages are named relative to the docs directory when they live there
    let docs = config.docs_path();
    let relative = args.file.strip_prefix(&docs).unwrap_or(&args.file);
    let src_path = RelativePathBuf::from_path(relative)
        .with_context(|| format!("invalid page path {}", args.file.display()))?;

    let files = site_files(config)?;
    let rendered = on_page_markdown(&markdown, &Page::new(src_path), config, &files)
        .with_context(|| format!("failed to filter {}", args.file.display()))?;

    match &args.output {
        Some(output) => fs::write(output, rendered)
            .with_context(|| format!("failed to write {}", output.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}

fn build_site(config: &Config, args: &BuildArgs) -> Result<()> {
    if args.skip_sync {
        log::info!("Skipping sync");
    } else {
        on_pre_build(config).context("sync failed")?;
    }

    let docs = config.docs_path();
    let site = config.site_path();
    io::validate_docs_dir(&docs)?;

    let files = Files::from_docs_dir(&docs)?;
    log::info!("Filtering {} pages into {}", files.len(), site.display());

    for src_path in files.iter() {
        let markdown = io::read_file(src_path, &docs)?;
        let page = Page::new(src_path.to_relative_path_buf());
        let rendered = on_page_markdown(&markdown, &page, config, &files)
            .with_context(|| format!("failed to filter {src_path}"))?;
        io::write_file(src_path, &site, &rendered)?;
    }
    Ok(())
}

fn init_config(path: &Path, args: &InitConfigArgs) -> Result<()> {
    if path.exists() && !args.force {
        bail!(
            "{} already exists, pass --force to overwrite it",
            path.display()
        );
    }
    Config::default().save_to_path(path)?;
    log::info!("Wrote default config to {}", path.display());
    Ok(())
}
